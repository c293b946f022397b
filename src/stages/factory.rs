// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{CompositorConfig, EncoderConfig, StagesConfig};
use crate::traits::{CompositorStage, EncoderStage, InferenceStage};

use super::{DenseInference, PositionEncoder, VolumeCompositor};

/// Builds the reference stage implementations from configuration.
pub struct StageFactory;

impl StageFactory {
    pub fn create_encoder(config: &EncoderConfig) -> EncoderStage {
        Box::new(PositionEncoder::new(config.frequencies, config.latency))
    }

    /// The inference input width follows the encoder's output width, so the
    /// whole stage section is needed here.
    pub fn create_inference(config: &StagesConfig) -> InferenceStage {
        let input_width = config.encoder.frequencies.max(1) * 6;
        Box::new(DenseInference::new(
            input_width,
            config.inference.hidden,
            config.inference.latency,
        ))
    }

    pub fn create_compositor(config: &CompositorConfig) -> CompositorStage {
        Box::new(VolumeCompositor::new(config.samples_per_ray, config.latency))
    }
}

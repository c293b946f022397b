// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_COMMAND_DEPTH, DEFAULT_ENCODER_FREQUENCIES, DEFAULT_ENCODER_TO_INFERENCE_DEPTH,
    DEFAULT_INFERENCE_HIDDEN, DEFAULT_MEMORY_INIT_DEPTH, DEFAULT_MEMORY_REQUEST_DEPTH,
    DEFAULT_OUTPUT_DEPTH, DEFAULT_PORT_CAPACITY, DEFAULT_POSITION_DEPTH, DEFAULT_STEP_SIZE,
};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration structure for the pipeline.
///
/// Every section is optional; omitted values fall back to the constants in
/// [`crate::config::consts`].
///
/// # Example
/// ```yaml
/// channels:
///   encoder_to_inference_depth: 4
///   output_depth: 8
/// reshaper:
///   step_size: 0.1
/// stages:
///   encoder:
///     frequencies: 4
///     latency: 2
///   inference:
///     hidden: 16
///   compositor:
///     samples_per_ray: 192
/// runtime:
///   port_capacity: 64
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub channels: ChannelConfig,
    #[serde(default)]
    pub reshaper: ReshaperConfig,
    #[serde(default)]
    pub stages: StagesConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Depths of every buffered channel.
///
/// Unset values use the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ChannelConfig {
    pub command_depth: Option<usize>,
    pub position_depth: Option<usize>,
    pub memory_init_depth: Option<usize>,
    pub memory_request_depth: Option<usize>,
    pub encoder_to_inference_depth: Option<usize>,
    pub output_depth: Option<usize>,
}

impl ChannelConfig {
    pub fn get_command_depth(&self) -> usize {
        self.command_depth.unwrap_or(DEFAULT_COMMAND_DEPTH)
    }

    pub fn get_position_depth(&self) -> usize {
        self.position_depth.unwrap_or(DEFAULT_POSITION_DEPTH)
    }

    pub fn get_memory_init_depth(&self) -> usize {
        self.memory_init_depth.unwrap_or(DEFAULT_MEMORY_INIT_DEPTH)
    }

    pub fn get_memory_request_depth(&self) -> usize {
        self.memory_request_depth
            .unwrap_or(DEFAULT_MEMORY_REQUEST_DEPTH)
    }

    pub fn get_encoder_to_inference_depth(&self) -> usize {
        self.encoder_to_inference_depth
            .unwrap_or(DEFAULT_ENCODER_TO_INFERENCE_DEPTH)
    }

    pub fn get_output_depth(&self) -> usize {
        self.output_depth.unwrap_or(DEFAULT_OUTPUT_DEPTH)
    }

    fn depths(&self) -> [(&'static str, usize); 6] {
        [
            ("channels.command_depth", self.get_command_depth()),
            ("channels.position_depth", self.get_position_depth()),
            ("channels.memory_init_depth", self.get_memory_init_depth()),
            ("channels.memory_request_depth", self.get_memory_request_depth()),
            (
                "channels.encoder_to_inference_depth",
                self.get_encoder_to_inference_depth(),
            ),
            ("channels.output_depth", self.get_output_depth()),
        ]
    }
}

/// Output reshaper settings.
///
/// `step_size` is the ray step handed to the compositor with every sample.
/// It is a fixed stand-in for a per-sample ray differential.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReshaperConfig {
    pub step_size: f32,
}

impl Default for ReshaperConfig {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
        }
    }
}

/// Settings for the reference stage implementations.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StagesConfig {
    pub encoder: EncoderConfig,
    pub inference: InferenceConfig,
    pub compositor: CompositorConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
    /// Frequency octaves per axis. The encoder emits `6 * frequencies` features.
    pub frequencies: usize,
    /// Ticks a sample spends inside the encoder.
    pub latency: u32,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            frequencies: DEFAULT_ENCODER_FREQUENCIES,
            latency: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    pub hidden: usize,
    pub latency: u32,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            hidden: DEFAULT_INFERENCE_HIDDEN,
            latency: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompositorConfig {
    /// Samples per ray before the accumulator restarts. Zero never restarts.
    pub samples_per_ray: usize,
    pub latency: u32,
}

/// Async driver settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of each async port between the caller and the driver task.
    pub port_capacity: usize,
    /// Minimum wall-clock time per tick. Unset ticks as fast as possible.
    pub tick_period_us: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            port_capacity: DEFAULT_PORT_CAPACITY,
            tick_period_us: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Check that the pipeline can be built from this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, depth) in self.channels.depths() {
            if depth == 0 {
                return Err(ConfigError::invalid(field, "depth must be at least 1"));
            }
        }

        let step = self.reshaper.step_size;
        if !step.is_finite() || step <= 0.0 {
            return Err(ConfigError::invalid(
                "reshaper.step_size",
                format!("must be a positive finite number, got {}", step),
            ));
        }

        if self.stages.encoder.frequencies == 0 {
            return Err(ConfigError::invalid(
                "stages.encoder.frequencies",
                "must be at least 1",
            ));
        }
        if self.stages.inference.hidden == 0 {
            return Err(ConfigError::invalid(
                "stages.inference.hidden",
                "must be at least 1",
            ));
        }
        if self.runtime.port_capacity == 0 {
            return Err(ConfigError::invalid(
                "runtime.port_capacity",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    PipelineConfig::from_yaml_str(&content)
}

/// Load and validate a config from a YAML file
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config_uses_defaults() {
        let cfg = PipelineConfig::from_yaml_str("{}").unwrap();

        assert_eq!(cfg.channels.get_command_depth(), DEFAULT_COMMAND_DEPTH);
        assert_eq!(cfg.channels.get_position_depth(), 192);
        assert_eq!(cfg.channels.get_memory_init_depth(), 1024);
        assert_eq!(cfg.reshaper.step_size, 0.1);
        assert_eq!(cfg.stages.encoder.frequencies, DEFAULT_ENCODER_FREQUENCIES);
        assert_eq!(cfg.stages.compositor.samples_per_ray, 0);
        assert_eq!(cfg.runtime.tick_period_us, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
channels:
  command_depth: 1
  encoder_to_inference_depth: 2
  output_depth: 3
reshaper:
  step_size: 0.25
stages:
  encoder:
    frequencies: 2
    latency: 5
  inference:
    hidden: 8
    latency: 1
  compositor:
    samples_per_ray: 16
runtime:
  port_capacity: 4
  tick_period_us: 10
"#;

        let cfg = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.channels.get_command_depth(), 1);
        assert_eq!(cfg.channels.get_encoder_to_inference_depth(), 2);
        assert_eq!(cfg.channels.get_output_depth(), 3);
        assert_eq!(cfg.channels.get_memory_request_depth(), DEFAULT_MEMORY_REQUEST_DEPTH);
        assert_eq!(cfg.reshaper.step_size, 0.25);
        assert_eq!(cfg.stages.encoder.frequencies, 2);
        assert_eq!(cfg.stages.encoder.latency, 5);
        assert_eq!(cfg.stages.inference.hidden, 8);
        assert_eq!(cfg.stages.compositor.samples_per_ray, 16);
        assert_eq!(cfg.runtime.port_capacity, 4);
        assert_eq!(cfg.runtime.tick_period_us, Some(10));
    }

    #[test]
    fn test_zero_depth_is_rejected() {
        let cfg = PipelineConfig::from_yaml_str("channels:\n  output_depth: 0\n").unwrap();
        match cfg.validate() {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, "channels.output_depth")
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_non_positive_step_size_is_rejected() {
        let cfg = PipelineConfig::from_yaml_str("reshaper:\n  step_size: 0.0\n").unwrap();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("reshaper.step_size"));
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let result = PipelineConfig::from_yaml_str("channels: [1, 2");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

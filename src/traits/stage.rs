// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::StageConfigError;
use crate::records::{
    CompositorInput, CompositorOutput, EncoderOutput, InferenceOutput, MemoryRequest,
    PositionSample,
};

/// Capability interface of a compute stage.
///
/// The orchestrator only sees this contract; what happens between `push` and
/// `try_pop` is up to the implementation. A stage advances one step per
/// `tick` and may refuse input while it is busy.
pub trait Stage: Send {
    type Input;
    type Output;

    fn name(&self) -> &'static str;

    /// Apply one memory write from the stage's configuration port.
    fn configure(&mut self, request: MemoryRequest) -> Result<(), StageConfigError> {
        let _ = request;
        Err(StageConfigError::NotConfigurable { stage: self.name() })
    }

    /// Offer an input. A busy stage hands it back.
    fn push(&mut self, input: Self::Input) -> Result<(), Self::Input>;

    /// Take a finished output, if one is ready.
    fn try_pop(&mut self) -> Option<Self::Output>;

    /// Advance internal state by one tick.
    fn tick(&mut self) {}

    /// True when nothing is in flight inside the stage.
    fn is_idle(&self) -> bool;

    /// Drop in-flight work and any per-run accumulators. Configured memory
    /// is kept.
    fn reset(&mut self);
}

pub type EncoderStage = Box<dyn Stage<Input = PositionSample, Output = EncoderOutput>>;
pub type InferenceStage = Box<dyn Stage<Input = EncoderOutput, Output = InferenceOutput>>;
pub type CompositorStage = Box<dyn Stage<Input = CompositorInput, Output = CompositorOutput>>;

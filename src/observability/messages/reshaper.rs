// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// Inference result translated into compositor input.
///
/// # Log Level
/// `trace!` - One event per sample
pub struct SampleReshaped {
    pub density: f32,
    pub step_size: f32,
    pub reshaped_total: u64,
}

impl Display for SampleReshaped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reshaped sample #{}: density={} step_size={}",
            self.reshaped_total, self.density, self.step_size
        )
    }
}

impl StructuredLog for SampleReshaped {
    fn log(&self) {
        tracing::trace!(
            density = self.density,
            step_size = self.step_size,
            reshaped_total = self.reshaped_total,
            "{}", self
        );
    }
}

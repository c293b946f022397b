// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stage adapters.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// A stage refused a memory write from its configuration port.
///
/// # Log Level
/// `warn!` - Configuration error, write discarded
///
/// # Example
/// ```
/// use icarus_dataflow::observability::messages::stage::StageWriteRejected;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "address out of range");
/// let msg = StageWriteRejected {
///     stage: "dense_inference",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct StageWriteRejected<'a> {
    pub stage: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StageWriteRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' rejected memory write: {}", self.stage, self.error)
    }
}

impl StructuredLog for StageWriteRejected<'_> {
    fn log(&self) {
        tracing::warn!(stage = self.stage, error = %self.error, "{}", self);
    }
}

/// The encoder consumed the sample flagged as last of its batch.
///
/// # Log Level
/// `debug!` - Batch boundary
pub struct BatchEncoded<'a> {
    pub stage: &'a str,
    pub samples: u64,
}

impl Display for BatchEncoded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' finished a batch of {} samples",
            self.stage, self.samples
        )
    }
}

impl StructuredLog for BatchEncoded<'_> {
    fn log(&self) {
        tracing::debug!(stage = self.stage, samples = self.samples, "{}", self);
    }
}

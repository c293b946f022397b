// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the memory router.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// Memory request delivered to a stage configuration port.
///
/// # Log Level
/// `trace!` - One event per weight write
pub struct RequestRouted<'a> {
    pub target: &'a str,
    pub bank: u8,
    pub row: usize,
    pub col: usize,
}

impl Display for RequestRouted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Routed memory request to {} bank {} at ({}, {})",
            self.target, self.bank, self.row, self.col
        )
    }
}

impl StructuredLog for RequestRouted<'_> {
    fn log(&self) {
        tracing::trace!(
            target_stage = self.target,
            bank = self.bank,
            row = self.row,
            col = self.col,
            "{}", self
        );
    }
}

/// Memory request without a routing target. Dropped.
///
/// # Log Level
/// `warn!` - Configuration error, data loss
///
/// # Example
/// ```
/// use icarus_dataflow::observability::messages::router::RequestDropped;
///
/// let msg = RequestDropped {
///     row: 0,
///     col: 2,
///     dropped_total: 5,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct RequestDropped {
    pub row: usize,
    pub col: usize,
    pub dropped_total: u64,
}

impl Display for RequestDropped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped memory request at ({}, {}) with no valid target ({} dropped so far)",
            self.row, self.col, self.dropped_total
        )
    }
}

impl StructuredLog for RequestDropped {
    fn log(&self) {
        tracing::warn!(
            row = self.row,
            col = self.col,
            dropped_total = self.dropped_total,
            "{}", self
        );
    }
}

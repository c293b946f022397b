// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the command dispatcher.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Command popped and a bulk transfer started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use icarus_dataflow::observability::messages::dispatcher::CommandAccepted;
///
/// let msg = CommandAccepted {
///     mode: "read_pos",
///     count: 192,
///     tick: 12,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct CommandAccepted<'a> {
    pub mode: &'a str,
    pub count: u32,
    pub tick: u64,
}

impl Display for CommandAccepted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Command {} accepted at tick {}: transferring {} items",
            self.mode, self.tick, self.count
        )
    }
}

impl CommandAccepted<'_> {
    /// Span covering the whole transfer; the dispatcher enters it on every
    /// tick the command is active.
    pub fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "command",
            span_name = name,
            mode = self.mode,
            count = self.count,
            accepted_at = self.tick,
        )
    }
}

impl StructuredLog for CommandAccepted<'_> {
    fn log(&self) {
        tracing::info!(mode = self.mode, count = self.count, tick = self.tick, "{}", self);
    }
}

/// Bulk transfer for a command finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CommandCompleted<'a> {
    pub mode: &'a str,
    pub count: u32,
    pub ticks_taken: u64,
}

impl Display for CommandCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Command {} completed: {} items in {} ticks",
            self.mode, self.count, self.ticks_taken
        )
    }
}

impl StructuredLog for CommandCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            count = self.count,
            ticks_taken = self.ticks_taken,
            "{}", self
        );
    }
}

/// Command with an unrecognized mode code. Ignored, not an error.
///
/// # Log Level
/// `debug!` - Expected no-op
pub struct CommandIgnored {
    pub code: u8,
    pub count: u32,
}

impl Display for CommandIgnored {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring command with reserved mode {} (count={})",
            self.code, self.count
        )
    }
}

impl StructuredLog for CommandIgnored {
    fn log(&self) {
        tracing::debug!(code = self.code, count = self.count, "{}", self);
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit a `tracing` event with structured fields at the
//! level documented on the type. Messages that open a unit of work also
//! provide a `span` the caller enters for its duration.
//!
//! # Organization
//!
//! * `pipeline` - construction, reset, and async runtime lifecycle
//! * `dispatcher` - command interpretation and bulk transfers
//! * `router` - memory request routing and configuration errors
//! * `reshaper` - inference-to-compositor translation
//! * `stage` - stage adapter events
//!
//! # Usage Pattern
//!
//! ```rust
//! use icarus_dataflow::observability::messages::StructuredLog;
//! use icarus_dataflow::observability::messages::router::RequestDropped;
//!
//! let msg = RequestDropped {
//!     row: 3,
//!     col: 1,
//!     dropped_total: 1,
//! };
//!
//! msg.log();
//! ```

pub mod dispatcher;
pub mod pipeline;
pub mod reshaper;
pub mod router;
pub mod stage;

/// Emit a message as a structured `tracing` event.
pub trait StructuredLog {
    /// Emit the event at the message's documented level.
    fn log(&self);
}

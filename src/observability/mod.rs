// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Message types follow a struct-based pattern with a `Display`
//! implementation, so log text lives in one place instead of being scattered
//! through the control loops.
//!
//! # Architecture
//!
//! Messages are organized by subsystem under [`messages`]. The binary
//! installs the subscriber through [`init_tracing`].
//!
//! # Usage
//!
//! ```rust
//! use icarus_dataflow::observability::messages::dispatcher::CommandIgnored;
//!
//! let msg = CommandIgnored { code: 7, count: 3 };
//! tracing::debug!("{}", msg);
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install a formatting subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it twice is harmless; the second call keeps the first subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

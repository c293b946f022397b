// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors surfaced by the async pipeline runtime handle.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The driver task is gone, so the named port no longer accepts traffic.
    #[error("Pipeline port '{port}' is closed")]
    PortClosed { port: &'static str },

    /// The driver task panicked or was aborted.
    #[error("Pipeline driver task failed: {0}")]
    DriverFailed(#[from] tokio::task::JoinError),
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline orchestration.
//!
//! The pipeline is a set of control loops connected by handshake channels.
//! [`Pipeline::tick`] advances every loop exactly once, upstream first:
//!
//! 1. [`CommandDispatcher`] - interprets commands and performs bulk transfers
//! 2. [`MemoryRouter`] - routes memory requests to stage configuration ports
//! 3. encoder adapter
//! 4. inference adapter
//! 5. [`OutputReshaper`] - inference output to compositor input
//! 6. compositor adapter
//!
//! Because producers step before consumers, an item pushed onto a `Direct`
//! channel is consumed within the same tick.
//!
//! [`PipelineRuntime`] moves a pipeline onto a tokio task and exposes it
//! through async ports.

pub mod dispatcher;
pub mod pipeline;
pub mod reshaper;
pub mod router;
pub mod runtime;

pub use dispatcher::CommandDispatcher;
pub use pipeline::{Pipeline, PipelineBuilder, PipelineChannels, PipelineStats};
pub use reshaper::OutputReshaper;
pub use router::MemoryRouter;
pub use runtime::{PipelineHandle, PipelineRuntime, PipelineSender};

/// Two-phase state machine shared by every control loop.
///
/// `Resetting` resets every channel end the loop owns and does nothing else
/// that tick. `Steady` performs at most one unit of work per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Resetting,
    Steady,
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod channels;   // handshake channel primitives
pub mod config;     // YAML config + defaults
pub mod engine;     // control loops, pipeline, async runtime
pub mod errors;     // error handling
pub mod observability;
pub mod records;    // records carried over channels
pub mod stages;     // reference compute stages + adapter
pub mod traits;     // unified abstractions

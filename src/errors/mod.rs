// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod channel;
mod config;
mod runtime;
mod stage;

pub use channel::PushError;
pub use config::ConfigError;
pub use runtime::RuntimeError;
pub use stage::StageConfigError;

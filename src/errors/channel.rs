// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// A refused non-blocking push. The item is handed back so the producer can
/// hold it and retry on a later tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PushError<T> {
    /// The channel has no free slot this tick.
    Full(T),
    /// The write side has not been reset since construction or the last
    /// global reset.
    NotReset(T),
}

impl<T> PushError<T> {
    /// Recover the refused item.
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::NotReset(item) => item,
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "channel is full"),
            PushError::NotReset(_) => write!(f, "channel write side has not been reset"),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for PushError<T> {}

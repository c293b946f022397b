// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::PushError;
use crate::traits::Channel;

/// Single-slot rendezvous channel.
///
/// The slot holds the item a producer has offered until the consumer takes
/// it. A second offer is refused until then, so the producer stalls exactly
/// as long as the consumer is not ready.
#[derive(Debug)]
pub struct Direct<T> {
    name: &'static str,
    slot: Option<T>,
    write_ready: bool,
    read_ready: bool,
    transfers: u64,
}

impl<T> Direct<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: None,
            write_ready: false,
            read_ready: false,
            transfers: 0,
        }
    }

    /// Number of items accepted since construction.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    pub fn is_reset(&self) -> bool {
        self.write_ready && self.read_ready
    }
}

impl<T> Channel<T> for Direct<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn push(&mut self, item: T) -> Result<(), PushError<T>> {
        if !self.write_ready {
            return Err(PushError::NotReset(item));
        }
        if self.slot.is_some() {
            return Err(PushError::Full(item));
        }
        self.slot = Some(item);
        self.transfers += 1;
        Ok(())
    }

    fn pop_nb(&mut self) -> Option<T> {
        if !self.read_ready {
            return None;
        }
        self.slot.take()
    }

    fn len(&self) -> usize {
        usize::from(self.slot.is_some())
    }

    fn capacity(&self) -> usize {
        1
    }

    fn can_push(&self) -> bool {
        self.write_ready && self.slot.is_none()
    }

    fn reset_write(&mut self) {
        self.slot = None;
        self.write_ready = true;
    }

    fn reset_read(&mut self) {
        self.slot = None;
        self.read_ready = true;
    }

    fn assert_reset(&mut self) {
        self.slot = None;
        self.write_ready = false;
        self.read_ready = false;
    }
}

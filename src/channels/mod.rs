// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Handshake channel primitives.
//!
//! * [`Direct`] - single-slot rendezvous, no buffering beyond the in-flight item
//! * [`Buffered`] - fixed-depth FIFO with backpressure
//!
//! Both start un-reset: the writer and the reader must each call their reset
//! before the first transfer. Blocking operations are modelled by the
//! owning control loop: a blocking pop is a `pop_nb` retried every tick, and
//! a blocking push is a [`BlockingPush`] that holds the refused item until
//! the channel accepts it.

mod buffered;
mod direct;

pub use buffered::Buffered;
pub use direct::Direct;

use crate::traits::Channel;

/// An item whose blocking push has not completed yet.
///
/// While an item is pending, the owning loop must not start new work that
/// would produce another item for the same channel.
#[derive(Debug)]
pub struct BlockingPush<T> {
    held: Option<T>,
}

impl<T> BlockingPush<T> {
    pub fn new() -> Self {
        Self { held: None }
    }

    pub fn is_pending(&self) -> bool {
        self.held.is_some()
    }

    /// Start a blocking push: try once now, hold the item if refused.
    ///
    /// Returns `true` when the item was accepted immediately.
    pub fn push<C: Channel<T>>(&mut self, channel: &mut C, item: T) -> bool {
        debug_assert!(self.held.is_none(), "blocking push already pending");
        self.held = Some(item);
        self.retry(channel)
    }

    /// Retry a pending push. Returns `true` once nothing is pending.
    pub fn retry<C: Channel<T>>(&mut self, channel: &mut C) -> bool {
        let Some(item) = self.held.take() else {
            return true;
        };
        match channel.push(item) {
            Ok(()) => true,
            Err(refused) => {
                self.held = Some(refused.into_inner());
                false
            }
        }
    }

    /// Drop the pending item, if any.
    pub fn clear(&mut self) -> Option<T> {
        self.held.take()
    }
}

impl<T> Default for BlockingPush<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocking_push_holds_until_accepted() {
        let mut chan: Direct<u32> = Direct::new("test");
        chan.reset_write();
        chan.reset_read();
        chan.push(1).unwrap();

        let mut pending = BlockingPush::new();
        assert!(!pending.push(&mut chan, 2));
        assert!(pending.is_pending());
        assert!(!pending.retry(&mut chan));

        assert_eq!(chan.pop_nb(), Some(1));
        assert!(pending.retry(&mut chan));
        assert!(!pending.is_pending());
        assert_eq!(chan.pop_nb(), Some(2));
    }

    #[test]
    fn test_retry_with_nothing_pending_is_done() {
        let mut chan: Buffered<u32> = Buffered::new("test", 1);
        let mut pending: BlockingPush<u32> = BlockingPush::default();
        assert!(pending.retry(&mut chan));
    }
}

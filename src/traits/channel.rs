// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::PushError;

/// Handshake channel between exactly one writer and one reader.
///
/// All operations are non-blocking. A blocking push or pop is expressed by
/// the calling control loop retrying on the next tick (see
/// [`crate::channels::BlockingPush`]).
pub trait Channel<T> {
    /// Static name used in logs.
    fn name(&self) -> &'static str;

    /// Offer an item. Refusal hands the item back.
    fn push(&mut self, item: T) -> Result<(), PushError<T>>;

    /// Take the oldest item if one is available to the reader.
    fn pop_nb(&mut self) -> Option<T>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of items the channel can hold.
    fn capacity(&self) -> usize;

    /// True when a push would be accepted right now.
    fn can_push(&self) -> bool;

    /// Reset from the writer's side. Clears any stale in-flight item.
    fn reset_write(&mut self);

    /// Reset from the reader's side. Clears any stale in-flight item.
    fn reset_read(&mut self);

    /// Global reset: discard contents and require both sides to reset again
    /// before the next transfer.
    fn assert_reset(&mut self);
}

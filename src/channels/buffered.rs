// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;

use crate::errors::PushError;
use crate::traits::Channel;

/// Fixed-capacity FIFO with backpressure.
///
/// A push past capacity is refused with [`PushError::Full`]; the queue never
/// grows beyond the depth it was built with.
#[derive(Debug)]
pub struct Buffered<T> {
    name: &'static str,
    items: VecDeque<T>,
    capacity: usize,
    write_ready: bool,
    read_ready: bool,
    transfers: u64,
    high_water: usize,
}

impl<T> Buffered<T> {
    /// Build a queue of the given depth. A zero depth is clamped to one.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name,
            items: VecDeque::with_capacity(capacity),
            capacity,
            write_ready: false,
            read_ready: false,
            transfers: 0,
            high_water: 0,
        }
    }

    /// Largest occupancy observed since construction.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

impl<T> Channel<T> for Buffered<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn push(&mut self, item: T) -> Result<(), PushError<T>> {
        if !self.write_ready {
            return Err(PushError::NotReset(item));
        }
        if self.is_full() {
            return Err(PushError::Full(item));
        }
        self.items.push_back(item);
        self.transfers += 1;
        self.high_water = self.high_water.max(self.items.len());
        debug_assert!(self.items.len() <= self.capacity);
        Ok(())
    }

    fn pop_nb(&mut self) -> Option<T> {
        if !self.read_ready {
            return None;
        }
        self.items.pop_front()
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn can_push(&self) -> bool {
        self.write_ready && !self.is_full()
    }

    fn reset_write(&mut self) {
        self.items.clear();
        self.write_ready = true;
    }

    fn reset_read(&mut self) {
        self.items.clear();
        self.read_ready = true;
    }

    fn assert_reset(&mut self) {
        self.items.clear();
        self.write_ready = false;
        self.read_ready = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(capacity: usize) -> Buffered<u32> {
        let mut queue = Buffered::new("test", capacity);
        queue.reset_write();
        queue.reset_read();
        queue
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ready(4);
        for i in 0..4 {
            queue.push(i).unwrap();
        }
        let drained: Vec<u32> = std::iter::from_fn(|| queue.pop_nb()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_push_past_capacity_is_refused_until_pop() {
        let mut queue = ready(3);
        for i in 0..3 {
            queue.push(i).unwrap();
        }

        assert!(queue.is_full());
        match queue.push(3) {
            Err(PushError::Full(item)) => assert_eq!(item, 3),
            other => panic!("Expected Full, got {:?}", other),
        }
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.pop_nb(), Some(0));
        queue.push(3).unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.high_water(), 3);
    }

    #[test]
    fn test_never_exceeds_capacity_under_mixed_traffic() {
        let mut queue = ready(2);
        let mut next = 0u32;
        let mut popped = Vec::new();

        for round in 0..50u32 {
            // Bursty producer, slower consumer.
            for _ in 0..(round % 4) {
                if queue.push(next).is_ok() {
                    next += 1;
                }
                assert!(queue.len() <= queue.capacity());
            }
            if round % 2 == 0 {
                if let Some(item) = queue.pop_nb() {
                    popped.push(item);
                }
            }
        }

        assert!(queue.high_water() <= 2);
        assert!(popped.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_assert_reset_discards_in_flight_entry() {
        let mut queue = ready(2);
        queue.push(42).unwrap();
        queue.assert_reset();

        assert!(queue.is_empty());
        assert_eq!(queue.pop_nb(), None);
        assert!(matches!(queue.push(1), Err(PushError::NotReset(1))));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue: Buffered<u32> = Buffered::new("test", 0);
        assert_eq!(queue.capacity(), 1);
    }
}

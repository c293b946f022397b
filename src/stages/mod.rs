// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Compute stages and the adapter loop that connects them to channels.
//!
//! # Reference Stages
//!
//! * [`PositionEncoder`] - sinusoidal position encoding behind a projection matrix
//! * [`DenseInference`] - two dense layers with a ReLU in between
//! * [`VolumeCompositor`] - emission/absorption compositing along a ray
//!
//! Anything implementing [`crate::traits::Stage`] with the same record
//! types can be swapped in through [`crate::engine::PipelineBuilder`].
//!
//! # Timing
//!
//! Every reference stage holds one item at a time. An item pushed on tick
//! `t` with a latency of `L` ticks can be popped on tick `t + L`; the stage
//! refuses input until then.

pub mod adapter;
pub mod compositor;
pub mod encoder;
pub mod factory;
pub mod inference;

pub use adapter::StageAdapter;
pub use compositor::VolumeCompositor;
pub use encoder::PositionEncoder;
pub use factory::StageFactory;
pub use inference::DenseInference;

/// Single in-flight item with a fixed countdown.
#[derive(Debug)]
pub(crate) struct InFlight<T> {
    item: Option<T>,
    remaining: u32,
    latency: u32,
}

impl<T> InFlight<T> {
    pub(crate) fn new(latency: u32) -> Self {
        Self {
            item: None,
            remaining: 0,
            latency,
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.item.is_some()
    }

    pub(crate) fn start(&mut self, item: T) {
        debug_assert!(self.item.is_none());
        self.item = Some(item);
        self.remaining = self.latency;
    }

    pub(crate) fn tick(&mut self) {
        if self.item.is_some() {
            self.remaining = self.remaining.saturating_sub(1);
        }
    }

    pub(crate) fn take_ready(&mut self) -> Option<T> {
        if self.remaining == 0 {
            self.item.take()
        } else {
            None
        }
    }

    pub(crate) fn clear(&mut self) {
        self.item = None;
        self.remaining = 0;
    }
}

/// Row-major matrix used as a stage memory bank.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Bank {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl Bank {
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    #[cfg(test)]
    pub(crate) fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols + col]
    }

    /// Write one entry. Returns `false` when the address is out of range.
    pub(crate) fn set(&mut self, row: usize, col: usize, value: f32) -> bool {
        if row >= self.rows || col >= self.cols {
            return false;
        }
        self.values[row * self.cols + col] = value;
        true
    }

    /// `self · input`, treating missing input entries as zero.
    pub(crate) fn mul_vec(&self, input: &[f32]) -> Vec<f32> {
        (0..self.rows)
            .map(|row| {
                let start = row * self.cols;
                self.values[start..start + self.cols]
                    .iter()
                    .zip(input)
                    .map(|(w, x)| w * x)
                    .sum()
            })
            .collect()
    }
}

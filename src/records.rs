// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Record types that travel over the pipeline's channels.
//!
//! Inbound records (`Command`, `MemoryRequest`, `PositionSample`) are created
//! by the caller and consumed exactly once. Everything downstream of the
//! encoder is produced by a stage or by the output reshaper.

use serde::Serialize;

/// Bulk operation selected by a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandMode {
    /// Move `count` memory requests from the memory-init port to the router.
    WeightInit,
    /// Move `count` position samples from the position port to the encoder.
    ReadPos,
    /// Any mode code the dispatcher does not understand. Ignored.
    Reserved(u8),
}

impl CommandMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandMode::WeightInit => "weight_init",
            CommandMode::ReadPos => "read_pos",
            CommandMode::Reserved(_) => "reserved",
        }
    }
}

/// External instruction: one bulk operation and its item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub mode: CommandMode,
    pub count: u32,
}

impl Command {
    pub fn weight_init(count: u32) -> Self {
        Self {
            mode: CommandMode::WeightInit,
            count,
        }
    }

    pub fn read_pos(count: u32) -> Self {
        Self {
            mode: CommandMode::ReadPos,
            count,
        }
    }
}

/// Stage whose configuration port receives a [`MemoryRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryTarget {
    Encoder,
    Inference,
}

impl MemoryTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryTarget::Encoder => "encoder",
            MemoryTarget::Inference => "inference",
        }
    }
}

/// Row/column address inside a stage memory bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Address {
    pub row: usize,
    pub col: usize,
}

/// A single parameter write destined for one stage.
///
/// `target` is `None` when the producer did not tag the request; the router
/// drops such requests. `bank` selects a memory inside the target stage
/// (the reference inference stage keeps one bank per layer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryRequest {
    pub target: Option<MemoryTarget>,
    pub bank: u8,
    pub address: Address,
    pub payload: f32,
}

impl MemoryRequest {
    pub fn encoder(row: usize, col: usize, payload: f32) -> Self {
        Self {
            target: Some(MemoryTarget::Encoder),
            bank: 0,
            address: Address { row, col },
            payload,
        }
    }

    pub fn inference(bank: u8, row: usize, col: usize, payload: f32) -> Self {
        Self {
            target: Some(MemoryTarget::Inference),
            bank,
            address: Address { row, col },
            payload,
        }
    }

    /// A request with no routing tag.
    pub fn untargeted(row: usize, col: usize, payload: f32) -> Self {
        Self {
            target: None,
            bank: 0,
            address: Address { row, col },
            payload,
        }
    }
}

/// One 3-D sample position along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub coordinates: [f32; 3],
    pub is_last_of_batch: bool,
}

impl PositionSample {
    pub fn new(coordinates: [f32; 3], is_last_of_batch: bool) -> Self {
        Self {
            coordinates,
            is_last_of_batch,
        }
    }
}

/// Encoded feature vector. The orchestrator forwards it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderOutput {
    pub features: Vec<f32>,
}

/// Raw inference result: `features[0..3]` is an emission triple and
/// `features[3]` a density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceOutput {
    pub features: [f32; 4],
}

/// Compositor input produced by the output reshaper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositorInput {
    pub emitted_color: [f32; 3],
    pub density: f32,
    pub step_size: f32,
}

/// Final pipeline result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompositorOutput {
    pub color: [f32; 3],
}

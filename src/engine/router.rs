// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::channels::BlockingPush;
use crate::engine::LoopPhase;
use crate::observability::messages::pipeline::LoopReset;
use crate::observability::messages::router::{RequestDropped, RequestRouted};
use crate::observability::messages::StructuredLog;
use crate::records::{MemoryRequest, MemoryTarget};
use crate::traits::Channel;

const NAME: &str = "memory_router";

/// Routes memory requests to the configuration port of their target stage.
///
/// One request is popped per tick and pushed, blocking, to exactly one port.
/// Requests without a target are dropped and counted. No request is popped
/// while a previous push is still pending.
pub struct MemoryRouter {
    phase: LoopPhase,
    to_encoder: BlockingPush<MemoryRequest>,
    to_inference: BlockingPush<MemoryRequest>,
    routed_to_encoder: u64,
    routed_to_inference: u64,
    dropped: u64,
}

impl MemoryRouter {
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::Resetting,
            to_encoder: BlockingPush::new(),
            to_inference: BlockingPush::new(),
            routed_to_encoder: 0,
            routed_to_inference: 0,
            dropped: 0,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == LoopPhase::Steady
            && !self.to_encoder.is_pending()
            && !self.to_inference.is_pending()
    }

    /// Requests delivered to the given stage's configuration port.
    pub fn routed(&self, target: MemoryTarget) -> u64 {
        match target {
            MemoryTarget::Encoder => self.routed_to_encoder,
            MemoryTarget::Inference => self.routed_to_inference,
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn assert_reset(&mut self) -> usize {
        let discarded = usize::from(self.to_encoder.clear().is_some())
            + usize::from(self.to_inference.clear().is_some());
        self.phase = LoopPhase::Resetting;
        discarded
    }

    pub fn step<Q, E, I>(
        &mut self,
        tick: u64,
        queue: &mut Q,
        encoder_config: &mut E,
        inference_config: &mut I,
    ) where
        Q: Channel<MemoryRequest>,
        E: Channel<MemoryRequest>,
        I: Channel<MemoryRequest>,
    {
        if self.phase == LoopPhase::Resetting {
            queue.reset_read();
            encoder_config.reset_write();
            inference_config.reset_write();
            self.phase = LoopPhase::Steady;
            LoopReset {
                loop_name: NAME,
                tick,
            }
            .log();
            return;
        }

        if !self.flush(encoder_config, inference_config) {
            return;
        }

        let Some(request) = queue.pop_nb() else {
            return;
        };

        let Some(target) = request.target else {
            self.dropped += 1;
            RequestDropped {
                row: request.address.row,
                col: request.address.col,
                dropped_total: self.dropped,
            }
            .log();
            return;
        };

        RequestRouted {
            target: target.as_str(),
            bank: request.bank,
            row: request.address.row,
            col: request.address.col,
        }
        .log();

        match target {
            MemoryTarget::Encoder => {
                if self.to_encoder.push(encoder_config, request) {
                    self.routed_to_encoder += 1;
                }
            }
            MemoryTarget::Inference => {
                if self.to_inference.push(inference_config, request) {
                    self.routed_to_inference += 1;
                }
            }
        }
    }

    /// Retry any pending push. Returns `true` when nothing is pending.
    fn flush<E, I>(&mut self, encoder_config: &mut E, inference_config: &mut I) -> bool
    where
        E: Channel<MemoryRequest>,
        I: Channel<MemoryRequest>,
    {
        if self.to_encoder.is_pending() {
            if !self.to_encoder.retry(encoder_config) {
                return false;
            }
            self.routed_to_encoder += 1;
        }
        if self.to_inference.is_pending() {
            if !self.to_inference.retry(inference_config) {
                return false;
            }
            self.routed_to_inference += 1;
        }
        true
    }
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::new()
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::channels::BlockingPush;
use crate::engine::LoopPhase;
use crate::observability::messages::pipeline::LoopReset;
use crate::observability::messages::reshaper::SampleReshaped;
use crate::observability::messages::StructuredLog;
use crate::records::{CompositorInput, InferenceOutput};
use crate::traits::Channel;

const NAME: &str = "output_reshaper";

/// Turns each inference result into exactly one compositor input.
///
/// `features[0..3]` becomes the emitted colour, `features[3]` the density,
/// and every sample carries the same configured `step_size`.
pub struct OutputReshaper {
    phase: LoopPhase,
    step_size: f32,
    pending: BlockingPush<CompositorInput>,
    reshaped: u64,
}

impl OutputReshaper {
    pub fn new(step_size: f32) -> Self {
        Self {
            phase: LoopPhase::Resetting,
            step_size,
            pending: BlockingPush::new(),
            reshaped: 0,
        }
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    pub fn reshaped(&self) -> u64 {
        self.reshaped
    }

    pub fn is_idle(&self) -> bool {
        self.phase == LoopPhase::Steady && !self.pending.is_pending()
    }

    pub fn reshape(&self, output: &InferenceOutput) -> CompositorInput {
        let [r, g, b, density] = output.features;
        CompositorInput {
            emitted_color: [r, g, b],
            density,
            step_size: self.step_size,
        }
    }

    pub fn assert_reset(&mut self) -> usize {
        self.phase = LoopPhase::Resetting;
        usize::from(self.pending.clear().is_some())
    }

    pub fn step<In, Out>(&mut self, tick: u64, input: &mut In, output: &mut Out)
    where
        In: Channel<InferenceOutput>,
        Out: Channel<CompositorInput>,
    {
        if self.phase == LoopPhase::Resetting {
            input.reset_read();
            output.reset_write();
            self.phase = LoopPhase::Steady;
            LoopReset {
                loop_name: NAME,
                tick,
            }
            .log();
            return;
        }

        if !self.pending.retry(output) {
            return;
        }

        if let Some(result) = input.pop_nb() {
            let reshaped = self.reshape(&result);
            self.reshaped += 1;
            SampleReshaped {
                density: reshaped.density,
                step_size: reshaped.step_size,
                reshaped_total: self.reshaped,
            }
            .log();
            self.pending.push(output, reshaped);
        }
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::channels::BlockingPush;
use crate::engine::LoopPhase;
use crate::observability::messages::{pipeline::LoopReset, stage::StageWriteRejected, StructuredLog};
use crate::records::MemoryRequest;
use crate::traits::{Channel, Stage};

/// Control loop that connects one [`Stage`] to its three channels.
///
/// Each steady tick, in order:
/// 1. apply at most one request from the configuration channel,
/// 2. offer one input to the stage (a refused input is held and re-offered),
/// 3. move one finished output toward the output channel with a blocking push,
/// 4. advance the stage by one tick.
///
/// While an output push is pending no new output is taken from the stage, so
/// a full downstream channel stalls the stage and, through it, the input.
pub struct StageAdapter<I, O> {
    stage: Box<dyn Stage<Input = I, Output = O>>,
    phase: LoopPhase,
    input_hold: Option<I>,
    output: BlockingPush<O>,
    rejected_writes: u64,
}

impl<I, O> StageAdapter<I, O> {
    pub fn new(stage: Box<dyn Stage<Input = I, Output = O>>) -> Self {
        Self {
            stage,
            phase: LoopPhase::Resetting,
            input_hold: None,
            output: BlockingPush::new(),
            rejected_writes: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.stage.name()
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Configuration writes the stage refused since construction.
    pub fn rejected_writes(&self) -> u64 {
        self.rejected_writes
    }

    pub fn is_idle(&self) -> bool {
        self.phase == LoopPhase::Steady
            && self.input_hold.is_none()
            && !self.output.is_pending()
            && self.stage.is_idle()
    }

    /// Drop everything the loop and its stage hold and re-enter the reset
    /// phase. Returns the number of discarded items.
    pub fn assert_reset(&mut self) -> usize {
        let mut discarded = usize::from(self.input_hold.take().is_some());
        discarded += usize::from(self.output.clear().is_some());
        if !self.stage.is_idle() {
            discarded += 1;
        }
        self.stage.reset();
        self.phase = LoopPhase::Resetting;
        discarded
    }

    pub fn step<C, In, Out>(&mut self, tick: u64, config: &mut C, input: &mut In, output: &mut Out)
    where
        C: Channel<MemoryRequest>,
        In: Channel<I>,
        Out: Channel<O>,
    {
        if self.phase == LoopPhase::Resetting {
            config.reset_read();
            input.reset_read();
            output.reset_write();
            self.phase = LoopPhase::Steady;
            LoopReset {
                loop_name: self.stage.name(),
                tick,
            }
            .log();
            return;
        }

        if let Some(request) = config.pop_nb() {
            if let Err(error) = self.stage.configure(request) {
                self.rejected_writes += 1;
                StageWriteRejected {
                    stage: self.stage.name(),
                    error: &error,
                }
                .log();
            }
        }

        if let Some(item) = self.input_hold.take().or_else(|| input.pop_nb()) {
            if let Err(refused) = self.stage.push(item) {
                self.input_hold = Some(refused);
            }
        }

        if self.output.retry(output) {
            if let Some(result) = self.stage.try_pop() {
                self.output.push(output, result);
            }
        }

        self.stage.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{Buffered, Direct};
    use crate::errors::StageConfigError;
    use crate::stages::InFlight;

    /// Doubles its input after a fixed latency. Accepts writes to address (0, 0) only.
    struct Doubler {
        in_flight: InFlight<u32>,
        offset: u32,
    }

    impl Doubler {
        fn boxed(latency: u32) -> Box<dyn Stage<Input = u32, Output = u32>> {
            Box::new(Self {
                in_flight: InFlight::new(latency),
                offset: 0,
            })
        }
    }

    impl Stage for Doubler {
        type Input = u32;
        type Output = u32;

        fn name(&self) -> &'static str {
            "doubler"
        }

        fn configure(&mut self, request: MemoryRequest) -> Result<(), StageConfigError> {
            if request.address.row != 0 || request.address.col != 0 {
                return Err(StageConfigError::AddressOutOfRange {
                    stage: "doubler",
                    bank: request.bank,
                    address: request.address,
                    rows: 1,
                    cols: 1,
                });
            }
            self.offset = request.payload as u32;
            Ok(())
        }

        fn push(&mut self, input: u32) -> Result<(), u32> {
            if self.in_flight.is_busy() {
                return Err(input);
            }
            self.in_flight.start(input * 2 + self.offset);
            Ok(())
        }

        fn try_pop(&mut self) -> Option<u32> {
            self.in_flight.take_ready()
        }

        fn tick(&mut self) {
            self.in_flight.tick();
        }

        fn is_idle(&self) -> bool {
            !self.in_flight.is_busy()
        }

        fn reset(&mut self) {
            self.in_flight.clear();
        }
    }

    struct Ports {
        config: Direct<MemoryRequest>,
        input: Buffered<u32>,
        output: Buffered<u32>,
    }

    impl Ports {
        fn new(output_depth: usize) -> Self {
            let mut ports = Self {
                config: Direct::new("config"),
                input: Buffered::new("input", 4),
                output: Buffered::new("output", output_depth),
            };
            ports.config.reset_write();
            ports.input.reset_write();
            ports.output.reset_read();
            ports
        }

        fn step(&mut self, adapter: &mut StageAdapter<u32, u32>, tick: u64) {
            adapter.step(tick, &mut self.config, &mut self.input, &mut self.output);
        }
    }

    #[test]
    fn test_first_step_only_resets() {
        let mut adapter = StageAdapter::new(Doubler::boxed(0));
        let mut ports = Ports::new(2);
        assert_eq!(adapter.phase(), LoopPhase::Resetting);

        ports.step(&mut adapter, 0);
        assert_eq!(adapter.phase(), LoopPhase::Steady);
        assert!(ports.output.is_empty());

        ports.input.push(3).unwrap();
        ports.step(&mut adapter, 1);
        assert_eq!(ports.output.pop_nb(), Some(6));
    }

    #[test]
    fn test_latency_delays_output() {
        let mut adapter = StageAdapter::new(Doubler::boxed(2));
        let mut ports = Ports::new(2);
        ports.step(&mut adapter, 0);

        ports.input.push(1).unwrap();
        ports.step(&mut adapter, 1);
        ports.step(&mut adapter, 2);
        assert!(ports.output.is_empty());
        ports.step(&mut adapter, 3);
        assert_eq!(ports.output.pop_nb(), Some(2));
        assert!(adapter.is_idle());
    }

    #[test]
    fn test_full_output_stalls_stage() {
        let mut adapter = StageAdapter::new(Doubler::boxed(0));
        let mut ports = Ports::new(1);
        ports.step(&mut adapter, 0);

        for value in 1..=4 {
            ports.input.push(value).unwrap();
        }
        for tick in 1..=6 {
            ports.step(&mut adapter, tick);
        }
        // One item in the channel, one held by the loop, one inside the
        // stage, one held at its input.
        assert_eq!(ports.output.len(), 1);
        assert!(ports.input.is_empty());
        assert!(!adapter.is_idle());

        let mut drained = Vec::new();
        for tick in 7..=12 {
            if let Some(value) = ports.output.pop_nb() {
                drained.push(value);
            }
            ports.step(&mut adapter, tick);
        }
        drained.extend(ports.output.pop_nb());
        assert_eq!(drained, vec![2, 4, 6, 8]);
    }

    #[test]
    fn test_rejected_write_is_counted_and_pipeline_continues() {
        let mut adapter = StageAdapter::new(Doubler::boxed(0));
        let mut ports = Ports::new(2);
        ports.step(&mut adapter, 0);

        ports.config.push(MemoryRequest::encoder(5, 5, 1.0)).unwrap();
        ports.input.push(1).unwrap();
        ports.step(&mut adapter, 1);
        assert_eq!(adapter.rejected_writes(), 1);
        assert_eq!(ports.output.pop_nb(), Some(2));

        ports.config.push(MemoryRequest::encoder(0, 0, 10.0)).unwrap();
        ports.input.push(1).unwrap();
        ports.step(&mut adapter, 2);
        assert_eq!(ports.output.pop_nb(), Some(12));
        assert_eq!(adapter.rejected_writes(), 1);
    }

    #[test]
    fn test_assert_reset_discards_held_work() {
        let mut adapter = StageAdapter::new(Doubler::boxed(5));
        let mut ports = Ports::new(2);
        ports.step(&mut adapter, 0);

        ports.input.push(1).unwrap();
        ports.input.push(2).unwrap();
        ports.step(&mut adapter, 1);
        ports.step(&mut adapter, 2);

        assert_eq!(adapter.assert_reset(), 2);
        assert_eq!(adapter.phase(), LoopPhase::Resetting);
        assert!(!adapter.is_idle());
    }
}

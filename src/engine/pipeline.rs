// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;

use crate::channels::{Buffered, Direct};
use crate::config::PipelineConfig;
use crate::errors::ConfigError;
use crate::engine::{CommandDispatcher, MemoryRouter, OutputReshaper};
use crate::errors::PushError;
use crate::observability::messages::pipeline::{PipelineBuilt, ResetAsserted};
use crate::observability::messages::StructuredLog;
use crate::records::{
    Command, CommandMode, CompositorInput, CompositorOutput, EncoderOutput, InferenceOutput,
    MemoryRequest, MemoryTarget, PositionSample,
};
use crate::stages::{StageAdapter, StageFactory};
use crate::traits::{Channel, CompositorStage, EncoderStage, InferenceStage};

/// Every channel in the pipeline, named by the loop pair it connects.
///
/// `command_in`, `position_in`, and `memory_init_in` are written by the
/// caller; `output_queue` is read by the caller. The pipeline performs the
/// caller-side reset of those four.
pub struct PipelineChannels {
    pub command_in: Buffered<Command>,
    pub position_in: Buffered<PositionSample>,
    pub memory_init_in: Buffered<MemoryRequest>,
    pub memory_request_queue: Buffered<MemoryRequest>,
    pub encoder_config: Direct<MemoryRequest>,
    pub inference_config: Direct<MemoryRequest>,
    /// Reserved: no loop writes compositor configuration.
    pub compositor_config: Direct<MemoryRequest>,
    pub encoder_input: Direct<PositionSample>,
    pub encoder_to_inference: Buffered<EncoderOutput>,
    pub inference_output: Direct<InferenceOutput>,
    pub compositor_input: Direct<CompositorInput>,
    pub output_queue: Buffered<CompositorOutput>,
}

impl PipelineChannels {
    fn new(config: &PipelineConfig) -> Self {
        let depths = &config.channels;
        Self {
            command_in: Buffered::new("command_in", depths.get_command_depth()),
            position_in: Buffered::new("position_in", depths.get_position_depth()),
            memory_init_in: Buffered::new("memory_init_in", depths.get_memory_init_depth()),
            memory_request_queue: Buffered::new(
                "memory_request_queue",
                depths.get_memory_request_depth(),
            ),
            encoder_config: Direct::new("encoder_config"),
            inference_config: Direct::new("inference_config"),
            compositor_config: Direct::new("compositor_config"),
            encoder_input: Direct::new("encoder_input"),
            encoder_to_inference: Buffered::new(
                "encoder_to_inference",
                depths.get_encoder_to_inference_depth(),
            ),
            inference_output: Direct::new("inference_output"),
            compositor_input: Direct::new("compositor_input"),
            output_queue: Buffered::new("output_queue", depths.get_output_depth()),
        }
    }

    /// Discard every item and un-reset every channel. Returns the number of
    /// discarded items.
    fn assert_reset(&mut self) -> usize {
        let discarded = self.command_in.len()
            + self.position_in.len()
            + self.memory_init_in.len()
            + self.memory_request_queue.len()
            + self.encoder_config.len()
            + self.inference_config.len()
            + self.compositor_config.len()
            + self.encoder_input.len()
            + self.encoder_to_inference.len()
            + self.inference_output.len()
            + self.compositor_input.len()
            + self.output_queue.len();

        self.command_in.assert_reset();
        self.position_in.assert_reset();
        self.memory_init_in.assert_reset();
        self.memory_request_queue.assert_reset();
        self.encoder_config.assert_reset();
        self.inference_config.assert_reset();
        self.compositor_config.assert_reset();
        self.encoder_input.assert_reset();
        self.encoder_to_inference.assert_reset();
        self.inference_output.assert_reset();
        self.compositor_input.assert_reset();
        self.output_queue.assert_reset();
        discarded
    }

    fn reset_caller_side(&mut self) {
        self.command_in.reset_write();
        self.position_in.reset_write();
        self.memory_init_in.reset_write();
        self.output_queue.reset_read();
    }

    /// True when no channel between two pipeline loops holds an item.
    fn internal_empty(&self) -> bool {
        self.memory_request_queue.is_empty()
            && self.encoder_config.is_empty()
            && self.inference_config.is_empty()
            && self.compositor_config.is_empty()
            && self.encoder_input.is_empty()
            && self.encoder_to_inference.is_empty()
            && self.inference_output.is_empty()
            && self.compositor_input.is_empty()
    }
}

/// Counters accumulated since the pipeline was built. Resets do not clear
/// them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub ticks: u64,
    pub commands_executed: u64,
    pub commands_ignored: u64,
    pub memory_requests_forwarded: u64,
    pub requests_routed_to_encoder: u64,
    pub requests_routed_to_inference: u64,
    pub requests_dropped: u64,
    pub positions_forwarded: u64,
    pub samples_reshaped: u64,
    pub outputs_produced: u64,
    pub stalled_ticks: u64,
    pub resets: u64,
    pub stage_write_rejections: u64,
}

/// Builds a [`Pipeline`], optionally with caller-supplied stages.
///
/// Stages not supplied are built by [`StageFactory`] from the config.
pub struct PipelineBuilder {
    config: PipelineConfig,
    encoder: Option<EncoderStage>,
    inference: Option<InferenceStage>,
    compositor: Option<CompositorStage>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            encoder: None,
            inference: None,
            compositor: None,
        }
    }

    pub fn encoder(mut self, stage: EncoderStage) -> Self {
        self.encoder = Some(stage);
        self
    }

    pub fn inference(mut self, stage: InferenceStage) -> Self {
        self.inference = Some(stage);
        self
    }

    pub fn compositor(mut self, stage: CompositorStage) -> Self {
        self.compositor = Some(stage);
        self
    }

    /// Validate the config and wire every loop and channel.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        self.config.validate()?;

        let stages = &self.config.stages;
        let encoder = self
            .encoder
            .unwrap_or_else(|| StageFactory::create_encoder(&stages.encoder));
        let inference = self
            .inference
            .unwrap_or_else(|| StageFactory::create_inference(stages));
        let compositor = self
            .compositor
            .unwrap_or_else(|| StageFactory::create_compositor(&stages.compositor));

        let step_size = self.config.reshaper.step_size;
        PipelineBuilt {
            encoder: encoder.name(),
            inference: inference.name(),
            compositor: compositor.name(),
            step_size,
        }
        .log();

        Ok(Pipeline {
            tick: 0,
            resets: 0,
            caller_reset_pending: true,
            channels: PipelineChannels::new(&self.config),
            dispatcher: CommandDispatcher::new(),
            router: MemoryRouter::new(),
            encoder: StageAdapter::new(encoder),
            inference: StageAdapter::new(inference),
            reshaper: OutputReshaper::new(step_size),
            compositor: StageAdapter::new(compositor),
        })
    }
}

/// The whole dataflow pipeline as one step function.
///
/// Nothing moves until the first [`Pipeline::tick`] has run every loop's
/// reset phase. Until then (and for one tick after
/// [`Pipeline::assert_reset`]) the submit methods refuse with
/// [`PushError::NotReset`].
///
/// # Example
/// ```
/// use icarus_dataflow::config::PipelineConfig;
/// use icarus_dataflow::engine::Pipeline;
/// use icarus_dataflow::records::{Command, PositionSample};
///
/// let mut pipeline = Pipeline::new(PipelineConfig::default())?;
/// pipeline.tick();
///
/// pipeline.submit_position(PositionSample::new([1.0, 1.0, 1.0], true)).unwrap();
/// pipeline.submit_command(Command::read_pos(1)).unwrap();
///
/// let output = pipeline.run_until(100, |p| p.pop_output());
/// assert!(output.is_some());
/// # Ok::<(), icarus_dataflow::errors::ConfigError>(())
/// ```
pub struct Pipeline {
    tick: u64,
    resets: u64,
    caller_reset_pending: bool,
    channels: PipelineChannels,
    dispatcher: CommandDispatcher,
    router: MemoryRouter,
    encoder: StageAdapter<PositionSample, EncoderOutput>,
    inference: StageAdapter<EncoderOutput, InferenceOutput>,
    reshaper: OutputReshaper,
    compositor: StageAdapter<CompositorInput, CompositorOutput>,
}

impl Pipeline {
    /// Build a pipeline with the reference stages.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        PipelineBuilder::new(config).build()
    }

    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Advance every loop by one tick, upstream first.
    pub fn tick(&mut self) {
        let now = self.tick;
        let ch = &mut self.channels;

        self.dispatcher.step(
            now,
            &mut ch.command_in,
            &mut ch.memory_init_in,
            &mut ch.position_in,
            &mut ch.memory_request_queue,
            &mut ch.encoder_input,
        );
        self.router.step(
            now,
            &mut ch.memory_request_queue,
            &mut ch.encoder_config,
            &mut ch.inference_config,
        );
        self.encoder.step(
            now,
            &mut ch.encoder_config,
            &mut ch.encoder_input,
            &mut ch.encoder_to_inference,
        );
        self.inference.step(
            now,
            &mut ch.inference_config,
            &mut ch.encoder_to_inference,
            &mut ch.inference_output,
        );
        self.reshaper
            .step(now, &mut ch.inference_output, &mut ch.compositor_input);
        self.compositor.step(
            now,
            &mut ch.compositor_config,
            &mut ch.compositor_input,
            &mut ch.output_queue,
        );

        if self.caller_reset_pending {
            ch.reset_caller_side();
            self.caller_reset_pending = false;
        }
        self.tick += 1;
    }

    /// Tick until `check` returns something or `max_ticks` have elapsed.
    pub fn run_until<T, F>(&mut self, max_ticks: u64, mut check: F) -> Option<T>
    where
        F: FnMut(&mut Self) -> Option<T>,
    {
        for _ in 0..max_ticks {
            self.tick();
            if let Some(found) = check(self) {
                return Some(found);
            }
        }
        None
    }

    /// Global reset: every loop re-enters its reset phase and every channel
    /// and loop-held item is discarded, inbound queues included.
    pub fn assert_reset(&mut self) {
        let discarded = self.channels.assert_reset()
            + self.dispatcher.assert_reset()
            + self.router.assert_reset()
            + self.encoder.assert_reset()
            + self.inference.assert_reset()
            + self.reshaper.assert_reset()
            + self.compositor.assert_reset();
        self.caller_reset_pending = true;
        self.resets += 1;
        ResetAsserted {
            tick: self.tick,
            discarded_items: discarded,
        }
        .log();
    }

    pub fn submit_command(&mut self, command: Command) -> Result<(), PushError<Command>> {
        self.channels.command_in.push(command)
    }

    pub fn submit_memory_request(
        &mut self,
        request: MemoryRequest,
    ) -> Result<(), PushError<MemoryRequest>> {
        self.channels.memory_init_in.push(request)
    }

    pub fn submit_position(
        &mut self,
        sample: PositionSample,
    ) -> Result<(), PushError<PositionSample>> {
        self.channels.position_in.push(sample)
    }

    pub fn pop_output(&mut self) -> Option<CompositorOutput> {
        self.channels.output_queue.pop_nb()
    }

    /// True once the caller-side ports accept traffic.
    pub fn is_ready(&self) -> bool {
        !self.caller_reset_pending
    }

    /// True when ticking cannot change anything until the caller acts.
    ///
    /// Items waiting in `position_in` or `memory_init_in` without a command
    /// to move them do not count as work. Finished outputs waiting in
    /// `output_queue` do not either.
    pub fn is_idle(&self) -> bool {
        self.is_ready()
            && self.dispatcher.is_idle()
            && self.channels.command_in.is_empty()
            && self.downstream_idle()
    }

    /// True when the only outstanding work is a command waiting for source
    /// items the caller has not submitted yet, or when [`Pipeline::is_idle`].
    pub fn is_starved(&self) -> bool {
        if self.is_idle() {
            return true;
        }
        let source_empty = match self.dispatcher.awaiting_input() {
            Some(CommandMode::WeightInit) => self.channels.memory_init_in.is_empty(),
            Some(CommandMode::ReadPos) => self.channels.position_in.is_empty(),
            _ => false,
        };
        self.is_ready() && source_empty && self.downstream_idle()
    }

    fn downstream_idle(&self) -> bool {
        self.router.is_idle()
            && self.encoder.is_idle()
            && self.inference.is_idle()
            && self.reshaper.is_idle()
            && self.compositor.is_idle()
            && self.channels.internal_empty()
    }

    pub fn channels(&self) -> &PipelineChannels {
        &self.channels
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            ticks: self.tick,
            commands_executed: self.dispatcher.commands_executed(),
            commands_ignored: self.dispatcher.commands_ignored(),
            memory_requests_forwarded: self.dispatcher.requests_forwarded(),
            requests_routed_to_encoder: self.router.routed(MemoryTarget::Encoder),
            requests_routed_to_inference: self.router.routed(MemoryTarget::Inference),
            requests_dropped: self.router.dropped(),
            positions_forwarded: self.dispatcher.positions_forwarded(),
            samples_reshaped: self.reshaper.reshaped(),
            outputs_produced: self.channels.output_queue.transfers(),
            stalled_ticks: self.dispatcher.stalled_ticks(),
            resets: self.resets,
            stage_write_rejections: self.encoder.rejected_writes()
                + self.inference.rejected_writes()
                + self.compositor.rejected_writes(),
        }
    }
}

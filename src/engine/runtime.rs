// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::RuntimeConfig;
use crate::engine::{Pipeline, PipelineStats};
use crate::errors::{PushError, RuntimeError};
use crate::observability::messages::pipeline::{RuntimeStarted, RuntimeStopped};
use crate::observability::messages::StructuredLog;
use crate::records::{Command, CompositorOutput, MemoryRequest, PositionSample};

/// Runs a [`Pipeline`] on a tokio task.
///
/// The driver task owns the pipeline outright. The caller talks to it only
/// through bounded async ports, so awaiting a send is the backpressure
/// signal:
///
/// * inbound (push-only): commands, memory requests, position samples
/// * outbound (pull-only): compositor outputs
///
/// The driver ticks while the pipeline has work, optionally paced to
/// `tick_period_us`, and parks on its ports when the pipeline is starved or
/// idle. When the outbound port is full the driver stops the clock until the
/// caller takes an output.
pub struct PipelineRuntime;

impl PipelineRuntime {
    /// Move `pipeline` onto a new task. Must be called inside a tokio runtime.
    pub fn spawn(pipeline: Pipeline, config: &RuntimeConfig) -> PipelineHandle {
        let capacity = config.port_capacity.max(1);
        let (command_tx, command_rx) = mpsc::channel(capacity);
        let (memory_tx, memory_rx) = mpsc::channel(capacity);
        let (position_tx, position_rx) = mpsc::channel(capacity);
        let (output_tx, output_rx) = mpsc::channel(capacity);
        let (reset_tx, reset_rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let started = RuntimeStarted {
            port_capacity: capacity,
            tick_period_us: config.tick_period_us,
        };
        started.log();

        let driver = Driver {
            pipeline,
            commands: Port::new(command_rx),
            memory_requests: Port::new(memory_rx),
            positions: Port::new(position_rx),
            resets: reset_rx,
            outputs: output_tx,
            held_output: None,
            pacer: config
                .tick_period_us
                .filter(|period| *period > 0)
                .map(|period| {
                    let mut pacer = interval(Duration::from_micros(period));
                    pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    pacer
                }),
            cancel: cancel.clone(),
        };

        PipelineHandle {
            sender: PipelineSender {
                commands: command_tx,
                memory_requests: memory_tx,
                positions: position_tx,
                resets: reset_tx,
            },
            outputs: output_rx,
            cancel,
            task: tokio::spawn(driver.run().instrument(started.span("driver"))),
        }
    }
}

/// Cloneable inbound side of a running pipeline.
///
/// Lets a producer task feed the pipeline while the [`PipelineHandle`]
/// owner reads outputs.
#[derive(Clone)]
pub struct PipelineSender {
    commands: mpsc::Sender<Command>,
    memory_requests: mpsc::Sender<MemoryRequest>,
    positions: mpsc::Sender<PositionSample>,
    resets: mpsc::Sender<()>,
}

impl PipelineSender {
    pub async fn send_command(&self, command: Command) -> Result<(), RuntimeError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| RuntimeError::PortClosed { port: "command" })
    }

    pub async fn send_memory_request(&self, request: MemoryRequest) -> Result<(), RuntimeError> {
        self.memory_requests
            .send(request)
            .await
            .map_err(|_| RuntimeError::PortClosed {
                port: "memory_request",
            })
    }

    pub async fn send_position(&self, sample: PositionSample) -> Result<(), RuntimeError> {
        self.positions
            .send(sample)
            .await
            .map_err(|_| RuntimeError::PortClosed { port: "position" })
    }

    /// Assert the global reset. Items already sent but not yet taken by the
    /// driver may land before or after the reset. Items the driver had taken
    /// but not yet handed over are discarded with the pipeline's state.
    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.resets
            .send(())
            .await
            .map_err(|_| RuntimeError::PortClosed { port: "reset" })
    }
}

/// Caller side of a running pipeline.
pub struct PipelineHandle {
    sender: PipelineSender,
    outputs: mpsc::Receiver<CompositorOutput>,
    cancel: CancellationToken,
    task: JoinHandle<PipelineStats>,
}

impl PipelineHandle {
    pub fn sender(&self) -> PipelineSender {
        self.sender.clone()
    }

    pub async fn send_command(&self, command: Command) -> Result<(), RuntimeError> {
        self.sender.send_command(command).await
    }

    pub async fn send_memory_request(&self, request: MemoryRequest) -> Result<(), RuntimeError> {
        self.sender.send_memory_request(request).await
    }

    pub async fn send_position(&self, sample: PositionSample) -> Result<(), RuntimeError> {
        self.sender.send_position(sample).await
    }

    pub async fn reset(&self) -> Result<(), RuntimeError> {
        self.sender.reset().await
    }

    /// Next compositor output. `None` once the driver has stopped and every
    /// delivered output has been taken.
    pub async fn recv_output(&mut self) -> Option<CompositorOutput> {
        self.outputs.recv().await
    }

    /// Stop the driver at a tick boundary and return its final counters.
    pub async fn shutdown(self) -> Result<PipelineStats, RuntimeError> {
        self.cancel.cancel();
        Ok(self.task.await?)
    }
}

/// Inbound port plus the one item the pipeline refused last time.
struct Port<T> {
    rx: mpsc::Receiver<T>,
    held: Option<T>,
    open: bool,
}

impl<T> Port<T> {
    fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            rx,
            held: None,
            open: true,
        }
    }

    /// Move items into the pipeline until it refuses one or the port is
    /// empty.
    fn pump(&mut self, mut submit: impl FnMut(T) -> Result<(), PushError<T>>) {
        loop {
            let item = match self.held.take() {
                Some(item) => item,
                None => match self.rx.try_recv() {
                    Ok(item) => item,
                    Err(mpsc::error::TryRecvError::Empty) => return,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.open = false;
                        return;
                    }
                },
            };
            if let Err(refused) = submit(item) {
                self.held = Some(refused.into_inner());
                return;
            }
        }
    }

    /// Whether a parked driver should wait on this port.
    fn listening(&self) -> bool {
        self.open && self.held.is_none()
    }

    /// Drop the refused item, if any. Returns the number discarded.
    fn clear(&mut self) -> usize {
        usize::from(self.held.take().is_some())
    }

    fn accept(&mut self, item: Option<T>) {
        match item {
            Some(item) => self.held = Some(item),
            None => self.open = false,
        }
    }
}

struct Driver {
    pipeline: Pipeline,
    commands: Port<Command>,
    memory_requests: Port<MemoryRequest>,
    positions: Port<PositionSample>,
    resets: mpsc::Receiver<()>,
    outputs: mpsc::Sender<CompositorOutput>,
    held_output: Option<CompositorOutput>,
    pacer: Option<Interval>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self) -> PipelineStats {
        let started = Instant::now();

        while !self.cancel.is_cancelled() {
            while let Ok(()) = self.resets.try_recv() {
                self.assert_reset();
            }

            self.pump_inbound();
            if !self.pump_outbound() {
                self.wait_for_output_room().await;
                continue;
            }

            if self.pipeline.is_starved() {
                if !self.any_port_open() {
                    break;
                }
                self.park().await;
                continue;
            }

            if let Some(pacer) = self.pacer.as_mut() {
                pacer.tick().await;
            } else {
                tokio::task::yield_now().await;
            }
            self.pipeline.tick();
        }

        let stats = self.pipeline.stats();
        RuntimeStopped {
            ticks: stats.ticks,
            outputs_produced: stats.outputs_produced,
            duration: started.elapsed(),
        }
        .log();
        stats
    }

    /// Reset the pipeline along with everything the driver staged between
    /// the ports and the pipeline.
    fn assert_reset(&mut self) -> usize {
        self.pipeline.assert_reset();
        usize::from(self.held_output.take().is_some())
            + self.commands.clear()
            + self.memory_requests.clear()
            + self.positions.clear()
    }

    fn pump_inbound(&mut self) {
        let pipeline = &mut self.pipeline;
        self.commands.pump(|c| pipeline.submit_command(c));
        self.memory_requests
            .pump(|r| pipeline.submit_memory_request(r));
        self.positions.pump(|s| pipeline.submit_position(s));
    }

    /// Hand finished outputs to the caller. Returns `false` when the
    /// outbound port is full and an output is being held.
    fn pump_outbound(&mut self) -> bool {
        loop {
            let Some(output) = self.held_output.take().or_else(|| self.pipeline.pop_output())
            else {
                return true;
            };
            match self.outputs.try_send(output) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(output)) => {
                    self.held_output = Some(output);
                    return false;
                }
                // Nobody is listening any more; outputs are discarded.
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }

    async fn wait_for_output_room(&mut self) {
        let reset = tokio::select! {
            _ = self.cancel.cancelled() => false,
            Some(()) = self.resets.recv() => true,
            permit = self.outputs.reserve() => {
                if let (Ok(permit), Some(output)) = (permit, self.held_output.take()) {
                    permit.send(output);
                }
                false
            }
        };
        if reset {
            self.assert_reset();
        }
    }

    fn any_port_open(&self) -> bool {
        self.commands.open || self.memory_requests.open || self.positions.open
    }

    /// Sleep until the caller sends something, resets, or cancels.
    async fn park(&mut self) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            Some(()) = self.resets.recv() => {
                self.assert_reset();
            }
            item = self.commands.rx.recv(), if self.commands.listening() => {
                self.commands.accept(item)
            }
            item = self.memory_requests.rx.recv(), if self.memory_requests.listening() => {
                self.memory_requests.accept(item)
            }
            item = self.positions.rx.recv(), if self.positions.listening() => {
                self.positions.accept(item)
            }
        }
    }
}

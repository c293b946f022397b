// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for pipeline construction, reset, and runtime lifecycle.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Pipeline assembled and waiting for its first reset phase.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use icarus_dataflow::observability::messages::pipeline::PipelineBuilt;
///
/// let msg = PipelineBuilt {
///     encoder: "position_encoder",
///     inference: "dense_inference",
///     compositor: "volume_compositor",
///     step_size: 0.1,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineBuilt<'a> {
    pub encoder: &'a str,
    pub inference: &'a str,
    pub compositor: &'a str,
    pub step_size: f32,
}

impl Display for PipelineBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline built: {} -> {} -> {} (step_size={})",
            self.encoder, self.inference, self.compositor, self.step_size
        )
    }
}

impl StructuredLog for PipelineBuilt<'_> {
    fn log(&self) {
        tracing::info!(
            encoder = self.encoder,
            inference = self.inference,
            compositor = self.compositor,
            step_size = self.step_size,
            "{}", self
        );
    }
}

/// Global reset asserted; every loop re-enters its reset phase.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ResetAsserted {
    pub tick: u64,
    pub discarded_items: usize,
}

impl Display for ResetAsserted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reset asserted at tick {}: discarded {} in-flight items",
            self.tick, self.discarded_items
        )
    }
}

impl StructuredLog for ResetAsserted {
    fn log(&self) {
        tracing::info!(
            tick = self.tick,
            discarded_items = self.discarded_items,
            "{}", self
        );
    }
}

/// A control loop finished its reset phase.
///
/// # Log Level
/// `debug!` - Per-loop detail
pub struct LoopReset<'a> {
    pub loop_name: &'a str,
    pub tick: u64,
}

impl Display for LoopReset<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loop '{}' reset at tick {}", self.loop_name, self.tick)
    }
}

impl StructuredLog for LoopReset<'_> {
    fn log(&self) {
        tracing::debug!(loop_name = self.loop_name, tick = self.tick, "{}", self);
    }
}

/// Async driver task started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RuntimeStarted {
    pub port_capacity: usize,
    pub tick_period_us: Option<u64>,
}

impl Display for RuntimeStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.tick_period_us {
            Some(period) => write!(
                f,
                "Pipeline runtime started: port_capacity={}, tick_period={}us",
                self.port_capacity, period
            ),
            None => write!(
                f,
                "Pipeline runtime started: port_capacity={}, free-running clock",
                self.port_capacity
            ),
        }
    }
}

impl RuntimeStarted {
    /// Span the driver task runs inside.
    pub fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "runtime",
            span_name = name,
            port_capacity = self.port_capacity,
            tick_period_us = ?self.tick_period_us,
        )
    }
}

impl StructuredLog for RuntimeStarted {
    fn log(&self) {
        tracing::info!(
            port_capacity = self.port_capacity,
            tick_period_us = ?self.tick_period_us,
            "{}", self
        );
    }
}

/// Async driver task stopped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RuntimeStopped {
    pub ticks: u64,
    pub outputs_produced: u64,
    pub duration: std::time::Duration,
}

impl Display for RuntimeStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline runtime stopped after {} ticks: {} outputs in {:?}",
            self.ticks, self.outputs_produced, self.duration
        )
    }
}

impl StructuredLog for RuntimeStopped {
    fn log(&self) {
        tracing::info!(
            ticks = self.ticks,
            outputs_produced = self.outputs_produced,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

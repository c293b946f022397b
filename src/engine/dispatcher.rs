// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::channels::BlockingPush;
use crate::engine::LoopPhase;
use crate::observability::messages::dispatcher::{
    CommandAccepted, CommandCompleted, CommandIgnored,
};
use crate::observability::messages::pipeline::LoopReset;
use crate::observability::messages::StructuredLog;
use crate::records::{Command, CommandMode, MemoryRequest, PositionSample};
use crate::traits::Channel;
use tracing::Span;

const NAME: &str = "command_dispatcher";

/// Bulk transfer currently being executed.
#[derive(Debug, Clone, Copy)]
struct ActiveCommand {
    mode: CommandMode,
    count: u32,
    remaining: u32,
    started_at: u64,
}

/// Interprets commands and moves the items they ask for.
///
/// Per steady tick the dispatcher does one of: finish a pending push, accept
/// a new command, or move one item for the active command. `WEIGHT_INIT`
/// moves memory requests to the router queue; `READ_POS` moves position
/// samples to the encoder. The two never touch each other's source.
/// Reserved modes are ignored.
///
/// A command whose items never arrive keeps the dispatcher waiting on it.
/// Those ticks are counted as stalled.
pub struct CommandDispatcher {
    phase: LoopPhase,
    active: Option<ActiveCommand>,
    transfer_span: Option<Span>,
    pending_request: BlockingPush<MemoryRequest>,
    pending_position: BlockingPush<PositionSample>,
    commands_executed: u64,
    commands_ignored: u64,
    requests_forwarded: u64,
    positions_forwarded: u64,
    stalled_ticks: u64,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self {
            phase: LoopPhase::Resetting,
            active: None,
            transfer_span: None,
            pending_request: BlockingPush::new(),
            pending_position: BlockingPush::new(),
            commands_executed: 0,
            commands_ignored: 0,
            requests_forwarded: 0,
            positions_forwarded: 0,
            stalled_ticks: 0,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Mode of the command in progress, if any.
    pub fn active_mode(&self) -> Option<CommandMode> {
        self.active.map(|active| active.mode)
    }

    /// Mode of the command in progress when the dispatcher is waiting for its
    /// next source item rather than for a downstream push.
    pub fn awaiting_input(&self) -> Option<CommandMode> {
        if self.has_pending_push() {
            return None;
        }
        self.active
            .filter(|active| active.remaining > 0)
            .map(|active| active.mode)
    }

    /// True when the dispatcher holds no work of its own.
    pub fn is_idle(&self) -> bool {
        self.phase == LoopPhase::Steady && self.active.is_none() && !self.has_pending_push()
    }

    pub fn commands_executed(&self) -> u64 {
        self.commands_executed
    }

    pub fn commands_ignored(&self) -> u64 {
        self.commands_ignored
    }

    pub fn requests_forwarded(&self) -> u64 {
        self.requests_forwarded
    }

    pub fn positions_forwarded(&self) -> u64 {
        self.positions_forwarded
    }

    pub fn stalled_ticks(&self) -> u64 {
        self.stalled_ticks
    }

    /// Abandon the active command and any pending push, then re-enter the
    /// reset phase. Returns the number of discarded items.
    pub fn assert_reset(&mut self) -> usize {
        let discarded = usize::from(self.pending_request.clear().is_some())
            + usize::from(self.pending_position.clear().is_some());
        self.active = None;
        self.transfer_span = None;
        self.phase = LoopPhase::Resetting;
        discarded
    }

    pub fn step<Cmd, Init, Pos, Req, Enc>(
        &mut self,
        tick: u64,
        commands: &mut Cmd,
        memory_init: &mut Init,
        positions: &mut Pos,
        memory_requests: &mut Req,
        encoder_input: &mut Enc,
    ) where
        Cmd: Channel<Command>,
        Init: Channel<MemoryRequest>,
        Pos: Channel<PositionSample>,
        Req: Channel<MemoryRequest>,
        Enc: Channel<PositionSample>,
    {
        if self.phase == LoopPhase::Resetting {
            commands.reset_read();
            memory_init.reset_read();
            positions.reset_read();
            memory_requests.reset_write();
            encoder_input.reset_write();
            self.phase = LoopPhase::Steady;
            LoopReset {
                loop_name: NAME,
                tick,
            }
            .log();
            return;
        }

        let span = self.transfer_span.clone().unwrap_or_else(Span::none);
        let _entered = span.enter();

        if self.has_pending_push() {
            if self.retry_pending(memory_requests, encoder_input) {
                self.finish_if_done(tick);
            } else {
                self.stalled_ticks += 1;
            }
            return;
        }

        let Some(mode) = self.active_mode() else {
            if let Some(command) = commands.pop_nb() {
                self.accept(command, tick);
            }
            return;
        };

        let moved = match mode {
            CommandMode::WeightInit => memory_init.pop_nb().map(|request| {
                if self.pending_request.push(memory_requests, request) {
                    self.requests_forwarded += 1;
                }
            }),
            CommandMode::ReadPos => positions.pop_nb().map(|sample| {
                if self.pending_position.push(encoder_input, sample) {
                    self.positions_forwarded += 1;
                }
            }),
            CommandMode::Reserved(_) => None,
        };

        match moved {
            Some(()) => {
                if let Some(active) = self.active.as_mut() {
                    active.remaining -= 1;
                }
                self.finish_if_done(tick);
            }
            None => self.stalled_ticks += 1,
        }
    }

    fn has_pending_push(&self) -> bool {
        self.pending_request.is_pending() || self.pending_position.is_pending()
    }

    fn retry_pending<Req, Enc>(&mut self, memory_requests: &mut Req, encoder_input: &mut Enc) -> bool
    where
        Req: Channel<MemoryRequest>,
        Enc: Channel<PositionSample>,
    {
        if self.pending_request.is_pending() {
            if !self.pending_request.retry(memory_requests) {
                return false;
            }
            self.requests_forwarded += 1;
        }
        if self.pending_position.is_pending() {
            if !self.pending_position.retry(encoder_input) {
                return false;
            }
            self.positions_forwarded += 1;
        }
        true
    }

    fn accept(&mut self, command: Command, tick: u64) {
        if let CommandMode::Reserved(code) = command.mode {
            self.commands_ignored += 1;
            CommandIgnored {
                code,
                count: command.count,
            }
            .log();
            return;
        }

        let accepted = CommandAccepted {
            mode: command.mode.as_str(),
            count: command.count,
            tick,
        };
        let span = accepted.span("transfer");
        span.in_scope(|| accepted.log());
        self.transfer_span = Some(span);
        self.active = Some(ActiveCommand {
            mode: command.mode,
            count: command.count,
            remaining: command.count,
            started_at: tick,
        });
        self.finish_if_done(tick);
    }

    /// Retire the active command once every item has been delivered.
    fn finish_if_done(&mut self, tick: u64) {
        let Some(active) = self.active else {
            return;
        };
        if active.remaining > 0 || self.has_pending_push() {
            return;
        }
        self.active = None;
        self.commands_executed += 1;
        let completed = CommandCompleted {
            mode: active.mode.as_str(),
            count: active.count,
            ticks_taken: tick - active.started_at,
        };
        match self.transfer_span.take() {
            Some(span) => span.in_scope(|| completed.log()),
            None => completed.log(),
        }
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::{Buffered, Direct};

    struct Ports {
        commands: Buffered<Command>,
        memory_init: Buffered<MemoryRequest>,
        positions: Buffered<PositionSample>,
        memory_requests: Buffered<MemoryRequest>,
        encoder_input: Direct<PositionSample>,
    }

    impl Ports {
        fn new() -> Self {
            let mut ports = Self {
                commands: Buffered::new("commands", 2),
                memory_init: Buffered::new("memory_init", 8),
                positions: Buffered::new("positions", 8),
                memory_requests: Buffered::new("memory_requests", 2),
                encoder_input: Direct::new("encoder_input"),
            };
            ports.commands.reset_write();
            ports.memory_init.reset_write();
            ports.positions.reset_write();
            ports.memory_requests.reset_read();
            ports.encoder_input.reset_read();
            ports
        }

        fn step(&mut self, dispatcher: &mut CommandDispatcher, tick: u64) {
            dispatcher.step(
                tick,
                &mut self.commands,
                &mut self.memory_init,
                &mut self.positions,
                &mut self.memory_requests,
                &mut self.encoder_input,
            );
        }
    }

    fn sample(i: u32, last: bool) -> PositionSample {
        let v = i as f32;
        PositionSample::new([v, v, v], last)
    }

    fn ready() -> (CommandDispatcher, Ports) {
        let mut dispatcher = CommandDispatcher::new();
        let mut ports = Ports::new();
        ports.step(&mut dispatcher, 0);
        assert_eq!(dispatcher.phase(), LoopPhase::Steady);
        (dispatcher, ports)
    }

    #[test]
    fn test_read_pos_moves_exactly_count_in_order() {
        let (mut dispatcher, mut ports) = ready();
        for i in 0..4 {
            ports.positions.push(sample(i, i == 3)).unwrap();
        }
        ports.commands.push(Command::read_pos(3)).unwrap();

        let mut delivered = Vec::new();
        for tick in 1..10 {
            ports.step(&mut dispatcher, tick);
            delivered.extend(ports.encoder_input.pop_nb());
        }

        assert_eq!(delivered, vec![sample(0, false), sample(1, false), sample(2, false)]);
        assert_eq!(ports.positions.len(), 1);
        assert_eq!(dispatcher.positions_forwarded(), 3);
        assert_eq!(dispatcher.commands_executed(), 1);
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn test_weight_init_does_not_fall_through() {
        let (mut dispatcher, mut ports) = ready();
        ports.memory_init.push(MemoryRequest::encoder(0, 0, 1.0)).unwrap();
        ports.positions.push(sample(0, true)).unwrap();
        ports.commands.push(Command::weight_init(1)).unwrap();

        for tick in 1..6 {
            ports.step(&mut dispatcher, tick);
        }

        assert_eq!(ports.memory_requests.len(), 1);
        assert_eq!(ports.positions.len(), 1);
        assert!(ports.encoder_input.is_empty());
        assert_eq!(dispatcher.requests_forwarded(), 1);
        assert_eq!(dispatcher.positions_forwarded(), 0);
    }

    #[test]
    fn test_reserved_mode_is_ignored() {
        let (mut dispatcher, mut ports) = ready();
        ports.positions.push(sample(0, true)).unwrap();
        ports
            .commands
            .push(Command {
                mode: CommandMode::Reserved(7),
                count: 1,
            })
            .unwrap();

        ports.step(&mut dispatcher, 1);
        ports.step(&mut dispatcher, 2);

        assert_eq!(dispatcher.commands_ignored(), 1);
        assert_eq!(dispatcher.commands_executed(), 0);
        assert_eq!(ports.positions.len(), 1);
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn test_missing_items_stall_the_command() {
        let (mut dispatcher, mut ports) = ready();
        ports.commands.push(Command::read_pos(2)).unwrap();
        ports.positions.push(sample(0, false)).unwrap();

        for tick in 1..6 {
            ports.step(&mut dispatcher, tick);
            ports.encoder_input.pop_nb();
        }
        assert_eq!(dispatcher.active_mode(), Some(CommandMode::ReadPos));
        assert_eq!(dispatcher.awaiting_input(), Some(CommandMode::ReadPos));
        assert!(dispatcher.stalled_ticks() > 0);

        // A second command waits behind the first.
        ports.commands.push(Command::weight_init(0)).unwrap();
        ports.step(&mut dispatcher, 6);
        assert_eq!(ports.commands.len(), 1);

        ports.positions.push(sample(1, true)).unwrap();
        ports.step(&mut dispatcher, 7);
        assert_eq!(dispatcher.active_mode(), None);
        assert_eq!(dispatcher.commands_executed(), 1);
    }

    #[test]
    fn test_blocked_push_is_retried_without_new_pops() {
        let (mut dispatcher, mut ports) = ready();
        ports.commands.push(Command::read_pos(2)).unwrap();
        ports.positions.push(sample(0, false)).unwrap();
        ports.positions.push(sample(1, true)).unwrap();

        // Nobody drains the encoder input: the second sample stays held.
        for tick in 1..6 {
            ports.step(&mut dispatcher, tick);
        }
        assert_eq!(ports.encoder_input.len(), 1);
        assert!(ports.positions.is_empty());
        assert_eq!(dispatcher.positions_forwarded(), 1);
        assert_eq!(dispatcher.awaiting_input(), None);

        assert_eq!(ports.encoder_input.pop_nb(), Some(sample(0, false)));
        ports.step(&mut dispatcher, 6);
        assert_eq!(ports.encoder_input.pop_nb(), Some(sample(1, true)));
        assert_eq!(dispatcher.commands_executed(), 1);
    }

    #[test]
    fn test_zero_count_completes_immediately() {
        let (mut dispatcher, mut ports) = ready();
        ports.commands.push(Command::weight_init(0)).unwrap();
        ports.step(&mut dispatcher, 1);
        assert_eq!(dispatcher.commands_executed(), 1);
        assert!(dispatcher.is_idle());
    }

    #[test]
    fn test_assert_reset_drops_active_command() {
        let (mut dispatcher, mut ports) = ready();
        ports.commands.push(Command::read_pos(2)).unwrap();
        ports.positions.push(sample(0, false)).unwrap();
        ports.positions.push(sample(1, false)).unwrap();
        for tick in 1..4 {
            ports.step(&mut dispatcher, tick);
        }

        assert_eq!(dispatcher.assert_reset(), 1);
        assert_eq!(dispatcher.active_mode(), None);
        assert_eq!(dispatcher.phase(), LoopPhase::Resetting);
    }

    #[test]
    fn test_transfer_span_lives_while_command_is_active() {
        let (mut dispatcher, mut ports) = ready();
        ports.commands.push(Command::read_pos(2)).unwrap();
        ports.positions.push(sample(0, false)).unwrap();

        ports.step(&mut dispatcher, 1);
        assert!(dispatcher.transfer_span.is_some());
        ports.step(&mut dispatcher, 2);
        ports.encoder_input.pop_nb();
        assert!(dispatcher.transfer_span.is_some());

        ports.positions.push(sample(1, true)).unwrap();
        ports.step(&mut dispatcher, 3);
        assert_eq!(dispatcher.commands_executed(), 1);
        assert!(dispatcher.transfer_span.is_none());

        ports.commands.push(Command::read_pos(1)).unwrap();
        ports.encoder_input.pop_nb();
        ports.step(&mut dispatcher, 4);
        assert!(dispatcher.transfer_span.is_some());
        dispatcher.assert_reset();
        assert!(dispatcher.transfer_span.is_none());
    }
}

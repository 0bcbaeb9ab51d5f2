//! Game controller.
//!
//! Owns the roster, the clock, the active position set and the swap queue,
//! and is the only place they are mutated. Every command returns an
//! [`Outcome`]; a rejected command leaves the game untouched. Hosts learn
//! about changes by draining [`GameEvent`]s after each command and decide
//! for themselves when to persist.

use super::assignment::{self, ActivePositions};
use super::clock::{Clock, ClockAdvance};
use super::swap_queue::{ApplyReport, SwapId, SwapQueue};
use crate::config::{EngineConfig, FieldPreset};
use crate::error::{Outcome, Rejected};
use crate::models::{PlayerId, Position, Roster};
use crate::save::current_timestamp;

/// Change notification emitted by a command or a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    ClockStarted,
    ClockPaused,
    ClockReset,
    DurationChanged { seconds: u32 },
    /// Seconds credited to every player's counters.
    TimeAdvanced { seconds: u32 },
    GameEnded,
    CountersReset,
    PlayerAdded(PlayerId),
    PlayerRemoved(PlayerId),
    PlayerUpdated(PlayerId),
    RosterReordered,
    /// Players whose position changed.
    LineupChanged { moved: Vec<PlayerId> },
    SwapQueued { swap: SwapId, player: PlayerId, target: Position },
    SwapCancelled(PlayerId),
    QueueApplied { placed: usize, skipped: usize },
    QueueCleared { dropped: usize },
    ActivePositionsChanged,
    Suspended,
    Resumed { caught_up: u32 },
}

impl GameEvent {
    /// Everything except plain clock progress.
    pub fn is_structural(&self) -> bool {
        !matches!(self, GameEvent::TimeAdvanced { .. })
    }
}

/// Where an [`GameController::assign_or_queue`] request went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Assigned { displaced: Vec<PlayerId> },
    Queued(SwapId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionToggle {
    Add,
    Remove,
}

/// Pending catch-up recorded when the host stopped scheduling ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suspension {
    pub at_ms: u64,
    /// Only a clock that was running when suspended is owed the gap.
    pub clock_running: bool,
}

#[derive(Debug, Clone)]
pub struct GameController {
    pub(crate) config: EngineConfig,
    pub(crate) roster: Roster,
    pub(crate) clock: Clock,
    pub(crate) active: ActivePositions,
    pub(crate) queue: SwapQueue,
    pub(crate) suspension: Option<Suspension>,
    events: Vec<GameEvent>,
}

impl Default for GameController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl GameController {
    pub fn new(config: EngineConfig) -> Self {
        let active = config.field_preset.positions().iter().copied().collect();
        Self {
            clock: Clock::new(config.duration_secs),
            roster: Roster::new(),
            active,
            queue: SwapQueue::new(),
            suspension: None,
            events: Vec::new(),
            config,
        }
    }

    /// Assemble a controller from restored parts. Callers are expected to
    /// have repaired invariants already.
    pub(crate) fn from_parts(
        config: EngineConfig,
        roster: Roster,
        clock: Clock,
        active: ActivePositions,
        queue: SwapQueue,
        suspension: Option<Suspension>,
    ) -> Self {
        let controller = Self { config, roster, clock, active, queue, suspension, events: Vec::new() };
        controller.check_contracts();
        controller
    }

    // ========================
    // Read access
    // ========================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn active_positions(&self) -> &ActivePositions {
        &self.active
    }

    pub fn queue(&self) -> &SwapQueue {
        &self.queue
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn suspension(&self) -> Option<Suspension> {
        self.suspension
    }

    pub fn suspended_at_ms(&self) -> Option<u64> {
        self.suspension.map(|s| s.at_ms)
    }

    /// Take the events emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================
    // Roster
    // ========================

    pub fn add_player(
        &mut self,
        first_name: &str,
        last_name: Option<&str>,
        number: Option<u8>,
    ) -> Outcome<PlayerId> {
        let id = self.roster.add_player(first_name, last_name, number)?;
        log::debug!("player {id} added");
        self.events.push(GameEvent::PlayerAdded(id));
        Ok(id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Outcome {
        self.roster.remove_player(id)?;
        if self.queue.remove_player(id) {
            log::debug!("dropped queued swap for removed player {id}");
        }
        self.events.push(GameEvent::PlayerRemoved(id));
        Ok(())
    }

    pub fn rename_player(&mut self, id: PlayerId, first_name: &str, last_name: Option<&str>) -> Outcome {
        self.roster.rename_player(id, first_name, last_name)?;
        self.events.push(GameEvent::PlayerUpdated(id));
        Ok(())
    }

    pub fn set_player_number(&mut self, id: PlayerId, number: Option<u8>) -> Outcome {
        self.roster.set_number(id, number)?;
        self.events.push(GameEvent::PlayerUpdated(id));
        Ok(())
    }

    pub fn reorder_player(&mut self, from: usize, to: usize) -> Outcome {
        self.roster.reorder(from, to)?;
        self.events.push(GameEvent::RosterReordered);
        Ok(())
    }

    // ========================
    // Clock
    // ========================

    pub fn start_game(&mut self) {
        if self.clock.start() {
            log::info!("game clock started at {}", self.clock.display());
            self.events.push(GameEvent::ClockStarted);
        }
    }

    pub fn pause_game(&mut self) {
        if self.clock.pause() {
            log::info!("game clock paused at {}", self.clock.display());
            self.events.push(GameEvent::ClockPaused);
        }
    }

    pub fn set_duration(&mut self, seconds: u32) {
        self.clock.set_duration(seconds);
        self.config.duration_secs = seconds;
        self.events.push(GameEvent::DurationChanged { seconds });
    }

    /// One elapsed second from the tick source.
    pub fn tick(&mut self) -> Option<ClockAdvance> {
        let advance = self.clock.tick()?;
        self.accrue(advance);
        Some(advance)
    }

    /// Bench everyone, zero counters, drop queued swaps, reload the clock.
    pub fn reset_game(&mut self) {
        self.clock.reset();
        self.roster.reset_counters();
        self.roster.bench_all(self.config.history_limit);
        let dropped = self.queue.clear();
        log::info!("game reset ({dropped} queued swaps dropped)");
        self.events.extend([
            GameEvent::ClockReset,
            GameEvent::CountersReset,
            GameEvent::QueueCleared { dropped },
            GameEvent::LineupChanged { moved: self.roster.players().iter().map(|p| p.id).collect() },
        ]);
        self.check_contracts();
    }

    /// Zero counters and reload the clock; the lineup stays as it is.
    pub fn reset_clock_only(&mut self) {
        self.clock.reset();
        self.roster.reset_counters();
        log::info!("clock and counters reset");
        self.events.extend([GameEvent::ClockReset, GameEvent::CountersReset]);
    }

    // ========================
    // Lineup
    // ========================

    /// Immediate assignment when the clock is stopped, a queued swap while
    /// it runs.
    pub fn assign_or_queue(&mut self, player: PlayerId, position: Position) -> Outcome<Routed> {
        let routed = if self.clock.is_running() {
            let swap = self.queue.enqueue(&self.roster, &self.active, player, position)?;
            log::debug!("queued {player} -> {position}");
            self.events.push(GameEvent::SwapQueued { swap, player, target: position });
            Routed::Queued(swap)
        } else {
            let displaced =
                assignment::assign(&mut self.roster, &self.active, player, position, self.config.history_limit)?;
            log::debug!("assigned {player} -> {position}, displaced {}", displaced.len());
            let mut moved = displaced.clone();
            moved.push(player);
            self.events.push(GameEvent::LineupChanged { moved });
            Routed::Assigned { displaced }
        };
        self.check_contracts();
        Ok(routed)
    }

    /// Commit every queued swap. Only while the clock runs.
    pub fn apply_queue(&mut self) -> Outcome<ApplyReport> {
        if !self.clock.is_running() {
            return Err(Rejected::GameNotRunning);
        }
        let report = self.queue.apply_all(&mut self.roster, &self.active, self.config.history_limit)?;
        log::info!(
            "applied swap queue: {} placed, {} displaced, {} skipped",
            report.placed.len(),
            report.displaced.len(),
            report.skipped.len()
        );
        let mut moved = report.placed.clone();
        moved.extend(report.displaced.iter().copied());
        self.events.extend([
            GameEvent::QueueApplied { placed: report.placed.len(), skipped: report.skipped.len() },
            GameEvent::LineupChanged { moved },
        ]);
        self.check_contracts();
        Ok(report)
    }

    pub fn clear_queue(&mut self) -> usize {
        let dropped = self.queue.clear();
        if dropped > 0 {
            self.events.push(GameEvent::QueueCleared { dropped });
        }
        dropped
    }

    /// Withdraw a single player's queued swap.
    pub fn cancel_queued(&mut self, player: PlayerId) -> Outcome {
        if !self.queue.remove_player(player) {
            return Err(if self.roster.contains(player) {
                Rejected::QueueEmpty
            } else {
                Rejected::NoSuchPlayer(player)
            });
        }
        self.events.push(GameEvent::SwapCancelled(player));
        Ok(())
    }

    /// Enable or disable a field position.
    ///
    /// Disabling benches the current occupant and drops queued swaps into
    /// the position.
    pub fn set_active_position(&mut self, position: Position, toggle: PositionToggle) -> Outcome {
        if position.is_bench() {
            return Err(Rejected::BenchNotConfigurable);
        }
        match toggle {
            PositionToggle::Add => {
                if self.active.insert(position) {
                    self.events.push(GameEvent::ActivePositionsChanged);
                }
            }
            PositionToggle::Remove => {
                if !self.active.remove(position) {
                    return Err(Rejected::PositionNotActive(position));
                }
                self.retire_position(position);
                self.events.push(GameEvent::ActivePositionsChanged);
            }
        }
        self.check_contracts();
        Ok(())
    }

    /// Replace the active set with a preset's positions.
    pub fn apply_preset(&mut self, preset: FieldPreset) {
        let wanted: ActivePositions = preset.positions().iter().copied().collect();
        let retired: Vec<Position> = self.active.iter().filter(|p| !wanted.contains(*p)).collect();
        for position in retired {
            self.active.remove(position);
            self.retire_position(position);
        }
        for position in wanted.iter() {
            self.active.insert(position);
        }
        self.config.field_preset = preset;
        self.events.push(GameEvent::ActivePositionsChanged);
        self.check_contracts();
    }

    fn retire_position(&mut self, position: Position) {
        let displaced = assignment::displace(&mut self.roster, position, None, self.config.history_limit);
        let purged = self.queue.purge_target(position);
        log::debug!("position {position} removed: {} benched, {purged} swaps purged", displaced.len());
        if !displaced.is_empty() {
            self.events.push(GameEvent::LineupChanged { moved: displaced });
        }
    }

    // ========================
    // Suspension
    // ========================

    pub fn prepare_for_suspension(&mut self) {
        self.prepare_for_suspension_at(current_timestamp());
    }

    pub fn resume(&mut self) -> Option<ClockAdvance> {
        self.resume_at(current_timestamp())
    }

    /// Record when the host stopped scheduling ticks, and whether the clock
    /// was running at that moment.
    pub fn prepare_for_suspension_at(&mut self, now_ms: u64) {
        let clock_running = self.clock.is_running();
        self.suspension = Some(Suspension { at_ms: now_ms, clock_running });
        log::debug!("suspended at {now_ms} (clock running: {clock_running})");
        self.events.push(GameEvent::Suspended);
    }

    /// Credit the wall-clock time spent suspended, once.
    ///
    /// Partial seconds are dropped. The gap is credited only when the clock
    /// was running at suspension and still is; starting or pausing while
    /// suspended forfeits it.
    pub fn resume_at(&mut self, now_ms: u64) -> Option<ClockAdvance> {
        let suspension = self.suspension.take()?;
        let elapsed_secs =
            u32::try_from(now_ms.saturating_sub(suspension.at_ms) / 1000).unwrap_or(u32::MAX);
        let advance = if suspension.clock_running { self.clock.advance_by(elapsed_secs) } else { None };
        if let Some(advance) = advance {
            self.accrue(advance);
        }
        let caught_up = advance.map(|a| a.seconds).unwrap_or(0);
        log::info!("resumed after {elapsed_secs}s, clock advanced {caught_up}s");
        self.events.push(GameEvent::Resumed { caught_up });
        advance
    }

    fn accrue(&mut self, advance: ClockAdvance) {
        self.roster.accrue(advance.seconds);
        self.events.push(GameEvent::TimeAdvanced { seconds: advance.seconds });
        if advance.expired {
            log::info!("game ended");
            self.events.push(GameEvent::GameEnded);
        }
    }

    // ========================
    // Contracts
    // ========================

    /// Invariant violations, if any. Empty means consistent.
    pub fn contract_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        for position in self.roster.occupancy_conflicts() {
            violations.push(format!("position {position} has more than one occupant"));
        }
        for player in self.roster.players() {
            if player.is_active == player.current_position().is_bench() {
                violations.push(format!("player {} active flag disagrees with position", player.id));
            }
            if player.position_log().last() != Some(&player.current_position()) {
                violations.push(format!("player {} log does not end at current position", player.id));
            }
        }
        let entries = self.queue.entries();
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|e| e.player_id == entry.player_id) {
                violations.push(format!("player {} queued twice", entry.player_id));
            }
        }
        violations
    }

    fn check_contracts(&self) {
        let violations = self.contract_violations();
        if cfg!(feature = "strict_contracts") {
            assert!(violations.is_empty(), "contract violations: {violations:?}");
        } else {
            debug_assert!(violations.is_empty(), "contract violations: {violations:?}");
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const POSITIONS: [Position; 4] = [Position::GK, Position::CB, Position::ST, Position::Bench];

    #[derive(Debug, Clone)]
    enum Command {
        Start,
        Pause,
        Tick,
        Advance(u32),
        Route(usize, usize),
        Apply,
        Clear,
        Toggle(usize, bool),
        Remove(usize),
    }

    fn command() -> impl Strategy<Value = Command> {
        prop_oneof![
            1 => Just(Command::Start),
            1 => Just(Command::Pause),
            4 => Just(Command::Tick),
            1 => (0u32..200).prop_map(Command::Advance),
            6 => (0usize..6, 0usize..4).prop_map(|(p, q)| Command::Route(p, q)),
            2 => Just(Command::Apply),
            1 => Just(Command::Clear),
            1 => (0usize..3, any::<bool>()).prop_map(|(p, add)| Command::Toggle(p, add)),
            1 => Just(Command::Remove(0)),
        ]
    }

    proptest! {
        #[test]
        fn invariants_hold_for_any_command_sequence(commands in prop::collection::vec(command(), 1..80)) {
            let mut game = GameController::new(EngineConfig { duration_secs: 300, ..EngineConfig::default() });
            for p in [Position::GK, Position::CB, Position::ST] {
                let _ = game.set_active_position(p, PositionToggle::Add);
            }
            let mut ids: Vec<PlayerId> = (0..6)
                .map(|i| game.add_player(&format!("P{i}"), None, None).unwrap())
                .collect();
            let mut elapsed = 0u32;

            for command in commands {
                match command {
                    Command::Start => game.start_game(),
                    Command::Pause => game.pause_game(),
                    Command::Tick => {
                        if let Some(a) = game.tick() {
                            elapsed += a.seconds;
                        }
                    }
                    Command::Advance(secs) => {
                        game.prepare_for_suspension_at(0);
                        if let Some(a) = game.resume_at(u64::from(secs) * 1000) {
                            elapsed += a.seconds;
                        }
                    }
                    Command::Route(p, q) => {
                        if let Some(id) = ids.get(p) {
                            let _ = game.assign_or_queue(*id, POSITIONS[q]);
                        }
                    }
                    Command::Apply => {
                        let _ = game.apply_queue();
                    }
                    Command::Clear => {
                        game.clear_queue();
                    }
                    Command::Toggle(p, add) => {
                        let toggle = if add { PositionToggle::Add } else { PositionToggle::Remove };
                        let _ = game.set_active_position(POSITIONS[p], toggle);
                    }
                    Command::Remove(_) => {
                        if ids.len() > 1 {
                            let id = ids.remove(0);
                            game.remove_player(id).unwrap();
                        }
                    }
                }

                prop_assert!(game.contract_violations().is_empty(), "{:?}", game.contract_violations());
                prop_assert_eq!(game.clock().elapsed_seconds() % 300, elapsed % 300);
                for player in game.roster().players() {
                    prop_assert_eq!(player.seconds_played + player.seconds_on_bench, elapsed);
                    if !player.current_position().is_bench() {
                        prop_assert!(game.active_positions().contains(player.current_position()));
                    }
                }
            }
        }
    }
}

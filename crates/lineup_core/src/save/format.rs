//! Snapshot ⇄ key/value blobs.
//!
//! Each concern is stored under its own versioned key as a JSON blob, so a
//! missing or damaged key only costs that concern: loading falls back to
//! defaults for it and keeps everything else. Inside list-valued keys,
//! unreadable records are skipped one by one.

use super::error::SaveError;
use super::migration::migrate_roster_v0;
use crate::config::EngineConfig;
use crate::engine::{ActivePositions, Clock, GameController, QueuedSwap, Suspension, SwapQueue};
use crate::models::{Player, PlayerId, Position, Roster};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

pub const ROSTER_KEY: &str = "roster.v1";
pub const LEGACY_ROSTER_KEY: &str = "roster.v0";
pub const CLOCK_KEY: &str = "clock.v1";
pub const POSITIONS_KEY: &str = "positions.v1";
pub const QUEUE_KEY: &str = "queue.v1";

/// Opaque key → bytes map handed to storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotBlobs(BTreeMap<String, Vec<u8>>);

impl SnapshotBlobs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.0.insert(key.into(), bytes);
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub number: Option<u8>,
    #[serde(default)]
    pub seconds_played: u32,
    #[serde(default)]
    pub seconds_on_bench: u32,
    #[serde(default = "bench")]
    pub position: Position,
    #[serde(default)]
    pub log: Vec<Position>,
}

fn bench() -> Position {
    Position::Bench
}

impl PlayerRecord {
    fn capture(player: &Player) -> Self {
        Self {
            id: player.id,
            first_name: player.first_name.clone(),
            last_name: player.last_name.clone(),
            number: player.number,
            seconds_played: player.seconds_played,
            seconds_on_bench: player.seconds_on_bench,
            position: player.current_position(),
            log: player.position_log().to_vec(),
        }
    }

    fn into_player(self, history_limit: usize) -> Player {
        let mut player = Player::new(self.first_name, self.last_name, self.number);
        player.id = self.id;
        player.seconds_played = self.seconds_played;
        player.seconds_on_bench = self.seconds_on_bench;
        player.restore(self.position, self.log, history_limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockRecord {
    pub duration_seconds: u32,
    pub remaining_seconds: u32,
    #[serde(default)]
    pub is_running: bool,
    #[serde(default)]
    pub suspended_at_ms: Option<u64>,
    /// Absent in older snapshots; `is_running` stands in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspended_while_running: Option<bool>,
}

/// Everything needed to rebuild a game. `None` means "not stored, use the
/// configured default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSnapshot {
    pub roster: Vec<PlayerRecord>,
    pub clock: Option<ClockRecord>,
    pub active_positions: Option<Vec<Position>>,
    pub queue: Vec<QueuedSwap>,
}

/// What loading had to paper over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub warnings: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

impl GameSnapshot {
    pub fn capture(game: &GameController) -> Self {
        let clock = game.clock();
        Self {
            roster: game.roster().players().iter().map(PlayerRecord::capture).collect(),
            clock: Some(ClockRecord {
                duration_seconds: clock.duration_seconds(),
                remaining_seconds: clock.remaining_seconds(),
                is_running: clock.is_running(),
                suspended_at_ms: game.suspended_at_ms(),
                suspended_while_running: game.suspension().map(|s| s.clock_running),
            }),
            active_positions: Some(game.active_positions().iter().collect()),
            queue: game.queue().entries().to_vec(),
        }
    }

    pub fn to_blobs(&self) -> Result<SnapshotBlobs, SaveError> {
        let mut blobs = SnapshotBlobs::new();
        blobs.insert(ROSTER_KEY, serde_json::to_vec(&self.roster)?);
        if let Some(clock) = &self.clock {
            blobs.insert(CLOCK_KEY, serde_json::to_vec(clock)?);
        }
        if let Some(positions) = &self.active_positions {
            blobs.insert(POSITIONS_KEY, serde_json::to_vec(positions)?);
        }
        blobs.insert(QUEUE_KEY, serde_json::to_vec(&self.queue)?);
        Ok(blobs)
    }

    /// Decode whatever is readable. Never fails.
    pub fn from_blobs(blobs: &SnapshotBlobs) -> (Self, LoadReport) {
        let mut report = LoadReport::default();

        let roster = if let Some(bytes) = blobs.get(ROSTER_KEY) {
            decode_records(ROSTER_KEY, bytes, &mut report)
        } else if let Some(bytes) = blobs.get(LEGACY_ROSTER_KEY) {
            match migrate_roster_v0(bytes) {
                Ok(migrated) => {
                    if migrated.skipped > 0 {
                        report.warn(format!("{LEGACY_ROSTER_KEY}: skipped {} unreadable entries", migrated.skipped));
                    }
                    migrated.records
                }
                Err(err) => {
                    report.warn(format!("{LEGACY_ROSTER_KEY} unreadable, starting empty: {err}"));
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let clock = blobs.get(CLOCK_KEY).and_then(|bytes| {
            serde_json::from_slice::<ClockRecord>(bytes)
                .map_err(|err| report.warn(format!("{CLOCK_KEY} unreadable, using defaults: {err}")))
                .ok()
        });

        let active_positions = blobs
            .get(POSITIONS_KEY)
            .map(|bytes| decode_records::<Position>(POSITIONS_KEY, bytes, &mut report));

        let queue = blobs
            .get(QUEUE_KEY)
            .map(|bytes| decode_records(QUEUE_KEY, bytes, &mut report))
            .unwrap_or_default();

        (Self { roster, clock, active_positions, queue }, report)
    }

    /// Build a controller, repairing anything that would break an engine
    /// invariant.
    pub fn into_controller(self, mut config: EngineConfig, report: &mut LoadReport) -> GameController {
        let limit = config.history_limit;

        let active: ActivePositions = match self.active_positions {
            Some(positions) => positions.into_iter().collect(),
            None => config.field_preset.positions().iter().copied().collect(),
        };

        let mut players: Vec<Player> = Vec::with_capacity(self.roster.len());
        for record in self.roster {
            if players.iter().any(|p| p.id == record.id) {
                report.warn(format!("duplicate player {} dropped", record.id));
                continue;
            }
            let mut player = record.into_player(limit);
            let position = player.current_position();
            if !active.accepts(position) {
                report.warn(format!("player {} was on disabled {position}, benched", player.id));
                player.bench(limit);
            } else if !position.is_bench() && players.iter().any(|p| p.current_position() == position) {
                report.warn(format!("player {} shared {position}, benched", player.id));
                player.bench(limit);
            }
            players.push(player);
        }
        let roster = Roster::from_players(players);

        let (clock, suspension) = match self.clock {
            Some(record) => {
                config.duration_secs = record.duration_seconds;
                let suspension = record.suspended_at_ms.map(|at_ms| Suspension {
                    at_ms,
                    clock_running: record.suspended_while_running.unwrap_or(record.is_running),
                });
                (Clock::restore(record.duration_seconds, record.remaining_seconds, record.is_running), suspension)
            }
            None => (Clock::new(config.duration_secs), None),
        };

        let mut entries: Vec<QueuedSwap> = Vec::new();
        for entry in self.queue {
            let current = roster.get(entry.player_id).map(|p| p.current_position());
            let valid = match current {
                Some(current) => active.accepts(entry.target) && current != entry.target,
                None => false,
            };
            if !valid {
                report.warn(format!("stale queued swap for {} dropped", entry.player_id));
                continue;
            }
            // latest intent wins
            entries.retain(|e| e.player_id != entry.player_id);
            entries.push(entry);
        }

        GameController::from_parts(config, roster, clock, active, SwapQueue::from_entries(entries), suspension)
    }
}

/// Decode a JSON array one element at a time, skipping bad elements.
fn decode_records<T: DeserializeOwned>(key: &str, bytes: &[u8], report: &mut LoadReport) -> Vec<T> {
    let values: Vec<serde_json::Value> = match serde_json::from_slice(bytes) {
        Ok(values) => values,
        Err(err) => {
            report.warn(format!("{key} unreadable, using defaults: {err}"));
            return Vec::new();
        }
    };
    let total = values.len();
    let records: Vec<T> = values.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect();
    if records.len() < total {
        report.warn(format!("{key}: skipped {} unreadable entries", total - records.len()));
    }
    records
}

/// Unix milliseconds.
pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PositionToggle;

    fn sample_game() -> (GameController, PlayerId, PlayerId) {
        let mut game = GameController::new(EngineConfig { duration_secs: 600, ..EngineConfig::default() });
        let a = game.add_player("Mia", Some("Hamm"), Some(9)).unwrap();
        let b = game.add_player("Abby", None, None).unwrap();
        game.assign_or_queue(a, Position::ST).unwrap();
        game.start_game();
        for _ in 0..10 {
            game.tick();
        }
        game.assign_or_queue(b, Position::ST).unwrap();
        (game, a, b)
    }

    fn reload(blobs: &SnapshotBlobs) -> (GameController, LoadReport) {
        let (snapshot, mut report) = GameSnapshot::from_blobs(blobs);
        let game = snapshot.into_controller(EngineConfig::default(), &mut report);
        (game, report)
    }

    #[test]
    fn snapshot_restores_game() {
        let (game, a, b) = sample_game();
        let blobs = GameSnapshot::capture(&game).to_blobs().unwrap();
        let (restored, report) = reload(&blobs);

        assert!(report.is_clean(), "{:?}", report.warnings);
        assert_eq!(restored.roster(), game.roster());
        assert_eq!(restored.clock(), game.clock());
        assert_eq!(restored.active_positions(), game.active_positions());
        assert_eq!(restored.queue(), game.queue());
        assert_eq!(restored.roster().get(a).unwrap().seconds_played, 10);
        assert_eq!(restored.queue().entry_for(b).unwrap().target, Position::ST);
        assert_eq!(restored.config().duration_secs, 600);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let (game, a, _) = sample_game();
        let mut blobs = GameSnapshot::capture(&game).to_blobs().unwrap();
        blobs.remove(CLOCK_KEY);
        blobs.remove(POSITIONS_KEY);

        let (restored, _) = reload(&blobs);
        assert_eq!(restored.clock().remaining_seconds(), EngineConfig::default().duration_secs);
        assert!(!restored.is_running());
        // ST is part of the default preset, so the lineup survives
        assert_eq!(restored.roster().get(a).unwrap().current_position(), Position::ST);
    }

    #[test]
    fn corrupt_key_does_not_abort_others() {
        let (game, _, _) = sample_game();
        let mut blobs = GameSnapshot::capture(&game).to_blobs().unwrap();
        blobs.insert(CLOCK_KEY, b"{not json".to_vec());

        let (restored, report) = reload(&blobs);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(restored.roster().len(), 2);
        assert_eq!(restored.queue().len(), 1);
    }

    #[test]
    fn corrupt_record_is_skipped() {
        let (game, _, _) = sample_game();
        let mut blobs = GameSnapshot::capture(&game).to_blobs().unwrap();
        let mut roster: Vec<serde_json::Value> =
            serde_json::from_slice(blobs.get(ROSTER_KEY).unwrap()).unwrap();
        roster.push(serde_json::json!({ "first_name": 42 }));
        blobs.insert(ROSTER_KEY, serde_json::to_vec(&roster).unwrap());

        let (restored, report) = reload(&blobs);
        assert_eq!(restored.roster().len(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn unknown_positions_are_skipped() {
        let mut blobs = SnapshotBlobs::new();
        blobs.insert(POSITIONS_KEY, br#"["GK", "SWEEPER", "ST"]"#.to_vec());
        let (restored, report) = reload(&blobs);
        let active: Vec<Position> = restored.active_positions().iter().collect();
        assert_eq!(active, vec![Position::GK, Position::ST]);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn restore_repairs_broken_invariants() {
        let (mut game, a, b) = sample_game();
        game.pause_game();
        game.clear_queue();
        game.set_active_position(Position::GK, PositionToggle::Add).unwrap();
        game.assign_or_queue(b, Position::GK).unwrap();
        let mut snapshot = GameSnapshot::capture(&game);

        // both on ST, plus a disabled position and a queued no-op
        snapshot.roster[1].position = Position::ST;
        snapshot.active_positions = Some(vec![Position::ST]);
        snapshot.queue.push(QueuedSwap {
            id: crate::engine::SwapId::new(),
            player_id: a,
            target: Position::ST,
            origin: None,
        });

        let mut report = LoadReport::default();
        let restored = snapshot.into_controller(EngineConfig::default(), &mut report);
        assert!(restored.contract_violations().is_empty());
        assert_eq!(restored.roster().get(a).unwrap().current_position(), Position::ST);
        assert_eq!(restored.roster().get(b).unwrap().current_position(), Position::Bench);
        assert!(restored.queue().is_empty());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn suspension_keeps_clock_state_at_suspend_time() {
        let mut game = GameController::new(EngineConfig { duration_secs: 600, ..EngineConfig::default() });
        game.prepare_for_suspension_at(5_000);
        game.start_game();
        let blobs = GameSnapshot::capture(&game).to_blobs().unwrap();

        let (mut restored, report) = reload(&blobs);
        assert!(report.is_clean());
        assert_eq!(restored.suspension(), Some(Suspension { at_ms: 5_000, clock_running: false }));
        assert!(restored.is_running());
        assert_eq!(restored.resume_at(65_000), None);
        assert_eq!(restored.clock().remaining_seconds(), 600);
    }

    #[test]
    fn older_clock_record_infers_suspension_state() {
        let mut blobs = SnapshotBlobs::new();
        blobs.insert(
            CLOCK_KEY,
            br#"{"duration_seconds":600,"remaining_seconds":500,"is_running":true,"suspended_at_ms":1000}"#.to_vec(),
        );
        let (mut restored, report) = reload(&blobs);
        assert!(report.is_clean());
        assert_eq!(restored.suspension(), Some(Suspension { at_ms: 1_000, clock_running: true }));
        assert_eq!(restored.resume_at(31_000).map(|a| a.seconds), Some(30));
        assert_eq!(restored.clock().remaining_seconds(), 470);
    }

    #[test]
    fn empty_blobs_give_fresh_game() {
        let (restored, report) = reload(&SnapshotBlobs::new());
        assert!(report.is_clean());
        assert!(restored.roster().is_empty());
        assert_eq!(
            restored.active_positions().len(),
            EngineConfig::default().field_preset.players_on_field()
        );
    }
}

use super::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque, immutable player identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A roster entry and its per-game state.
///
/// `current_position` is authoritative. `position_log` is an append-only
/// display trail that always starts with `Bench` and always ends with the
/// current position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u8>,
    #[serde(default)]
    pub seconds_played: u32,
    #[serde(default)]
    pub seconds_on_bench: u32,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "default_position")]
    current_position: Position,
    #[serde(default = "default_log")]
    position_log: Vec<Position>,
}

fn default_position() -> Position {
    Position::Bench
}

fn default_log() -> Vec<Position> {
    vec![Position::Bench]
}

impl Player {
    pub fn new(first_name: impl Into<String>, last_name: Option<String>, number: Option<u8>) -> Self {
        Self {
            id: PlayerId::new(),
            first_name: first_name.into(),
            last_name,
            number,
            seconds_played: 0,
            seconds_on_bench: 0,
            is_active: false,
            current_position: Position::Bench,
            position_log: default_log(),
        }
    }

    pub fn current_position(&self) -> Position {
        self.current_position
    }

    pub fn position_log(&self) -> &[Position] {
        &self.position_log
    }

    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }

    /// Field positions this player has occupied, first occurrence order.
    pub fn positions_played(&self) -> Vec<Position> {
        let mut seen = Vec::new();
        for position in &self.position_log {
            if !position.is_bench() && !seen.contains(position) {
                seen.push(*position);
            }
        }
        seen
    }

    /// Move to `position`, appending to the log only on an actual change.
    /// `is_active` always follows the destination.
    ///
    /// Returns whether the position changed.
    pub(crate) fn move_to(&mut self, position: Position, history_limit: usize) -> bool {
        self.is_active = !position.is_bench();
        if self.current_position == position {
            return false;
        }
        self.current_position = position;
        self.position_log.push(position);
        self.trim_log(history_limit);
        true
    }

    pub(crate) fn bench(&mut self, history_limit: usize) -> bool {
        self.move_to(Position::Bench, history_limit)
    }

    /// Credit `seconds` to the counter matching the current active flag.
    pub(crate) fn accrue(&mut self, seconds: u32) {
        if self.is_active {
            self.seconds_played = self.seconds_played.saturating_add(seconds);
        } else {
            self.seconds_on_bench = self.seconds_on_bench.saturating_add(seconds);
        }
    }

    pub(crate) fn reset_counters(&mut self) {
        self.seconds_played = 0;
        self.seconds_on_bench = 0;
    }

    /// Rebuild a player from stored fields, repairing the log so it starts
    /// with Bench and ends with `current_position`.
    pub(crate) fn restore(
        mut self,
        current_position: Position,
        log: Vec<Position>,
        history_limit: usize,
    ) -> Self {
        let mut log = log;
        if log.first() != Some(&Position::Bench) {
            log.insert(0, Position::Bench);
        }
        if log.last() != Some(&current_position) {
            log.push(current_position);
        }
        self.current_position = current_position;
        self.is_active = !current_position.is_bench();
        self.position_log = log;
        self.trim_log(history_limit);
        self
    }

    /// Keep the leading Bench and the newest entries.
    fn trim_log(&mut self, history_limit: usize) {
        let limit = history_limit.max(2);
        if self.position_log.len() > limit {
            let excess = self.position_log.len() - limit;
            self.position_log.drain(1..1 + excess);
        }
    }
}

//! Deferred substitutions.
//!
//! While the clock runs, position changes are staged here and committed
//! together at a stoppage. Applying is a two-pass batch: every target is
//! vacated before anyone is placed, so a same-batch swap (A takes B's spot,
//! B takes A's) lands both players instead of benching one of them.
//! Do not fold the passes together.

use super::assignment::{displace, ActivePositions};
use crate::error::{Outcome, Rejected};
use crate::models::{PlayerId, Position, Roster};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapId(Uuid);

impl SwapId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SwapId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSwap {
    pub id: SwapId,
    pub player_id: PlayerId,
    pub target: Position,
    /// Where the player stood when the swap was queued. Display only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Position>,
}

/// What a batch apply did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Players left standing on their target (moved or confirmed).
    pub placed: Vec<PlayerId>,
    /// Players benched by the batch and not placed afterwards.
    pub displaced: Vec<PlayerId>,
    /// Entries dropped because the player or target no longer exists.
    pub skipped: Vec<SwapId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapQueue {
    entries: Vec<QueuedSwap>,
}

impl SwapQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<QueuedSwap>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[QueuedSwap] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry_for(&self, player: PlayerId) -> Option<&QueuedSwap> {
        self.entries.iter().find(|e| e.player_id == player)
    }

    /// Stage `player` → `target`. A previous entry for the same player is
    /// replaced in place (latest intent wins, queue order kept).
    pub fn enqueue(
        &mut self,
        roster: &Roster,
        active: &ActivePositions,
        player: PlayerId,
        target: Position,
    ) -> Outcome<SwapId> {
        if !active.accepts(target) {
            return Err(Rejected::PositionNotActive(target));
        }
        let current = roster
            .get(player)
            .map(|p| p.current_position())
            .ok_or(Rejected::NoSuchPlayer(player))?;
        if current == target {
            return Err(Rejected::AlreadyInPosition(target));
        }

        let entry = QueuedSwap { id: SwapId::new(), player_id: player, target, origin: Some(current) };
        let id = entry.id;
        match self.entries.iter_mut().find(|e| e.player_id == player) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(id)
    }

    /// Commit every staged swap and empty the queue.
    pub fn apply_all(
        &mut self,
        roster: &mut Roster,
        active: &ActivePositions,
        history_limit: usize,
    ) -> Outcome<ApplyReport> {
        if self.entries.is_empty() {
            return Err(Rejected::QueueEmpty);
        }
        let entries = std::mem::take(&mut self.entries);
        let mut report = ApplyReport::default();

        // Pass 1: vacate every valid target.
        for entry in &entries {
            if !active.accepts(entry.target) {
                continue;
            }
            for id in displace(roster, entry.target, Some(entry.player_id), history_limit) {
                if !report.displaced.contains(&id) {
                    report.displaced.push(id);
                }
            }
        }

        // Pass 2: place. Several entries may share a target; each placement
        // benches whoever an earlier entry put there, so the last one holds it.
        for entry in &entries {
            if !active.accepts(entry.target) || !roster.contains(entry.player_id) {
                report.skipped.push(entry.id);
                continue;
            }
            for id in displace(roster, entry.target, Some(entry.player_id), history_limit) {
                report.placed.retain(|placed| *placed != id);
                if !report.displaced.contains(&id) {
                    report.displaced.push(id);
                }
            }
            if let Some(player) = roster.get_mut(entry.player_id) {
                player.move_to(entry.target, history_limit);
                report.placed.push(entry.player_id);
            }
        }

        report.displaced.retain(|id| !report.placed.contains(id));
        Ok(report)
    }

    pub fn clear(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }

    /// Drop entries targeting `position`. Returns how many were dropped.
    pub(crate) fn purge_target(&mut self, position: Position) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.target != position);
        before - self.entries.len()
    }

    pub(crate) fn remove_player(&mut self, player: PlayerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.player_id != player);
        before != self.entries.len()
    }
}

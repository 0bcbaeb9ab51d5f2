use super::error::SaveError;
use super::format::{PlayerRecord, SnapshotBlobs, LEGACY_ROSTER_KEY, ROSTER_KEY};
use crate::models::{PlayerId, Position};
use serde::Deserialize;

/// Roster entry as the first release stored it: the whole position history
/// as label strings, with the current position being the last element.
#[derive(Debug, Deserialize)]
struct PlayerV0 {
    id: PlayerId,
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    number: Option<u8>,
    #[serde(default)]
    seconds_played: u32,
    #[serde(default)]
    seconds_on_bench: u32,
    #[serde(default)]
    position_history: Vec<String>,
}

/// Result of migrating a legacy roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigratedRoster {
    pub records: Vec<PlayerRecord>,
    /// Legacy entries that could not be read and were dropped.
    pub skipped: usize,
}

/// Convert a `roster.v0` blob into current records.
///
/// Only a blob that is not a JSON array at all is an error; unreadable
/// entries are skipped one by one. Unknown position labels are dropped from
/// the history; an empty history means the player was on the bench.
pub fn migrate_roster_v0(bytes: &[u8]) -> Result<MigratedRoster, SaveError> {
    let values: Vec<serde_json::Value> = serde_json::from_slice(bytes)?;
    log::info!("Migrating {} players from {LEGACY_ROSTER_KEY} to {ROSTER_KEY}", values.len());

    let mut migrated = MigratedRoster::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<PlayerV0>(value) {
            Ok(old) => migrated.records.push(upgrade(old)),
            Err(err) => {
                log::warn!("{LEGACY_ROSTER_KEY}[{index}] unreadable, skipped: {err}");
                migrated.skipped += 1;
            }
        }
    }
    Ok(migrated)
}

fn upgrade(old: PlayerV0) -> PlayerRecord {
    let log: Vec<Position> = old
        .position_history
        .iter()
        .filter_map(|label| match label.parse::<Position>() {
            Ok(position) => Some(position),
            Err(err) => {
                log::warn!("player {}: {err}, dropped from history", old.id);
                None
            }
        })
        .collect();
    let position = log.last().copied().unwrap_or(Position::Bench);
    PlayerRecord {
        id: old.id,
        first_name: old.first_name,
        last_name: old.last_name,
        number: old.number,
        seconds_played: old.seconds_played,
        seconds_on_bench: old.seconds_on_bench,
        position,
        log,
    }
}

/// True when only the legacy roster key is present.
pub fn needs_migration(blobs: &SnapshotBlobs) -> bool {
    blobs.contains(LEGACY_ROSTER_KEY) && !blobs.contains(ROSTER_KEY)
}

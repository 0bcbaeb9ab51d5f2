// Save/Load for the game engine
// Per-key JSON blobs; file storage wraps them in MessagePack + LZ4 with a checksum

pub mod archive;
pub mod error;
pub mod format;
pub mod migration;
pub mod store;

pub use error::SaveError;
pub use format::{current_timestamp, GameSnapshot, LoadReport, SnapshotBlobs};
pub use migration::{migrate_roster_v0, needs_migration, MigratedRoster};
pub use store::{FileStore, MemoryStore, SnapshotStore};

use crate::config::EngineConfig;
use crate::engine::GameController;

pub const ARCHIVE_VERSION: u32 = 1;

/// Persist the controller's current state.
pub fn save_game(store: &mut dyn SnapshotStore, game: &GameController) -> Result<(), SaveError> {
    let blobs = GameSnapshot::capture(game).to_blobs()?;
    store.save(&blobs)
}

/// Load the last saved game, or a fresh one.
///
/// Never fails: an unreadable store yields a fresh game and the failure is
/// recorded in the report.
pub fn load_game(store: &dyn SnapshotStore, config: EngineConfig) -> (GameController, LoadReport) {
    let mut report = LoadReport::default();
    let blobs = match store.load() {
        Ok(Some(blobs)) => blobs,
        Ok(None) => {
            log::info!("No saved game, starting fresh");
            SnapshotBlobs::new()
        }
        Err(err) => {
            let message = format!("saved game unreadable, starting fresh: {err}");
            log::warn!("{message}");
            report.warnings.push(message);
            SnapshotBlobs::new()
        }
    };

    let (snapshot, decode_report) = GameSnapshot::from_blobs(&blobs);
    report.warnings.extend(decode_report.warnings);
    let game = snapshot.into_controller(config, &mut report);
    (game, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Position;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_through_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::in_dir(temp_dir.path());

        let mut game = GameController::default();
        let id = game.add_player("Mia", None, Some(9)).unwrap();
        game.assign_or_queue(id, Position::GK).unwrap();
        save_game(&mut store, &game).unwrap();

        let (loaded, report) = load_game(&store, EngineConfig::default());
        assert!(report.is_clean());
        assert_eq!(loaded.roster(), game.roster());
    }

    #[test]
    fn test_unreadable_store_starts_fresh() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::in_dir(temp_dir.path());
        std::fs::write(store.path(), [0u8; 64]).unwrap();

        let (loaded, report) = load_game(&store, EngineConfig::default());
        assert!(loaded.roster().is_empty());
        assert_eq!(report.warnings.len(), 1);
    }
}

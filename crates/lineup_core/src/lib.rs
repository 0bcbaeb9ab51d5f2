//! # lineup_core - Playing-time engine for youth team games
//!
//! Tracks who plays where and for how long during a timed game.
//!
//! ## Features
//! - Countdown game clock with pause, reset and suspend/resume catch-up
//! - One player per field position, enforced on every command
//! - Substitutions queued while the clock runs and applied in one step
//! - Snapshot persistence that falls back per record instead of failing
//!
//! The synchronous [`GameController`] holds all game state; [`LiveSession`]
//! drives it from a tokio tick task.

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Method naming conventions - would require API changes
#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod engine;
pub mod error;
pub mod live;
pub mod models;
pub mod save;

pub use config::{EngineConfig, FieldPreset};
pub use engine::{GameController, GameEvent, GameView, PositionToggle, Routed};
pub use error::{ConfigError, Outcome, Rejected};
pub use live::LiveSession;
pub use models::{Player, PlayerId, Position, Roster};
pub use save::{FileStore, MemoryStore, SaveError, SnapshotStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

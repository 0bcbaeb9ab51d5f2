//! Real-time driving of a game: a tokio tick task, change broadcasts and
//! autosave around a [`crate::engine::GameController`].

pub mod session;
pub mod ticker;

pub use session::{LiveSession, TICK_PERIOD};
pub use ticker::Ticker;

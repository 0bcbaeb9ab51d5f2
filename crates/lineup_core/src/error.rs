use crate::models::{PlayerId, Position};
use thiserror::Error;

/// Why a command left the game untouched.
///
/// Commands are total: a rejection is an ordinary outcome (a stale tap on a
/// position removed a moment ago, say) and the state is guaranteed unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    #[error("position {0} is not active")]
    PositionNotActive(Position),

    #[error("no such player: {0}")]
    NoSuchPlayer(PlayerId),

    #[error("swap queue is empty")]
    QueueEmpty,

    #[error("game clock is not running")]
    GameNotRunning,

    #[error("player is already at {0}")]
    AlreadyInPosition(Position),

    #[error("first name must not be empty")]
    EmptyName,

    #[error("index {index} out of range for roster of {len}")]
    InvalidIndex { index: usize, len: usize },

    #[error("bench is always available and cannot be toggled")]
    BenchNotConfigurable,
}

pub type Outcome<T = ()> = std::result::Result<T, Rejected>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config value: {0}")]
    Invalid(String),

    #[error("config parse error: {0}")]
    Parse(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

pub mod player;
pub mod position;
pub mod roster;

pub use player::{Player, PlayerId};
pub use position::{Position, UnknownPosition};
pub use roster::Roster;

//! Game-state engine: clock, assignment, swap queue and the controller
//! that orchestrates them.

pub mod assignment;
pub mod clock;
pub mod controller;
pub mod swap_queue;
pub mod view;

pub use assignment::{assign, ActivePositions};
pub use clock::{format_mm_ss, Clock, ClockAdvance};
pub use controller::{GameController, GameEvent, PositionToggle, Routed, Suspension};
pub use swap_queue::{ApplyReport, QueuedSwap, SwapId, SwapQueue};
pub use view::{GameView, PlayerView, QueueEntryView};

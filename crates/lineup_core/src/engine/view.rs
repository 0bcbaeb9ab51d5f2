//! Read models for display collaborators.

use super::clock::format_mm_ss;
use super::controller::GameController;
use crate::models::{Player, PlayerId, Position};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub number: Option<u8>,
    pub position: &'static str,
    pub is_active: bool,
    pub played: String,
    pub on_bench: String,
    pub positions_played: Vec<&'static str>,
    /// Label of the queued target, if a swap is pending.
    pub queued_target: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntryView {
    pub player_id: PlayerId,
    pub player_name: String,
    pub origin: &'static str,
    pub target: &'static str,
}

impl QueueEntryView {
    /// `"Mia: ST → Bench"`
    pub fn summary(&self) -> String {
        format!("{}: {} → {}", self.player_name, self.origin, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameView {
    pub clock: String,
    pub is_running: bool,
    pub active_positions: Vec<&'static str>,
    /// Enabled positions nobody currently holds.
    pub open_positions: Vec<&'static str>,
    pub players: Vec<PlayerView>,
    pub queue: Vec<QueueEntryView>,
}

impl GameView {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl GameController {
    pub fn view(&self) -> GameView {
        let roster = self.roster();
        let players = roster.players().iter().map(|p| self.player_view(p)).collect();

        let queue = self
            .queue()
            .entries()
            .iter()
            .map(|entry| QueueEntryView {
                player_id: entry.player_id,
                player_name: roster
                    .get(entry.player_id)
                    .map(Player::display_name)
                    .unwrap_or_else(|| "?".to_string()),
                origin: entry.origin.map(|p| p.label()).unwrap_or("?"),
                target: entry.target.label(),
            })
            .collect();

        let open_positions = self
            .active_positions()
            .iter()
            .filter(|p| roster.players().iter().all(|pl| pl.current_position() != *p))
            .map(|p| p.label())
            .collect();

        GameView {
            clock: self.clock().display(),
            is_running: self.is_running(),
            active_positions: self.active_positions().iter().map(|p| p.label()).collect(),
            open_positions,
            players,
            queue,
        }
    }

    fn player_view(&self, player: &Player) -> PlayerView {
        PlayerView {
            id: player.id,
            name: player.display_name(),
            number: player.number,
            position: player.current_position().label(),
            is_active: player.is_active,
            played: format_mm_ss(player.seconds_played),
            on_bench: format_mm_ss(player.seconds_on_bench),
            positions_played: player.positions_played().iter().map(Position::label).collect(),
            queued_target: self.queue().entry_for(player.id).map(|e| e.target.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::controller::{GameController, PositionToggle};
    use crate::models::Position;

    #[test]
    fn view_reflects_lineup_clock_and_queue() {
        let mut game = GameController::new(EngineConfig { duration_secs: 125, ..EngineConfig::default() });
        game.set_active_position(Position::ST, PositionToggle::Add).unwrap();
        let mia = game.add_player("Mia", Some("Hamm"), Some(9)).unwrap();
        let abby = game.add_player("Abby", None, None).unwrap();
        game.assign_or_queue(mia, Position::ST).unwrap();
        game.start_game();
        game.tick();
        game.assign_or_queue(abby, Position::ST).unwrap();

        let view = game.view();
        assert_eq!(view.clock, "02:04");
        assert!(view.is_running);
        assert!(view.active_positions.contains(&"ST"));
        assert!(!view.open_positions.contains(&"ST"));

        let mia_view = &view.players[0];
        assert_eq!(mia_view.name, "Mia Hamm");
        assert_eq!(mia_view.position, "ST");
        assert_eq!(mia_view.played, "00:01");
        assert_eq!(mia_view.positions_played, vec!["ST"]);
        assert_eq!(view.players[1].queued_target, Some("ST"));

        assert_eq!(view.queue.len(), 1);
        assert_eq!(view.queue[0].summary(), "Abby: Bench → ST");
        assert!(view.to_json().unwrap().contains("\"clock\":\"02:04\""));
    }
}

use super::player::{Player, PlayerId};
use super::position::Position;
use crate::error::{Outcome, Rejected};
use serde::{Deserialize, Serialize};

/// Ordered player list. Order only matters for display and iteration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_players(players: Vec<Player>) -> Self {
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.get(id).is_some()
    }

    /// Append a new benched player with zeroed counters.
    ///
    /// Names are stored trimmed; a blank last name is dropped.
    pub fn add_player(
        &mut self,
        first_name: &str,
        last_name: Option<&str>,
        number: Option<u8>,
    ) -> Outcome<PlayerId> {
        let first = first_name.trim();
        if first.is_empty() {
            return Err(Rejected::EmptyName);
        }
        let player = Player::new(first, normalize_last_name(last_name), number);
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Outcome<Player> {
        let idx = self.index_of(id).ok_or(Rejected::NoSuchPlayer(id))?;
        Ok(self.players.remove(idx))
    }

    pub fn rename_player(
        &mut self,
        id: PlayerId,
        first_name: &str,
        last_name: Option<&str>,
    ) -> Outcome {
        let first = first_name.trim();
        if first.is_empty() {
            return Err(Rejected::EmptyName);
        }
        let player = self.get_mut(id).ok_or(Rejected::NoSuchPlayer(id))?;
        player.first_name = first.to_string();
        player.last_name = normalize_last_name(last_name);
        Ok(())
    }

    pub fn set_number(&mut self, id: PlayerId, number: Option<u8>) -> Outcome {
        let player = self.get_mut(id).ok_or(Rejected::NoSuchPlayer(id))?;
        player.number = number;
        Ok(())
    }

    /// Move the player at `from` so it ends up at index `to`.
    pub fn reorder(&mut self, from: usize, to: usize) -> Outcome {
        let len = self.players.len();
        if from >= len {
            return Err(Rejected::InvalidIndex { index: from, len });
        }
        if to >= len {
            return Err(Rejected::InvalidIndex { index: to, len });
        }
        let player = self.players.remove(from);
        self.players.insert(to, player);
        Ok(())
    }

    /// Players currently at `position`, excluding `except`.
    pub(crate) fn occupants_of(&self, position: Position, except: Option<PlayerId>) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.current_position() == position && Some(p.id) != except)
            .map(|p| p.id)
            .collect()
    }

    /// Credit `seconds` to every player, played or bench by active flag.
    pub(crate) fn accrue(&mut self, seconds: u32) {
        if seconds == 0 {
            return;
        }
        for player in &mut self.players {
            player.accrue(seconds);
        }
    }

    pub(crate) fn reset_counters(&mut self) {
        for player in &mut self.players {
            player.reset_counters();
        }
    }

    pub(crate) fn bench_all(&mut self, history_limit: usize) {
        for player in &mut self.players {
            player.bench(history_limit);
        }
    }

    /// Non-bench positions held by more than one player.
    pub fn occupancy_conflicts(&self) -> Vec<Position> {
        let mut seen: Vec<Position> = Vec::new();
        let mut conflicts = Vec::new();
        for position in self.players.iter().map(|p| p.current_position()) {
            if position.is_bench() {
                continue;
            }
            if seen.contains(&position) {
                if !conflicts.contains(&position) {
                    conflicts.push(position);
                }
            } else {
                seen.push(position);
            }
        }
        conflicts
    }

    fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }
}

fn normalize_last_name(last_name: Option<&str>) -> Option<String> {
    last_name.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(roster: &Roster) -> Vec<String> {
        roster.players().iter().map(|p| p.first_name.clone()).collect()
    }

    #[test]
    fn add_trims_and_defaults() {
        let mut roster = Roster::new();
        let id = roster.add_player("  Mia ", Some("  "), Some(7)).unwrap();
        let p = roster.get(id).unwrap();
        assert_eq!(p.first_name, "Mia");
        assert_eq!(p.last_name, None);
        assert_eq!(p.number, Some(7));
        assert_eq!(p.current_position(), Position::Bench);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut roster = Roster::new();
        assert_eq!(roster.add_player("   ", None, None), Err(Rejected::EmptyName));
        assert!(roster.is_empty());
    }

    #[test]
    fn rename_blank_is_noop() {
        let mut roster = Roster::new();
        let id = roster.add_player("Mia", Some("Hamm"), None).unwrap();
        assert_eq!(roster.rename_player(id, " ", None), Err(Rejected::EmptyName));
        assert_eq!(roster.get(id).unwrap().display_name(), "Mia Hamm");

        roster.rename_player(id, "Abby", Some("Wambach")).unwrap();
        assert_eq!(roster.get(id).unwrap().display_name(), "Abby Wambach");
    }

    #[test]
    fn remove_unknown_player_is_rejected() {
        let mut roster = Roster::new();
        let ghost = PlayerId::new();
        assert_eq!(roster.remove_player(ghost).unwrap_err(), Rejected::NoSuchPlayer(ghost));
    }

    #[test]
    fn reorder_moves_player() {
        let mut roster = Roster::new();
        for name in ["A", "B", "C", "D"] {
            roster.add_player(name, None, None).unwrap();
        }
        roster.reorder(0, 2).unwrap();
        assert_eq!(names(&roster), ["B", "C", "A", "D"]);
        roster.reorder(3, 0).unwrap();
        assert_eq!(names(&roster), ["D", "B", "C", "A"]);
        assert_eq!(roster.reorder(4, 0), Err(Rejected::InvalidIndex { index: 4, len: 4 }));
    }

    #[test]
    fn conflicts_ignore_bench() {
        let mut roster = Roster::new();
        let a = roster.add_player("A", None, None).unwrap();
        let b = roster.add_player("B", None, None).unwrap();
        roster.add_player("C", None, None).unwrap();
        assert!(roster.occupancy_conflicts().is_empty());

        roster.get_mut(a).unwrap().move_to(Position::CB, 64);
        roster.get_mut(b).unwrap().move_to(Position::CB, 64);
        assert_eq!(roster.occupancy_conflicts(), vec![Position::CB]);
    }
}

//! Immediate-mode position assignment.
//!
//! Used before kickoff or while the clock is paused. Every call is a direct
//! transition that keeps at most one player on each field position.

use crate::error::{Outcome, Rejected};
use crate::models::{PlayerId, Position, Roster};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Positions currently enabled on the field. Bench is implicit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivePositions(BTreeSet<Position>);

impl ActivePositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, position: Position) -> bool {
        self.0.contains(&position)
    }

    /// Bench, or an enabled field position.
    pub fn accepts(&self, position: Position) -> bool {
        position.is_bench() || self.contains(position)
    }

    /// Returns false if already present. Bench is never inserted.
    pub(crate) fn insert(&mut self, position: Position) -> bool {
        !position.is_bench() && self.0.insert(position)
    }

    pub(crate) fn remove(&mut self, position: Position) -> bool {
        self.0.remove(&position)
    }

    /// Catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Position> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Position> for ActivePositions {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        Self(iter.into_iter().filter(|p| !p.is_bench()).collect())
    }
}

/// Bench every player on `position` except `keep`. Returns who moved.
pub(crate) fn displace(
    roster: &mut Roster,
    position: Position,
    keep: Option<PlayerId>,
    history_limit: usize,
) -> Vec<PlayerId> {
    if position.is_bench() {
        return Vec::new();
    }
    let occupants = roster.occupants_of(position, keep);
    for id in &occupants {
        if let Some(player) = roster.get_mut(*id) {
            player.bench(history_limit);
        }
    }
    occupants
}

/// Put `player` on `position` right now, benching whoever held it.
///
/// Returns the displaced players.
pub fn assign(
    roster: &mut Roster,
    active: &ActivePositions,
    player: PlayerId,
    position: Position,
    history_limit: usize,
) -> Outcome<Vec<PlayerId>> {
    if !active.accepts(position) {
        return Err(Rejected::PositionNotActive(position));
    }
    if !roster.contains(player) {
        return Err(Rejected::NoSuchPlayer(player));
    }

    let displaced = displace(roster, position, Some(player), history_limit);
    if let Some(target) = roster.get_mut(player) {
        target.move_to(position, history_limit);
    }
    Ok(displaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 64;

    fn setup() -> (Roster, ActivePositions, PlayerId, PlayerId) {
        let mut roster = Roster::new();
        let a = roster.add_player("A", None, None).unwrap();
        let b = roster.add_player("B", None, None).unwrap();
        let active: ActivePositions = [Position::GK, Position::ST].into_iter().collect();
        (roster, active, a, b)
    }

    #[test]
    fn assign_to_disabled_position_is_rejected() {
        let (mut roster, active, a, _) = setup();
        assert_eq!(
            assign(&mut roster, &active, a, Position::CB, LIMIT),
            Err(Rejected::PositionNotActive(Position::CB))
        );
        assert_eq!(roster.get(a).unwrap().current_position(), Position::Bench);
    }

    #[test]
    fn assign_unknown_player_displaces_nobody() {
        let (mut roster, active, a, _) = setup();
        assign(&mut roster, &active, a, Position::ST, LIMIT).unwrap();
        let ghost = PlayerId::new();
        assert_eq!(
            assign(&mut roster, &active, ghost, Position::ST, LIMIT),
            Err(Rejected::NoSuchPlayer(ghost))
        );
        assert_eq!(roster.get(a).unwrap().current_position(), Position::ST);
    }

    #[test]
    fn assign_displaces_previous_occupant() {
        let (mut roster, active, a, b) = setup();
        assign(&mut roster, &active, a, Position::ST, LIMIT).unwrap();
        let displaced = assign(&mut roster, &active, b, Position::ST, LIMIT).unwrap();

        assert_eq!(displaced, vec![a]);
        let pa = roster.get(a).unwrap();
        assert_eq!(pa.current_position(), Position::Bench);
        assert!(!pa.is_active);
        assert_eq!(pa.position_log(), &[Position::Bench, Position::ST, Position::Bench]);
        assert!(roster.get(b).unwrap().is_active);
        assert!(roster.occupancy_conflicts().is_empty());
    }

    #[test]
    fn reassigning_same_position_does_not_grow_log() {
        let (mut roster, active, a, _) = setup();
        assign(&mut roster, &active, a, Position::GK, LIMIT).unwrap();
        assign(&mut roster, &active, a, Position::GK, LIMIT).unwrap();
        assert_eq!(roster.get(a).unwrap().position_log(), &[Position::Bench, Position::GK]);
    }

    #[test]
    fn bench_assignment_marks_inactive() {
        let (mut roster, active, a, _) = setup();
        assign(&mut roster, &active, a, Position::GK, LIMIT).unwrap();
        let displaced = assign(&mut roster, &active, a, Position::Bench, LIMIT).unwrap();
        assert!(displaced.is_empty());
        assert!(!roster.get(a).unwrap().is_active);

        // bench is always accepted, even with nothing enabled
        let empty = ActivePositions::new();
        assert!(assign(&mut roster, &empty, a, Position::Bench, LIMIT).is_ok());
        assert_eq!(roster.get(a).unwrap().position_log().len(), 3);
    }

    #[test]
    fn active_positions_never_hold_bench() {
        let mut active: ActivePositions = [Position::Bench, Position::CM].into_iter().collect();
        assert_eq!(active.len(), 1);
        assert!(!active.insert(Position::Bench));
        assert!(active.accepts(Position::Bench));
        assert!(!active.contains(Position::Bench));
    }
}

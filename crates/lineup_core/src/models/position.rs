use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};

/// A field position or the bench.
///
/// The set is closed: hosts can only enable/disable members of this catalog,
/// never invent new ones. `Bench` is always a valid destination and is never
/// part of the active position set.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    GK,
    LB,
    LCB,
    CB,
    RCB,
    RB,
    LWB,
    RWB,
    CDM,
    LCM,
    CM,
    RCM,
    CAM,
    LM,
    RM,
    LW,
    RW,
    CF,
    LS,
    ST,
    RS,
    Bench,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown position: {0}")]
pub struct UnknownPosition(pub String);

impl Position {
    pub fn is_bench(&self) -> bool {
        matches!(self, Position::Bench)
    }

    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, Position::GK)
    }

    pub fn is_defender(&self) -> bool {
        matches!(
            self,
            Position::LB
                | Position::LCB
                | Position::CB
                | Position::RCB
                | Position::RB
                | Position::LWB
                | Position::RWB
        )
    }

    pub fn is_midfielder(&self) -> bool {
        matches!(
            self,
            Position::CDM
                | Position::LCM
                | Position::CM
                | Position::RCM
                | Position::CAM
                | Position::LM
                | Position::RM
        )
    }

    pub fn is_forward(&self) -> bool {
        matches!(
            self,
            Position::LW | Position::RW | Position::CF | Position::LS | Position::ST | Position::RS
        )
    }

    /// Short tag shown on field markers and queue entries.
    pub fn label(&self) -> &'static str {
        match self {
            Position::GK => "GK",
            Position::LB => "LB",
            Position::LCB => "LCB",
            Position::CB => "CB",
            Position::RCB => "RCB",
            Position::RB => "RB",
            Position::LWB => "LWB",
            Position::RWB => "RWB",
            Position::CDM => "CDM",
            Position::LCM => "LCM",
            Position::CM => "CM",
            Position::RCM => "RCM",
            Position::CAM => "CAM",
            Position::LM => "LM",
            Position::RM => "RM",
            Position::LW => "LW",
            Position::RW => "RW",
            Position::CF => "CF",
            Position::LS => "LS",
            Position::ST => "ST",
            Position::RS => "RS",
            Position::Bench => "Bench",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Position::GK => "Goalkeeper",
            Position::LB => "Left Back",
            Position::LCB => "Left Centre Back",
            Position::CB => "Centre Back",
            Position::RCB => "Right Centre Back",
            Position::RB => "Right Back",
            Position::LWB => "Left Wing Back",
            Position::RWB => "Right Wing Back",
            Position::CDM => "Defensive Midfielder",
            Position::LCM => "Left Centre Midfielder",
            Position::CM => "Centre Midfielder",
            Position::RCM => "Right Centre Midfielder",
            Position::CAM => "Attacking Midfielder",
            Position::LM => "Left Midfielder",
            Position::RM => "Right Midfielder",
            Position::LW => "Left Winger",
            Position::RW => "Right Winger",
            Position::CF => "Centre Forward",
            Position::LS => "Left Striker",
            Position::ST => "Striker",
            Position::RS => "Right Striker",
            Position::Bench => "Bench",
        }
    }

    /// Every field position, in catalog order.
    pub fn field_positions() -> impl Iterator<Item = Position> {
        Position::iter().filter(|p| !p.is_bench())
    }

    /// Positions offered to the coach as addable field tags.
    ///
    /// Paired striker slots (LS/RS) are only reachable through presets.
    pub fn addable() -> Vec<Position> {
        Position::field_positions()
            .filter(|p| !matches!(p, Position::LS | Position::RS))
            .collect()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = UnknownPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Position::iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPosition(wanted.to_string()))
    }
}

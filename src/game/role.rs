//! Role Catalog
//!
//! The fixed set of ten roles, their factions and what each can do at night.

use std::fmt;
use serde::{Serialize, Deserialize};

// =============================================================================
// FACTION
// =============================================================================

/// Side a role plays for. Decides win counting and who casts kill votes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    /// The hidden killers.
    Mafia,
    /// Everyone else.
    Town,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::Mafia => write!(f, "Mafia"),
            Faction::Town => write!(f, "Town"),
        }
    }
}

// =============================================================================
// CAPABILITY
// =============================================================================

/// The single effect a role produces when it acts at night.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Cannot act.
    None,
    /// Learns the target's role.
    RevealRole,
    /// Negates a kill on the target.
    Protect,
    /// Learns how many votes the target drew in the previous voting phase.
    RevealVoteCount,
    /// Learns whether any killer targeted the target.
    DetectAttack,
    /// Nullifies the target's own night action.
    Block,
    /// Casts a kill vote.
    Kill,
}

// =============================================================================
// ROLE
// =============================================================================

/// One of the ten catalog roles.
///
/// Declaration order is catalog order; [`Role::ALL`] follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Role {
    /// Plain townsperson, no night action.
    Civilian = 0,
    /// Scout: geolocates the target and learns its role.
    Geointer = 1,
    /// Shields the target from the night kill.
    Doxer = 2,
    /// Digs up how many votes the target got yesterday.
    Osinter = 3,
    /// Infiltrator: breaks into the target and learns its role.
    Xinter = 4,
    /// Watches the target for an attack.
    Huminter = 5,
    /// Blocks the target's action for the night.
    Swatter = 6,
    /// Mafia killer.
    Hacker = 7,
    /// Mafia killer.
    Ddoser = 8,
    /// Mafia killer.
    Doser = 9,
}

impl Role {
    /// Full catalog in order.
    pub const ALL: [Role; 10] = [
        Role::Civilian,
        Role::Geointer,
        Role::Doxer,
        Role::Osinter,
        Role::Xinter,
        Role::Huminter,
        Role::Swatter,
        Role::Hacker,
        Role::Ddoser,
        Role::Doser,
    ];

    /// Number of distinct roles, which also caps the roster size.
    pub const COUNT: usize = Self::ALL.len();

    /// Faction this role belongs to.
    #[inline]
    pub fn faction(self) -> Faction {
        match self {
            Role::Hacker | Role::Ddoser | Role::Doser => Faction::Mafia,
            _ => Faction::Town,
        }
    }

    /// Night capability of this role.
    pub fn capability(self) -> Capability {
        match self {
            Role::Civilian => Capability::None,
            Role::Geointer | Role::Xinter => Capability::RevealRole,
            Role::Doxer => Capability::Protect,
            Role::Osinter => Capability::RevealVoteCount,
            Role::Huminter => Capability::DetectAttack,
            Role::Swatter => Capability::Block,
            Role::Hacker | Role::Ddoser | Role::Doser => Capability::Kill,
        }
    }

    /// Is this a Mafia role?
    #[inline]
    pub fn is_mafia(self) -> bool {
        self.faction() == Faction::Mafia
    }

    /// Can this role submit a night action at all?
    #[inline]
    pub fn can_act(self) -> bool {
        self.capability() != Capability::None
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Role::Civilian => "Civilian",
            Role::Geointer => "Geointer",
            Role::Doxer => "Doxer",
            Role::Osinter => "Osinter",
            Role::Xinter => "Xinter",
            Role::Huminter => "Huminter",
            Role::Swatter => "Swatter",
            Role::Hacker => "Hacker",
            Role::Ddoser => "Ddoser",
            Role::Doser => "Doser",
        }
    }

    /// Get role from catalog index (0-9).
    pub fn from_index(index: u8) -> Option<Role> {
        Self::ALL.get(index as usize).copied()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

//! Card effects
//!
//! Effects are intentionally untargeted: they are described relative to the
//! controller of the spell or ability that produces them.

use crate::core::ManaMap;
use serde::{Deserialize, Serialize};

/// What a spell or ability does when it resolves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Add mana to the controller's pool
    AddMana(ManaMap),

    /// Controller gains life
    GainLife { amount: i32 },

    /// Controller draws cards
    DrawCards { count: u8 },

    /// Deal damage to the controller's opponent
    DamageOpponent { amount: i32 },
}

impl Effect {
    pub fn is_mana_effect(&self) -> bool {
        matches!(self, Effect::AddMana(_))
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effect::AddMana(mana) => write!(f, "add {mana}"),
            Effect::GainLife { amount } => write!(f, "gain {amount} life"),
            Effect::DrawCards { count } => write!(f, "draw {count} card(s)"),
            Effect::DamageOpponent { amount } => write!(f, "deal {amount} damage to opponent"),
        }
    }
}

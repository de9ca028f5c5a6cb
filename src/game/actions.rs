//! Action messages
//!
//! Everything that changes the match travels as one of these messages on the
//! match's message bus. Players post `Player`/`Special` messages through their
//! input source; the timeline posts `TurnBased` ones; the state-based action
//! sweep posts `StateBased` ones.

use crate::core::{CardId, PermanentId, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actions a player initiates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Cast a spell from hand
    CastSpell { card: CardId },

    /// Activate ability `index` of a permanent
    ActivateAbility { permanent: PermanentId, index: usize },

    DeclareAttacker { attacker: PermanentId },

    /// Two-step block: first name the blocker (`attacker: None`), then the
    /// attacker it blocks
    DeclareBlocker {
        blocker: PermanentId,
        attacker: Option<PermanentId>,
    },

    Discard { card: CardId },

    /// Pick which cost representation pays for the spell being cast
    SelectCostMap { index: usize },

    PassPriority,

    Concede,

    EndDeclareAttackers,

    EndDeclareBlockers,
}

/// Actions that don't use the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialAction {
    PlayLand { card: CardId },
}

/// Rule-mandated actions fired at fixed points of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnBasedAction {
    /// Phasing (no permanents phase in this engine yet)
    Phasing,
    Untap,
    Upkeep,
    Draw,
    DeclareAttackers,
    DeclareBlockers,
    DamageAssignmentOrder,
    AssignCombatDamage,
    DealCombatDamage,
    EndOfCombat,
    DiscardToHandSize,
    Cleanup,
    ClearManaPools,
}

/// Conditions checked continuously and applied in batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateBasedAction {
    /// Creature with damage marked at least equal to its toughness
    LethalDamage(PermanentId),

    ZeroToughness(PermanentId),

    ZeroLife(PlayerId),

    DrewFromEmptyLibrary(PlayerId),
}

/// A message on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionMessage {
    Player { player: PlayerId, action: PlayerAction },
    Special { player: PlayerId, action: SpecialAction },
    TurnBased(TurnBasedAction),
    StateBased(StateBasedAction),
}

/// Handler table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Player,
    Special,
    TurnBased,
    StateBased,
}

impl ActionMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            ActionMessage::Player { .. } => MessageKind::Player,
            ActionMessage::Special { .. } => MessageKind::Special,
            ActionMessage::TurnBased(_) => MessageKind::TurnBased,
            ActionMessage::StateBased(_) => MessageKind::StateBased,
        }
    }

    /// The player who posted the message, for player and special actions
    pub fn actor(&self) -> Option<PlayerId> {
        match self {
            ActionMessage::Player { player, .. } | ActionMessage::Special { player, .. } => Some(*player),
            _ => None,
        }
    }
}

impl fmt::Display for ActionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionMessage::Player { player, action } => write!(f, "player {player}: {action:?}"),
            ActionMessage::Special { player, action } => write!(f, "player {player}: {action:?}"),
            ActionMessage::TurnBased(action) => write!(f, "turn-based: {action:?}"),
            ActionMessage::StateBased(action) => write!(f, "state-based: {action:?}"),
        }
    }
}

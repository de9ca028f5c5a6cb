//! Player representation

use crate::core::{CardId, GameEntity, ManaMap, ManaPayment, PermanentId, PlayerId, PlayerName};
use crate::zones::{Zone, ZoneKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a player is doing right now
///
/// Exactly one holds per player at any time. Only the rule enforcer moves a
/// player between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    Active,
    Nonactive,
    Attacking,
    Defending,
    Prioritized,
    Paying,
    CastingSpell,
    ActivatingAbility,
    Discarding,
    ChoosingBlockTarget,
    TakingSpecialAction,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PlayerState::Active => "active",
            PlayerState::Nonactive => "nonactive",
            PlayerState::Attacking => "attacking",
            PlayerState::Defending => "defending",
            PlayerState::Prioritized => "prioritized",
            PlayerState::Paying => "paying",
            PlayerState::CastingSpell => "casting spell",
            PlayerState::ActivatingAbility => "activating ability",
            PlayerState::Discarding => "discarding",
            PlayerState::ChoosingBlockTarget => "choosing block target",
            PlayerState::TakingSpecialAction => "taking special action",
        };
        write!(f, "{s}")
    }
}

/// Represents a player in the match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique ID for this player (also its seat index)
    pub id: PlayerId,

    pub name: PlayerName,

    pub life: i32,

    pub library: Zone<CardId>,

    pub hand: Zone<CardId>,

    pub graveyard: Zone<CardId>,

    /// Unspent mana, emptied at the end of every step and main phase
    pub mana_pool: ManaMap,

    /// Cost currently being paid, if any
    pub payment: Option<ManaPayment>,

    pub state: PlayerState,

    /// Active or Nonactive, depending on whose turn it is
    pub baseline: PlayerState,

    /// The engine is waiting for this player to act
    pub needs_input: bool,

    pub passed_priority: bool,

    pub declaring_attackers: bool,

    pub declaring_blockers: bool,

    /// Blocker chosen in the first half of a two-step block declaration
    pub pending_blocker: Option<PermanentId>,

    /// Spell on the stack waiting for a cost representation to be chosen
    pub pending_cost_choice: Option<CardId>,

    pub lands_played_this_turn: u8,

    /// Maximum lands per turn (usually 1)
    pub max_lands_per_turn: u8,

    /// Cards still owed to the graveyard during cleanup
    pub cards_to_discard: usize,

    pub drew_from_empty_library: bool,

    pub has_lost: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            library: Zone::new(ZoneKind::Library, Some(id)),
            hand: Zone::new(ZoneKind::Hand, Some(id)),
            graveyard: Zone::new(ZoneKind::Graveyard, Some(id)),
            mana_pool: ManaMap::new(),
            payment: None,
            state: PlayerState::Nonactive,
            baseline: PlayerState::Nonactive,
            needs_input: false,
            passed_priority: false,
            declaring_attackers: false,
            declaring_blockers: false,
            pending_blocker: None,
            pending_cost_choice: None,
            lands_played_this_turn: 0,
            max_lands_per_turn: 1,
            cards_to_discard: 0,
            drew_from_empty_library: false,
            has_lost: false,
        }
    }

    pub fn gain_life(&mut self, amount: i32) {
        self.life += amount;
    }

    /// Lose life. Reaching zero is handled by the state-based action sweep.
    pub fn lose_life(&mut self, amount: i32) {
        self.life -= amount;
    }

    /// Move the top card of the library to hand
    ///
    /// Drawing from an empty library flags the player for the state-based
    /// action sweep instead of failing.
    pub fn draw_card(&mut self) -> Option<CardId> {
        match self.library.draw_top() {
            Some(card) => {
                self.hand.add(card);
                Some(card)
            }
            None => {
                self.drew_from_empty_library = true;
                None
            }
        }
    }

    pub fn can_play_land(&self) -> bool {
        self.lands_played_this_turn < self.max_lands_per_turn
    }

    pub fn play_land(&mut self) {
        self.lands_played_this_turn += 1;
    }

    pub fn reset_lands_played(&mut self) {
        self.lands_played_this_turn = 0;
    }

    pub fn empty_mana_pool(&mut self) {
        self.mana_pool.clear();
    }

    /// Return to Active/Nonactive
    pub fn reset_state(&mut self) {
        self.state = self.baseline;
    }

    pub fn is_paying(&self) -> bool {
        self.state == PlayerState::Paying
    }

    pub fn is_declaring(&self) -> bool {
        self.declaring_attackers || self.declaring_blockers
    }

    /// Mana added by an effect: paid straight into a pending payment, or
    /// left in the pool
    pub fn add_mana(&mut self, mana: &ManaMap) {
        match self.payment.as_mut() {
            Some(payment) => payment.apply_added_mana(mana, &mut self.mana_pool),
            None => self.mana_pool.add_map(mana),
        }
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

//! Permanents: cards on the battlefield

use crate::core::{Card, CardId, CardName, CardType, Color, GameEntity, PermanentId, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A card instance on the battlefield
///
/// Carries the mutable combat/state flags a bare `Card` doesn't have. The
/// printed characteristics needed for rules checks are copied in at creation
/// so the battlefield can be queried without going back to the card store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permanent {
    pub id: PermanentId,

    /// The card this permanent represents
    pub card: CardId,

    pub name: CardName,

    pub owner: PlayerId,

    pub controller: PlayerId,

    pub types: SmallVec<[CardType; 2]>,

    pub colors: SmallVec<[Color; 2]>,

    pub power: i32,

    pub toughness: i32,

    pub tapped: bool,

    pub attacking: bool,

    pub blocking: bool,

    pub blocked: bool,

    /// Entered the battlefield since its controller's most recent turn began
    pub summoning_sick: bool,

    /// Damage marked this turn (removed during cleanup)
    pub damage: i32,

    pub phased_out: bool,
}

impl Permanent {
    /// Put a card onto the battlefield under `controller`
    pub fn from_card(id: PermanentId, card: &Card, controller: PlayerId) -> Self {
        Permanent {
            id,
            card: card.id,
            name: card.name.clone(),
            owner: card.owner,
            controller,
            types: card.types.clone(),
            colors: card.colors.clone(),
            power: card.power.unwrap_or(0),
            toughness: card.toughness.unwrap_or(0),
            tapped: false,
            attacking: false,
            blocking: false,
            blocked: false,
            summoning_sick: true,
            damage: 0,
            phased_out: false,
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    pub fn current_power(&self) -> i32 {
        self.power
    }

    pub fn current_toughness(&self) -> i32 {
        self.toughness
    }

    pub fn mark_damage(&mut self, amount: i32) {
        self.damage += amount.max(0);
    }

    /// Damage still needed to destroy this creature
    pub fn lethal_damage_remaining(&self) -> i32 {
        (self.current_toughness() - self.damage).max(0)
    }

    /// State-based check: zero toughness or damage at least equal to toughness
    pub fn should_be_destroyed(&self) -> bool {
        self.is_creature() && (self.current_toughness() <= 0 || self.damage >= self.current_toughness())
    }

    /// Can this creature be declared as an attacker right now?
    pub fn can_attack(&self) -> bool {
        self.is_creature() && !self.tapped && !self.summoning_sick && !self.phased_out && !self.attacking
    }

    pub fn can_block(&self) -> bool {
        self.is_creature() && !self.tapped && !self.phased_out && !self.blocking
    }

    /// Clear combat flags at end of combat
    pub fn remove_from_combat(&mut self) {
        self.attacking = false;
        self.blocking = false;
        self.blocked = false;
    }
}

impl GameEntity<Permanent> for Permanent {
    fn id(&self) -> PermanentId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

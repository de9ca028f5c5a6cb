//! Card types and definitions

use crate::core::{AdditionalCost, CardId, CardName, Color, Effect, GameEntity, ManaMap, PlayerId, Subtype};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Card types in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Enchantment,
    Artifact,
    Land,
    Planeswalker,
}

impl CardType {
    /// Types whose cards become permanents
    pub fn is_permanent_type(&self) -> bool {
        !matches!(self, CardType::Instant | CardType::Sorcery)
    }
}

/// An activated ability printed on a card ("[cost]: [effect]")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedAbility {
    pub mana_cost: ManaMap,
    pub additional: AdditionalCost,
    pub effect: Effect,
}

impl ActivatedAbility {
    /// "{T}: Add {mana}"
    pub fn tap_for_mana(mana: ManaMap) -> Self {
        ActivatedAbility {
            mana_cost: ManaMap::new(),
            additional: AdditionalCost::Tap,
            effect: Effect::AddMana(mana),
        }
    }

    /// Mana abilities produce mana and don't use the stack (MTG Rules 605.1a)
    pub fn is_mana_ability(&self) -> bool {
        self.effect.is_mana_effect()
    }

    pub fn requires_tap(&self) -> bool {
        self.additional == AdditionalCost::Tap
    }
}

/// Immutable card template
///
/// Instances live in the match's card store for the whole match; zones only
/// hold `CardId`s. Mutable battlefield state lives on `Permanent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,

    pub name: CardName,

    /// Alternative ways to pay for the card; the first is the printed cost
    pub costs: SmallVec<[ManaMap; 1]>,

    pub types: SmallVec<[CardType; 2]>,

    pub subtypes: SmallVec<[Subtype; 2]>,

    pub colors: SmallVec<[Color; 2]>,

    pub power: Option<i32>,

    pub toughness: Option<i32>,

    /// Activated abilities (available while on the battlefield)
    pub abilities: Vec<ActivatedAbility>,

    /// Effect applied when a non-permanent spell resolves
    pub spell_effect: Option<Effect>,

    /// Player who owns this card (never changes)
    pub owner: PlayerId,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<CardName>, owner: PlayerId) -> Self {
        Card {
            id,
            name: name.into(),
            costs: SmallVec::new(),
            types: SmallVec::new(),
            subtypes: SmallVec::new(),
            colors: SmallVec::new(),
            power: None,
            toughness: None,
            abilities: Vec::new(),
            spell_effect: None,
            owner,
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

    pub fn is_permanent(&self) -> bool {
        self.types.iter().any(|t| t.is_permanent_type())
    }

    pub fn has_color(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    /// Printed cost (cost option 0), or free if the card has none
    pub fn printed_cost(&self) -> ManaMap {
        self.costs.first().copied().unwrap_or_default()
    }

    /// Derive card colors from the printed cost
    pub fn derive_colors(&mut self) {
        self.colors = self.printed_cost().colors().collect();
    }
}

impl GameEntity<Card> for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

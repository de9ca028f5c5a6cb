//! Card definitions and the built-in card database
//!
//! A `CardDefinition` is the printed card; `instantiate` turns it into a
//! `Card` with an ID and owner for one match.

use crate::core::{
    ActivatedAbility, Card, CardId, CardName, CardType, Color, Effect, ManaMap, PlayerId, Subtype,
};
use crate::{MtgError, Result};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Creates cards by name
pub trait CardFactory {
    /// Build card `name` with the given ID and owner
    ///
    /// Unknown names fail with `MtgError::ResourceNotFound`.
    fn create_card(&self, name: &str, id: CardId, owner: PlayerId) -> Result<Card>;
}

/// Printed characteristics of a card
#[derive(Debug, Clone)]
pub struct CardDefinition {
    pub name: CardName,
    pub costs: SmallVec<[ManaMap; 1]>,
    pub types: SmallVec<[CardType; 2]>,
    pub subtypes: SmallVec<[Subtype; 2]>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub abilities: Vec<ActivatedAbility>,
    pub spell_effect: Option<Effect>,
}

impl CardDefinition {
    pub fn new(name: &str, card_type: CardType) -> Self {
        CardDefinition {
            name: CardName::new(name),
            costs: SmallVec::new(),
            types: smallvec::smallvec![card_type],
            subtypes: SmallVec::new(),
            power: None,
            toughness: None,
            abilities: Vec::new(),
            spell_effect: None,
        }
    }

    /// Add a cost representation ("1G", "R", "" for free)
    pub fn cost(mut self, cost: &str) -> Self {
        self.costs.push(ManaMap::from_string(cost));
        self
    }

    pub fn subtype(mut self, subtype: &str) -> Self {
        self.subtypes.push(Subtype::new(subtype));
        self
    }

    pub fn body(mut self, power: i32, toughness: i32) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    pub fn ability(mut self, ability: ActivatedAbility) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn effect(mut self, effect: Effect) -> Self {
        self.spell_effect = Some(effect);
        self
    }

    /// Create a card instance from this definition
    pub fn instantiate(&self, id: CardId, owner: PlayerId) -> Card {
        let mut card = Card::new(id, self.name.clone(), owner);
        card.costs = self.costs.clone();
        card.types = self.types.clone();
        card.subtypes = self.subtypes.clone();
        card.power = self.power;
        card.toughness = self.toughness;
        card.abilities = self.abilities.clone();
        card.spell_effect = self.spell_effect.clone();
        // Colors come from every cost option, so hybrid-style cards are both
        let mut colors: SmallVec<[Color; 2]> = SmallVec::new();
        for cost in &self.costs {
            for color in cost.colors() {
                if !colors.contains(&color) {
                    colors.push(color);
                }
            }
        }
        card.colors = colors;
        card
    }
}

/// Card definitions keyed by lowercase name
#[derive(Debug, Clone, Default)]
pub struct CardDatabase {
    cards: FxHashMap<String, CardDefinition>,
}

impl CardDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Basic lands plus a handful of creatures and spells
    pub fn builtin() -> Self {
        let mut db = CardDatabase::new();

        for (name, symbol) in [
            ("Plains", "W"),
            ("Island", "U"),
            ("Swamp", "B"),
            ("Mountain", "R"),
            ("Forest", "G"),
            ("Wastes", "C"),
        ] {
            let mut land = CardDefinition::new(name, CardType::Land)
                .ability(ActivatedAbility::tap_for_mana(ManaMap::from_string(symbol)));
            if name != "Wastes" {
                land = land.subtype(name);
            }
            db.add_card(land);
        }

        let creatures = [
            ("Grizzly Bears", "1G", "Bear", 2, 2),
            ("Hill Giant", "3R", "Giant", 3, 3),
            ("Savannah Lions", "W", "Cat", 2, 1),
            ("Gray Ogre", "2R", "Ogre", 2, 2),
            ("Llanowar Elves", "G", "Elf", 1, 1),
        ];
        for (name, cost, subtype, power, toughness) in creatures {
            let mut creature = CardDefinition::new(name, CardType::Creature)
                .cost(cost)
                .subtype(subtype)
                .body(power, toughness);
            if name == "Llanowar Elves" {
                creature = creature.ability(ActivatedAbility::tap_for_mana(ManaMap::from_string("G")));
            }
            db.add_card(creature);
        }

        let mut ornithopter = CardDefinition::new("Ornithopter", CardType::Artifact)
            .cost("0")
            .subtype("Thopter")
            .body(0, 2);
        ornithopter.types.push(CardType::Creature);
        db.add_card(ornithopter);

        let mut memnite = CardDefinition::new("Memnite", CardType::Artifact)
            .cost("0")
            .subtype("Construct")
            .body(1, 1);
        memnite.types.push(CardType::Creature);
        db.add_card(memnite);

        // Two ways to pay: red or white
        db.add_card(
            CardDefinition::new("Boros Recruit", CardType::Creature)
                .cost("R")
                .cost("W")
                .subtype("Goblin")
                .body(1, 1),
        );
        db.add_card(
            CardDefinition::new("Dryad Militant", CardType::Creature)
                .cost("G")
                .cost("W")
                .subtype("Dryad")
                .body(2, 1),
        );

        db.add_card(
            CardDefinition::new("Lightning Bolt", CardType::Instant)
                .cost("R")
                .effect(Effect::DamageOpponent { amount: 3 }),
        );
        db.add_card(
            CardDefinition::new("Healing Salve", CardType::Instant)
                .cost("W")
                .effect(Effect::GainLife { amount: 3 }),
        );
        db.add_card(
            CardDefinition::new("Divination", CardType::Sorcery)
                .cost("2U")
                .effect(Effect::DrawCards { count: 2 }),
        );
        db.add_card(
            CardDefinition::new("Ancestral Vision", CardType::Sorcery)
                .effect(Effect::DrawCards { count: 3 }),
        );

        db
    }

    /// Add a single card definition to the database
    pub fn add_card(&mut self, definition: CardDefinition) {
        self.cards.insert(definition.name.lookup_key(), definition);
    }

    /// Look up a card by name (case-insensitive)
    pub fn get_card(&self, name: &str) -> Option<&CardDefinition> {
        self.cards.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Names of every card, sorted
    pub fn card_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cards.values().map(|d| d.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl CardFactory for CardDatabase {
    fn create_card(&self, name: &str, id: CardId, owner: PlayerId) -> Result<Card> {
        self.get_card(name)
            .map(|definition| definition.instantiate(id, owner))
            .ok_or_else(|| MtgError::ResourceNotFound(format!("card not found in database: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_empty_database() {
        let db = CardDatabase::new();
        assert_eq!(db.len(), 0);
        assert!(db.is_empty());
        assert!(db.get_card("Lightning Bolt").is_none());
    }

    #[test]
    fn test_builtin_lookup_is_case_insensitive() {
        let db = CardDatabase::builtin();
        assert!(db.contains("Lightning Bolt"));
        assert!(db.contains("lightning bolt"));
        assert!(db.contains("FOREST"));
    }

    #[test]
    fn test_create_card() {
        let db = CardDatabase::builtin();
        let bears = db
            .create_card("Grizzly Bears", EntityId::new(5), EntityId::new(1))
            .unwrap();
        assert_eq!(bears.id, EntityId::new(5));
        assert_eq!(bears.owner, EntityId::new(1));
        assert!(bears.is_creature());
        assert_eq!(bears.power, Some(2));
        assert_eq!(bears.printed_cost(), ManaMap::from_string("1G"));
        assert!(bears.has_color(Color::Green));
    }

    #[test]
    fn test_unknown_card_is_resource_error() {
        let db = CardDatabase::builtin();
        let err = db
            .create_card("Black Lotus", EntityId::new(2), EntityId::new(0))
            .unwrap_err();
        assert!(matches!(err, MtgError::ResourceNotFound(_)));
    }

    #[test]
    fn test_lands_tap_for_their_color() {
        let db = CardDatabase::builtin();
        let island = db.create_card("Island", EntityId::new(2), EntityId::new(0)).unwrap();
        assert!(island.is_land());
        assert_eq!(island.abilities.len(), 1);
        assert_eq!(
            island.abilities[0].effect,
            Effect::AddMana(ManaMap::from_string("U"))
        );
        assert!(island.colors.is_empty());
    }

    #[test]
    fn test_multiple_cost_options() {
        let db = CardDatabase::builtin();
        let recruit = db
            .create_card("Boros Recruit", EntityId::new(2), EntityId::new(0))
            .unwrap();
        assert_eq!(recruit.costs.len(), 2);
        assert!(recruit.has_color(Color::Red));
        assert!(recruit.has_color(Color::White));
    }

    #[test]
    fn test_free_spells() {
        let db = CardDatabase::builtin();
        let thopter = db
            .create_card("Ornithopter", EntityId::new(2), EntityId::new(0))
            .unwrap();
        assert!(thopter.printed_cost().is_empty());
        assert!(thopter.is_creature());

        let vision = db
            .create_card("Ancestral Vision", EntityId::new(3), EntityId::new(0))
            .unwrap();
        assert!(vision.costs.is_empty());
        assert!(!vision.is_permanent());
    }
}

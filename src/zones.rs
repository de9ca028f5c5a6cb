//! Game zones (Library, Hand, Graveyard, Battlefield, etc.)

use crate::core::{Card, CardId, CardType, Color, EntityStore, Permanent, PermanentId, PlayerId};
use serde::{Deserialize, Serialize};

/// Different zones where cards can exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Stack,
}

/// Anything a zone can hold: bare card IDs or battlefield permanents
pub trait ZoneObject {
    fn card_id(&self) -> CardId;
}

impl ZoneObject for CardId {
    fn card_id(&self) -> CardId {
        *self
    }
}

impl ZoneObject for Permanent {
    fn card_id(&self) -> CardId {
        self.card
    }
}

/// An ordered zone
///
/// The last element is the top (for Library/Graveyard). Shared zones
/// (battlefield, exile) have no owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone<T> {
    pub kind: ZoneKind,

    pub owner: Option<PlayerId>,

    items: Vec<T>,
}

impl<T> Zone<T> {
    pub fn new(kind: ZoneKind, owner: Option<PlayerId>) -> Self {
        Zone {
            kind,
            owner,
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    /// Add to bottom (for Library)
    pub fn add_to_bottom(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Take from top (for Library)
    pub fn draw_top(&mut self) -> Option<T> {
        self.items.pop()
    }

    pub fn peek_top(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Remove the first item matching `pred`, keeping the order of the rest
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Option<T> {
        // remove() instead of swap_remove(): iteration order must stay
        // deterministic for input sources that pick "the first" option.
        let pos = self.items.iter().position(pred)?;
        Some(self.items.remove(pos))
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.items.shuffle(rng);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: ZoneObject> Zone<T> {
    pub fn contains(&self, card: CardId) -> bool {
        self.items.iter().any(|item| item.card_id() == card)
    }

    pub fn remove(&mut self, card: CardId) -> Option<T> {
        self.remove_where(|item| item.card_id() == card)
    }

    /// Items whose card has the given type
    pub fn with_type<'a>(
        &'a self,
        cards: &'a EntityStore<Card>,
        card_type: CardType,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.items.iter().filter(move |item| {
            cards
                .get(item.card_id())
                .map(|c| c.is_type(card_type))
                .unwrap_or(false)
        })
    }

    /// Items whose card has the given color
    pub fn with_color<'a>(
        &'a self,
        cards: &'a EntityStore<Card>,
        color: Color,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.items.iter().filter(move |item| {
            cards
                .get(item.card_id())
                .map(|c| c.has_color(color))
                .unwrap_or(false)
        })
    }

    /// Items whose card is owned by `player`
    pub fn owned_by<'a>(
        &'a self,
        cards: &'a EntityStore<Card>,
        player: PlayerId,
    ) -> impl Iterator<Item = &'a T> + 'a {
        self.items.iter().filter(move |item| {
            cards
                .get(item.card_id())
                .map(|c| c.owner == player)
                .unwrap_or(false)
        })
    }
}

impl Zone<Permanent> {
    pub fn get(&self, id: PermanentId) -> Option<&Permanent> {
        self.items.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: PermanentId) -> Option<&mut Permanent> {
        self.items.iter_mut().find(|p| p.id == id)
    }

    pub fn remove_permanent(&mut self, id: PermanentId) -> Option<Permanent> {
        self.remove_where(|p| p.id == id)
    }

    pub fn controlled_by(&self, player: PlayerId) -> impl Iterator<Item = &Permanent> + '_ {
        self.items.iter().filter(move |p| p.controller == player)
    }

    pub fn creatures_controlled_by(&self, player: PlayerId) -> impl Iterator<Item = &Permanent> + '_ {
        self.controlled_by(player).filter(|p| p.is_creature())
    }
}

//! The stack: spells waiting to resolve

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

/// A card on the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub card: CardId,

    pub controller: PlayerId,

    /// Which of the card's cost representations pays for it; `None` while
    /// the caster is still choosing
    pub cost_index: Option<usize>,
}

impl Spell {
    pub fn new(card: CardId, controller: PlayerId) -> Self {
        Spell {
            card,
            controller,
            cost_index: None,
        }
    }
}

/// Last in, first out. Index 0 is the top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stack {
    items: Vec<Spell>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, spell: Spell) {
        self.items.insert(0, spell);
    }

    pub fn pop(&mut self) -> Option<Spell> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.items.remove(0))
        }
    }

    pub fn peek(&self) -> Option<&Spell> {
        self.items.first()
    }

    pub fn find_mut(&mut self, card: CardId) -> Option<&mut Spell> {
        self.items.iter_mut().find(|s| s.card == card)
    }

    /// Take a specific spell off the stack (abandoned cast)
    pub fn remove(&mut self, card: CardId) -> Option<Spell> {
        let pos = self.items.iter().position(|s| s.card == card)?;
        Some(self.items.remove(pos))
    }

    pub fn contains(&self, card: CardId) -> bool {
        self.items.iter().any(|s| s.card == card)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Top first
    pub fn iter(&self) -> std::slice::Iter<'_, Spell> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityId;

    #[test]
    fn test_lifo() {
        let mut stack = Stack::new();
        let a = Spell::new(EntityId::new(1), EntityId::new(0));
        let b = Spell::new(EntityId::new(2), EntityId::new(0));

        stack.push(a);
        stack.push(b);

        assert_eq!(stack.peek(), Some(&b));
        assert_eq!(stack.pop(), Some(b));
        assert_eq!(stack.pop(), Some(a));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_remove_specific_spell() {
        let mut stack = Stack::new();
        stack.push(Spell::new(EntityId::new(1), EntityId::new(0)));
        stack.push(Spell::new(EntityId::new(2), EntityId::new(1)));

        assert!(stack.remove(EntityId::new(1)).is_some());
        assert_eq!(stack.len(), 1);
        assert!(!stack.contains(EntityId::new(1)));
        assert!(stack.contains(EntityId::new(2)));
    }
}

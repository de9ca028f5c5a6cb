//! Match initialization from decks

use crate::config::MatchConfig;
use crate::core::EntityId;
use crate::game::Match;
use crate::loader::{CardFactory, DeckList};
use crate::Result;

/// Builds matches from deck lists and a card factory
pub struct MatchInitializer<'a> {
    factory: &'a dyn CardFactory,
}

impl<'a> MatchInitializer<'a> {
    pub fn new(factory: &'a dyn CardFactory) -> Self {
        MatchInitializer { factory }
    }

    /// Create a match with each player's main deck in their library
    ///
    /// Libraries are shuffled when the match begins, not here.
    pub fn init_match(&self, config: MatchConfig, decks: [&DeckList; 2]) -> Result<Match> {
        let mut game = Match::new(config)?;
        for (seat, deck) in decks.into_iter().enumerate() {
            let owner = EntityId::new(seat as u32);
            for entry in &deck.main_deck {
                for _ in 0..entry.count {
                    game.add_card_to_library(owner, &entry.card_name, self.factory)?;
                }
            }
        }
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{CardDatabase, DeckEntry, DeckLoader};
    use crate::MtgError;

    #[test]
    fn test_init_simple_match() {
        let deck = DeckLoader::parse(
            r#"
[Main]
20 Mountain
40 Lightning Bolt
"#,
        )
        .unwrap();

        let db = CardDatabase::builtin();
        let game = MatchInitializer::new(&db)
            .init_match(MatchConfig::default(), [&deck, &deck])
            .unwrap();

        assert_eq!(game.players[0].library.len(), 60);
        assert_eq!(game.players[1].library.len(), 60);
        assert_eq!(game.cards.len(), 120);
        assert!(!game.is_started());
    }

    #[test]
    fn test_missing_card_error() {
        let deck = DeckList {
            name: None,
            main_deck: vec![DeckEntry {
                card_name: "Nonexistent Card".to_string(),
                count: 1,
            }],
            sideboard: vec![],
        };

        let db = CardDatabase::builtin();
        let result = MatchInitializer::new(&db).init_match(MatchConfig::default(), [&deck, &deck]);
        assert!(matches!(result, Err(MtgError::ResourceNotFound(_))));
    }
}

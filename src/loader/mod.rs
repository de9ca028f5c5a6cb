//! Card and deck loaders

pub mod card_db;
pub mod deck;
pub mod game_init;

pub use card_db::{CardDatabase, CardDefinition, CardFactory};
pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::MatchInitializer;

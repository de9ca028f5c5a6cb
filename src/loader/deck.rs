//! Deck file loader (.dck format)

use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Deck loader for .dck files
pub struct DeckLoader;

impl DeckLoader {
    /// Load a deck from a .dck file
    pub fn load_from_file(path: &Path) -> Result<DeckList> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                MtgError::ResourceNotFound(format!("deck file {}", path.display()))
            }
            _ => MtgError::IoError(e),
        })?;
        Self::parse(&content)
    }

    /// Parse a deck from its text content
    ///
    /// Lines are `N Card Name` (optionally `N Card Name|SET`). Section headers
    /// are in brackets; everything after `[Sideboard]` goes to the sideboard.
    /// Blank lines, `#` comments and `key=value` metadata are skipped.
    pub fn parse(content: &str) -> Result<DeckList> {
        let mut main_deck = Vec::new();
        let mut sideboard = Vec::new();
        let mut in_sideboard = false;
        let mut name = None;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                in_sideboard = line.eq_ignore_ascii_case("[sideboard]");
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                if key.trim().eq_ignore_ascii_case("name") {
                    name = Some(value.trim().to_string());
                }
                continue;
            }

            let Some((count_str, rest)) = line.split_once(' ') else {
                return Err(MtgError::InvalidDeckFormat(format!(
                    "line {}: expected `<count> <card name>`, got `{line}`",
                    line_no + 1
                )));
            };
            let count = count_str.parse::<u8>().map_err(|_| {
                MtgError::InvalidDeckFormat(format!(
                    "line {}: bad card count `{count_str}`",
                    line_no + 1
                ))
            })?;

            // Card name is everything before an optional set code
            let card_name = match rest.split_once('|') {
                Some((name, _set)) => name.trim().to_string(),
                None => rest.trim().to_string(),
            };

            let entry = DeckEntry { card_name, count };
            if in_sideboard {
                sideboard.push(entry);
            } else {
                main_deck.push(entry);
            }
        }

        if main_deck.is_empty() {
            return Err(MtgError::InvalidDeckFormat("Empty deck".to_string()));
        }

        Ok(DeckList {
            name,
            main_deck,
            sideboard,
        })
    }
}

/// Represents a deck entry (card name and count)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    pub card_name: String,
    pub count: u8,
}

/// Represents a complete deck list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckList {
    pub name: Option<String>,
    pub main_deck: Vec<DeckEntry>,
    pub sideboard: Vec<DeckEntry>,
}

impl DeckList {
    /// Total cards in main deck
    pub fn total_cards(&self) -> usize {
        self.main_deck.iter().map(|e| e.count as usize).sum()
    }

    /// Total cards in sideboard
    pub fn sideboard_size(&self) -> usize {
        self.sideboard.iter().map(|e| e.count as usize).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_deck() {
        let content = r#"
[metadata]
Name=Test Deck

[Main]
20 Mountain
40 Lightning Bolt

[Sideboard]
15 Healing Salve
"#;

        let deck = DeckLoader::parse(content).unwrap();
        assert_eq!(deck.name.as_deref(), Some("Test Deck"));
        assert_eq!(deck.main_deck.len(), 2);
        assert_eq!(deck.total_cards(), 60);

        assert_eq!(deck.main_deck[0].card_name, "Mountain");
        assert_eq!(deck.main_deck[0].count, 20);

        assert_eq!(deck.main_deck[1].card_name, "Lightning Bolt");
        assert_eq!(deck.main_deck[1].count, 40);

        assert_eq!(deck.sideboard.len(), 1);
        assert_eq!(deck.sideboard_size(), 15);
    }

    #[test]
    fn test_set_codes_are_dropped() {
        let deck = DeckLoader::parse("4 Grizzly Bears|M10\n").unwrap();
        assert_eq!(deck.main_deck[0].card_name, "Grizzly Bears");
    }

    #[test]
    fn test_bad_lines_rejected() {
        let err = DeckLoader::parse("[Main]\nfour Forest\n").unwrap_err();
        assert!(matches!(err, MtgError::InvalidDeckFormat(_)));

        let err = DeckLoader::parse("[Main]\nForest\n").unwrap_err();
        assert!(matches!(err, MtgError::InvalidDeckFormat(_)));

        let err = DeckLoader::parse("[Sideboard]\n2 Forest\n").unwrap_err();
        assert!(matches!(err, MtgError::InvalidDeckFormat(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = DeckLoader::load_from_file(Path::new("/nonexistent/deck.dck")).unwrap_err();
        assert!(matches!(err, MtgError::ResourceNotFound(_)));
    }
}

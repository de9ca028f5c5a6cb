//! Strongly-typed string wrappers
//!
//! Newtypes so a card name can't be passed where a player name or subtype is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                $name(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_newtype!(
    /// Card subtype, e.g. "Goblin", "Island"
    Subtype
);

string_newtype!(
    /// Card name
    CardName
);

string_newtype!(
    /// Player name
    PlayerName
);

impl CardName {
    /// Case-insensitive key used for card database lookups
    pub fn lookup_key(&self) -> String {
        self.0.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype() {
        let subtype = Subtype::new("Goblin");
        assert_eq!(subtype.as_str(), "Goblin");
        assert_eq!(subtype.to_string(), "Goblin");
    }

    #[test]
    fn test_card_name_lookup_key() {
        let name = CardName::new("Lightning Bolt");
        assert_eq!(name.lookup_key(), "lightning bolt");
    }

    #[test]
    fn test_player_name_from() {
        let name: PlayerName = "Alice".into();
        assert_eq!(name.as_str(), "Alice");
    }
}

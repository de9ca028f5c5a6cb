//! Mana colors and the ManaMap multiset

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana colors in MTG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// All six kinds of mana, in WUBRG order followed by colorless
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    /// The five true colors
    pub const COLORS: [Color; 5] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Blue => 1,
            Color::Black => 2,
            Color::Red => 3,
            Color::Green => 4,
            Color::Colorless => 5,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Color> {
        match symbol {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "W"),
            Color::Blue => write!(f, "U"),
            Color::Black => write!(f, "B"),
            Color::Red => write!(f, "R"),
            Color::Green => write!(f, "G"),
            Color::Colorless => write!(f, "C"),
        }
    }
}

/// Amount of mana per color
///
/// Used both for mana pools and for costs. In a cost, the colorless slot is
/// generic mana and can be paid with any color. Counts never go negative:
/// every subtraction saturates at zero.
/// Copy-eligible since it's just 6 counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ManaMap {
    counts: [u32; 6],
}

impl ManaMap {
    pub fn new() -> Self {
        ManaMap { counts: [0; 6] }
    }

    /// Parse a mana string like "2RR" or "1UB"
    ///
    /// Digits form the generic (colorless) amount, letters are one mana each.
    pub fn from_string(s: &str) -> Self {
        let mut map = ManaMap::new();
        let mut generic_str = String::new();

        for c in s.chars() {
            if c.is_ascii_digit() {
                generic_str.push(c);
            } else if let Some(color) = Color::from_symbol(c) {
                map.add(color, 1);
            }
        }

        if !generic_str.is_empty() {
            map.add(Color::Colorless, generic_str.parse().unwrap_or(0));
        }

        map
    }

    /// Builder-style helper: `ManaMap::new().with(Color::Red, 2)`
    pub fn with(mut self, color: Color, amount: u32) -> Self {
        self.add(color, amount);
        self
    }

    pub fn get(&self, color: Color) -> u32 {
        self.counts[color.index()]
    }

    pub fn add(&mut self, color: Color, amount: u32) {
        self.counts[color.index()] += amount;
    }

    /// Remove up to `amount` mana of a color; returns how much was removed
    pub fn remove(&mut self, color: Color, amount: u32) -> u32 {
        let slot = &mut self.counts[color.index()];
        let removed = amount.min(*slot);
        *slot -= removed;
        removed
    }

    /// Per-color sum
    pub fn add_map(&mut self, other: &ManaMap) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += *theirs;
        }
    }

    /// Per-color difference, floored at zero
    pub fn saturating_sub(&self, other: &ManaMap) -> ManaMap {
        let mut result = *self;
        for (mine, theirs) in result.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_sub(*theirs);
        }
        result
    }

    /// True when every color count is at least the other's
    pub fn contains(&self, other: &ManaMap) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(mine, theirs)| mine >= theirs)
    }

    /// Converted total of all mana
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn clear(&mut self) {
        self.counts = [0; 6];
    }

    /// Non-zero entries, in WUBRG-then-colorless order
    pub fn iter(&self) -> impl Iterator<Item = (Color, u32)> + '_ {
        Color::ALL
            .iter()
            .map(move |&color| (color, self.get(color)))
            .filter(|&(_, amount)| amount > 0)
    }

    /// True colors with a non-zero count
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        Color::COLORS
            .iter()
            .copied()
            .filter(move |&color| self.get(color) > 0)
    }
}

impl fmt::Display for ManaMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        let generic = self.get(Color::Colorless);
        if generic > 0 {
            write!(f, "{generic}")?;
        }
        for color in Color::COLORS {
            for _ in 0..self.get(color) {
                write!(f, "{color}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mana_string_parsing() {
        let cost = ManaMap::from_string("2RR");
        assert_eq!(cost.get(Color::Colorless), 2);
        assert_eq!(cost.get(Color::Red), 2);
        assert_eq!(cost.total(), 4);

        let cost2 = ManaMap::from_string("1UB");
        assert_eq!(cost2.get(Color::Colorless), 1);
        assert_eq!(cost2.get(Color::Blue), 1);
        assert_eq!(cost2.get(Color::Black), 1);
        assert_eq!(cost2.total(), 3);

        let cost3 = ManaMap::from_string("12");
        assert_eq!(cost3.get(Color::Colorless), 12);
    }

    #[test]
    fn test_remove_never_goes_negative() {
        let mut pool = ManaMap::new().with(Color::Green, 2);
        assert_eq!(pool.remove(Color::Green, 5), 2);
        assert_eq!(pool.get(Color::Green), 0);
        assert_eq!(pool.remove(Color::Blue, 1), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_sum_and_difference() {
        let mut cost = ManaMap::from_string("1R");
        cost.add_map(&ManaMap::from_string("1"));
        assert_eq!(cost, ManaMap::from_string("2R"));

        let reduced = cost.saturating_sub(&ManaMap::from_string("3G"));
        assert_eq!(reduced, ManaMap::from_string("R"));
    }

    #[test]
    fn test_contains() {
        let pool = ManaMap::from_string("2RRU");
        assert!(pool.contains(&ManaMap::from_string("RU")));
        assert!(!pool.contains(&ManaMap::from_string("RRR")));
    }

    #[test]
    fn test_display() {
        assert_eq!(ManaMap::from_string("2RRG").to_string(), "2RRG");
        assert_eq!(ManaMap::new().to_string(), "0");
    }

    #[test]
    fn test_iter_skips_zero_counts() {
        let pool = ManaMap::from_string("1WG");
        let entries: Vec<_> = pool.iter().collect();
        assert_eq!(
            entries,
            vec![(Color::White, 1), (Color::Green, 1), (Color::Colorless, 1)]
        );
        let colors: Vec<_> = pool.colors().collect();
        assert_eq!(colors, vec![Color::White, Color::Green]);
    }
}

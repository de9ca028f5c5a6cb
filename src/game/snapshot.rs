//! Match snapshots
//!
//! A `MatchSnapshot` is a serializable export of the visible match state, for
//! debugging and for tools that render or analyse finished matches. The engine
//! never reads one back.

use crate::core::{ManaMap, Permanent, PlayerId, PlayerState};
use crate::game::combat::CombatState;
use crate::game::match_state::{Match, MatchResult};
use crate::game::phase::{PhaseType, StepType};
use crate::game::stack::Spell;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub life: i32,
    pub state: PlayerState,
    pub library_size: usize,
    /// Card names, bottom to top
    pub hand: Vec<String>,
    pub graveyard: Vec<String>,
    pub mana_pool: ManaMap,
    pub lands_played_this_turn: u8,
    pub has_lost: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub turn_number: u32,
    pub active_player: Option<PlayerId>,
    pub phase: Option<PhaseType>,
    pub step: Option<StepType>,
    pub prioritized_player: Option<PlayerId>,
    pub players: Vec<PlayerSnapshot>,
    pub battlefield: Vec<Permanent>,
    /// Top first
    pub stack: Vec<Spell>,
    pub combat: CombatState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MatchResult>,
}

impl MatchSnapshot {
    pub fn capture(game: &Match) -> Self {
        let names = |cards: &[crate::core::CardId]| -> Vec<String> {
            cards
                .iter()
                .map(|&id| {
                    game.card(id)
                        .map(|c| c.name.to_string())
                        .unwrap_or_else(|_| format!("#{id}"))
                })
                .collect()
        };

        let players = game
            .players
            .iter()
            .map(|p| PlayerSnapshot {
                id: p.id,
                name: p.name.to_string(),
                life: p.life,
                state: p.state,
                library_size: p.library.len(),
                hand: names(p.hand.as_slice()),
                graveyard: names(p.graveyard.as_slice()),
                mana_pool: p.mana_pool,
                lands_played_this_turn: p.lands_played_this_turn,
                has_lost: p.has_lost,
            })
            .collect();

        MatchSnapshot {
            turn_number: game.turn_number,
            active_player: game.active_player(),
            phase: game.phase_type(),
            step: game.step_type(),
            prioritized_player: game.prioritized_player,
            players,
            battlefield: game.battlefield.as_slice().to_vec(),
            stack: game.stack.iter().copied().collect(),
            combat: game.combat.clone(),
            result: game.result().copied(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MtgError::SerializationError(e.to_string()))
    }

    /// Save this snapshot to a pretty-printed JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::core::EntityId;
    use crate::loader::CardDatabase;

    fn begun_match() -> Match {
        let config = MatchConfig {
            seed: Some(3),
            ..MatchConfig::default()
        };
        let mut game = Match::new(config).unwrap();
        game.logger.enable_capture();
        let db = CardDatabase::builtin();
        for seat in 0..2u32 {
            for _ in 0..10 {
                game.add_card_to_library(EntityId::new(seat), "Island", &db)
                    .unwrap();
            }
        }
        game.update().unwrap();
        game
    }

    #[test]
    fn test_capture_counts() {
        let game = begun_match();
        let snapshot = MatchSnapshot::capture(&game);

        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].hand.len(), 7);
        assert_eq!(snapshot.players[0].library_size, 3);
        assert!(snapshot.players[0].hand.iter().all(|n| n == "Island"));
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn test_json_shape() {
        let game = begun_match();
        let json = MatchSnapshot::capture(&game).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["turn_number"], 0);
        assert_eq!(value["players"][1]["life"], 20);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_save_to_file() {
        let game = begun_match();
        let path = std::env::temp_dir().join(format!("mtg-snapshot-{}.json", std::process::id()));
        MatchSnapshot::capture(&game).save_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"turn_number\": 0"));
        std::fs::remove_file(&path).unwrap();
    }
}

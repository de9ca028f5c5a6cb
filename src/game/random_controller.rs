//! Random controller for testing and baseline play
//!
//! Picks uniformly among the legal intents. Seeded controllers are fully
//! deterministic.

use crate::core::PlayerId;
use crate::game::controller::{InputSource, Intent, MatchView};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

pub struct RandomController {
    player_id: PlayerId,
    name: String,
    rng: ChaCha12Rng,
}

impl RandomController {
    /// Create a random controller seeded from system entropy
    pub fn new(player_id: PlayerId) -> Self {
        Self::from_rng(player_id, ChaCha12Rng::from_entropy())
    }

    /// Create a random controller with a seeded RNG (for deterministic testing)
    pub fn with_seed(player_id: PlayerId, seed: u64) -> Self {
        Self::from_rng(player_id, ChaCha12Rng::seed_from_u64(seed))
    }

    fn from_rng(player_id: PlayerId, rng: ChaCha12Rng) -> Self {
        RandomController {
            player_id,
            name: format!("random-{player_id}"),
            rng,
        }
    }
}

impl InputSource for RandomController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn choose_intent(&mut self, _view: &MatchView, intents: &[Intent]) -> Option<Intent> {
        if intents.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..intents.len());
        Some(intents[index])
    }
}

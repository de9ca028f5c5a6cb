//! Zero controller for testing and automation
//!
//! Always takes the first legal intent. Candidate intents list productive
//! options before passing, so a zero controller plays lands, casts what it can
//! afford and attacks with everything.

use crate::core::PlayerId;
use crate::game::controller::{InputSource, Intent, MatchView};

pub struct ZeroController {
    player_id: PlayerId,
    name: String,
}

impl ZeroController {
    pub fn new(player_id: PlayerId) -> Self {
        ZeroController {
            player_id,
            name: format!("zero-{player_id}"),
        }
    }
}

impl InputSource for ZeroController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn choose_intent(&mut self, _view: &MatchView, intents: &[Intent]) -> Option<Intent> {
        intents.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::core::EntityId;
    use crate::game::actions::{PlayerAction, SpecialAction};
    use crate::game::Match;

    #[test]
    fn test_zero_controller_chooses_first() {
        let game = Match::new(MatchConfig::default()).unwrap();
        let player_id = EntityId::new(0);
        let mut controller = ZeroController::new(player_id);
        let view = MatchView::new(&game, player_id);

        let intents = [
            Intent::Special(SpecialAction::PlayLand {
                card: EntityId::new(10),
            }),
            Intent::Player(PlayerAction::PassPriority),
        ];
        assert_eq!(controller.choose_intent(&view, &intents), Some(intents[0]));
    }

    #[test]
    fn test_zero_controller_empty_intents() {
        let game = Match::new(MatchConfig::default()).unwrap();
        let player_id = EntityId::new(1);
        let mut controller = ZeroController::new(player_id);
        let view = MatchView::new(&game, player_id);

        assert_eq!(controller.choose_intent(&view, &[]), None);
        assert_eq!(controller.name(), "zero-1");
    }
}

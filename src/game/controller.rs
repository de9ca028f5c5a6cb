//! Input sources and the read-only match view
//!
//! The engine never calls out for decisions. It raises `needs_input` (or a
//! declaring flag) on a player and returns; the driver then asks that player's
//! `InputSource` to act, and the source posts messages back through the match.

use crate::core::{
    CardId, CardType, Effect, ManaMap, ManaPayment, PaymentPurpose, Permanent, PermanentId, Player,
    PlayerId, PlayerState,
};
use crate::game::actions::{ActionMessage, PlayerAction, SpecialAction};
use crate::game::logger::VerbosityLevel;
use crate::game::match_state::Match;
use crate::{MtgError, Result};

/// Something a player can do right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Player(PlayerAction),
    Special(SpecialAction),
}

impl Intent {
    pub fn into_message(self, player: PlayerId) -> ActionMessage {
        match self {
            Intent::Player(action) => ActionMessage::Player { player, action },
            Intent::Special(action) => ActionMessage::Special { player, action },
        }
    }
}

/// Read-only view of the match from one player's seat
pub struct MatchView<'a> {
    game: &'a Match,
    player_id: PlayerId,
}

impl<'a> MatchView<'a> {
    pub fn new(game: &'a Match, player_id: PlayerId) -> Self {
        MatchView { game, player_id }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn game(&self) -> &'a Match {
        self.game
    }

    pub fn player(&self) -> Option<&'a Player> {
        self.game.player(self.player_id).ok()
    }

    pub fn hand(&self) -> &'a [CardId] {
        self.player().map(|p| p.hand.as_slice()).unwrap_or(&[])
    }

    /// Permanents this player controls
    pub fn permanents(&self) -> impl Iterator<Item = &'a Permanent> + 'a {
        self.game.battlefield.controlled_by(self.player_id)
    }

    pub fn card_name(&self, card: CardId) -> Option<&'a str> {
        self.game.card(card).ok().map(|c| c.name.as_str())
    }

    pub fn life(&self) -> i32 {
        self.player().map(|p| p.life).unwrap_or(0)
    }

    pub fn state(&self) -> Option<PlayerState> {
        self.player().map(|p| p.state)
    }

    pub fn mana_pool(&self) -> ManaMap {
        self.player().map(|p| p.mana_pool).unwrap_or_default()
    }

    pub fn is_active_player(&self) -> bool {
        self.game.active_player() == Some(self.player_id)
    }
}

/// A source of player decisions (AI, script, UI)
///
/// The intent methods post the corresponding message and return the engine's
/// verdict. `on_input_requested` is called by the driver whenever the engine
/// is waiting on this player.
pub trait InputSource {
    fn player_id(&self) -> PlayerId;

    fn name(&self) -> &str;

    /// Pick one of the currently legal intents, or `None` to do nothing
    fn choose_intent(&mut self, view: &MatchView, intents: &[Intent]) -> Option<Intent>;

    /// Called when the match ends (for cleanup/logging)
    fn on_match_end(&mut self, _view: &MatchView, _won: bool) {}

    fn on_input_requested(&mut self, game: &mut Match) -> Result<()> {
        let player = self.player_id();
        let intents = candidate_intents(game, player);
        let view = MatchView::new(game, player);
        match self.choose_intent(&view, &intents) {
            Some(intent) => self.submit(game, intent),
            None => Ok(()),
        }
    }

    fn submit(&mut self, game: &mut Match, intent: Intent) -> Result<()> {
        game.post(intent.into_message(self.player_id()))
    }

    fn cast_spell(&mut self, game: &mut Match, card: CardId) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::CastSpell { card }))
    }

    fn play_land(&mut self, game: &mut Match, card: CardId) -> Result<()> {
        self.submit(game, Intent::Special(SpecialAction::PlayLand { card }))
    }

    fn activate_ability(&mut self, game: &mut Match, permanent: PermanentId, index: usize) -> Result<()> {
        self.submit(
            game,
            Intent::Player(PlayerAction::ActivateAbility { permanent, index }),
        )
    }

    fn declare_attacker(&mut self, game: &mut Match, attacker: PermanentId) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::DeclareAttacker { attacker }))
    }

    fn end_declare_attackers(&mut self, game: &mut Match) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::EndDeclareAttackers))
    }

    /// First call names the blocker, second call names what it blocks
    fn declare_blocker(
        &mut self,
        game: &mut Match,
        blocker: PermanentId,
        attacker: Option<PermanentId>,
    ) -> Result<()> {
        self.submit(
            game,
            Intent::Player(PlayerAction::DeclareBlocker { blocker, attacker }),
        )
    }

    fn end_declare_blockers(&mut self, game: &mut Match) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::EndDeclareBlockers))
    }

    fn discard(&mut self, game: &mut Match, card: CardId) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::Discard { card }))
    }

    fn select_cost_map(&mut self, game: &mut Match, index: usize) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::SelectCostMap { index }))
    }

    fn pass_priority(&mut self, game: &mut Match) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::PassPriority))
    }

    fn concede(&mut self, game: &mut Match) -> Result<()> {
        self.submit(game, Intent::Player(PlayerAction::Concede))
    }
}

/// Mana ability `index` of `permanent` could be activated right now
fn usable_mana_ability(game: &Match, permanent: &Permanent) -> Option<(usize, ManaMap)> {
    let card = game.card(permanent.card).ok()?;
    card.abilities.iter().enumerate().find_map(|(index, ability)| {
        let Effect::AddMana(mana) = ability.effect else {
            return None;
        };
        if !ability.mana_cost.is_empty() {
            return None;
        }
        if ability.requires_tap() && (permanent.tapped || (permanent.is_creature() && permanent.summoning_sick)) {
            return None;
        }
        Some((index, mana))
    })
}

/// Pool plus everything the player's untapped mana sources could add
fn potential_mana(game: &Match, player: &Player) -> ManaMap {
    let mut total = player.mana_pool;
    for permanent in game.battlefield.controlled_by(player.id) {
        if let Some((_, mana)) = usable_mana_ability(game, permanent) {
            total.add_map(&mana);
        }
    }
    total
}

fn can_afford(game: &Match, player: &Player, card: CardId) -> bool {
    let Ok(definition) = game.card(card) else {
        return false;
    };
    let available = potential_mana(game, player);
    if definition.costs.is_empty() {
        return true;
    }
    definition.costs.iter().any(|cost| {
        ManaPayment::new(PaymentPurpose::Spell(card), *cost).can_be_paid_from(&available)
    })
}

/// Everything `player` may legally attempt right now, in a stable order
///
/// Productive intents come first and the "do nothing" intent (pass, end
/// declaration) last, so picking the first entry always makes progress.
pub fn candidate_intents(game: &Match, player: PlayerId) -> Vec<Intent> {
    let mut intents = Vec::new();
    let Ok(p) = game.player(player) else {
        return intents;
    };
    if !game.is_running() {
        return intents;
    }

    if p.declaring_attackers {
        for creature in game.battlefield.creatures_controlled_by(player) {
            if creature.can_attack() && !game.combat.is_attacking(creature.id) {
                intents.push(Intent::Player(PlayerAction::DeclareAttacker {
                    attacker: creature.id,
                }));
            }
        }
        intents.push(Intent::Player(PlayerAction::EndDeclareAttackers));
        return intents;
    }

    if p.declaring_blockers {
        match p.pending_blocker {
            Some(blocker) => {
                for attack in &game.combat.attacks {
                    intents.push(Intent::Player(PlayerAction::DeclareBlocker {
                        blocker,
                        attacker: Some(attack.attacker),
                    }));
                }
            }
            None if !game.combat.is_empty() => {
                for creature in game.battlefield.creatures_controlled_by(player) {
                    if creature.can_block() && !game.combat.is_blocking(creature.id) {
                        intents.push(Intent::Player(PlayerAction::DeclareBlocker {
                            blocker: creature.id,
                            attacker: None,
                        }));
                    }
                }
            }
            None => {}
        }
        intents.push(Intent::Player(PlayerAction::EndDeclareBlockers));
        return intents;
    }

    if !p.needs_input {
        return intents;
    }

    match p.state {
        PlayerState::Discarding => {
            for &card in p.hand.iter() {
                intents.push(Intent::Player(PlayerAction::Discard { card }));
            }
        }
        PlayerState::CastingSpell => {
            if let Some(card) = p.pending_cost_choice {
                // Affordable options first
                let available = potential_mana(game, p);
                let costs = game.card(card).map(|c| c.costs.as_slice()).unwrap_or(&[]);
                let (affordable, rest): (Vec<usize>, Vec<usize>) = (0..costs.len()).partition(|&i| {
                    ManaPayment::new(PaymentPurpose::Spell(card), costs[i]).can_be_paid_from(&available)
                });
                for index in affordable.into_iter().chain(rest) {
                    intents.push(Intent::Player(PlayerAction::SelectCostMap { index }));
                }
            }
            intents.push(Intent::Player(PlayerAction::PassPriority));
        }
        PlayerState::Paying => {
            if let Some(payment) = &p.payment {
                let remaining = payment.remaining().total();
                for permanent in game.battlefield.controlled_by(player) {
                    let Some((index, mana)) = usable_mana_ability(game, permanent) else {
                        continue;
                    };
                    let mut trial = payment.clone();
                    let mut scratch = p.mana_pool;
                    trial.apply_added_mana(&mana, &mut scratch);
                    if trial.remaining().total() < remaining {
                        intents.push(Intent::Player(PlayerAction::ActivateAbility {
                            permanent: permanent.id,
                            index,
                        }));
                    }
                }
            }
            intents.push(Intent::Player(PlayerAction::PassPriority));
        }
        PlayerState::Prioritized => {
            let sorcery_speed = game.active_player() == Some(player) && game.in_main_phase();
            if sorcery_speed {
                for &card in p.hand.iter() {
                    let Ok(definition) = game.card(card) else {
                        continue;
                    };
                    if definition.is_land() {
                        if game.stack.is_empty() && p.can_play_land() {
                            intents.push(Intent::Special(SpecialAction::PlayLand { card }));
                        }
                    } else if (game.stack.is_empty() || definition.is_type(CardType::Instant))
                        && can_afford(game, p, card)
                    {
                        intents.push(Intent::Player(PlayerAction::CastSpell { card }));
                    }
                }
            }
            intents.push(Intent::Player(PlayerAction::PassPriority));
        }
        _ => {}
    }
    intents
}

/// The "do nothing" response for whatever the engine is waiting on
///
/// Used by drivers when a source's choice was rejected.
pub fn fallback_intent(game: &Match, player: PlayerId) -> Result<Intent> {
    let p = game.player(player)?;
    let action = if p.declaring_attackers {
        PlayerAction::EndDeclareAttackers
    } else if p.declaring_blockers {
        PlayerAction::EndDeclareBlockers
    } else if p.state == PlayerState::Discarding {
        let card = p
            .hand
            .peek_top()
            .copied()
            .ok_or(MtgError::EntityNotFound(player.as_u32()))?;
        PlayerAction::Discard { card }
    } else {
        PlayerAction::PassPriority
    };
    Ok(Intent::Player(action))
}

/// Let every awaited source act once
///
/// A choice the engine rejects as illegal is logged and replaced with the
/// source's fallback, so a confused source can never stall the match. Any
/// other error is returned.
pub fn service_input(game: &mut Match, sources: &mut [Box<dyn InputSource>]) -> Result<()> {
    let awaiting: Vec<PlayerId> = game.awaiting_players().collect();
    for player in awaiting {
        if !game.is_running() {
            break;
        }
        let Some(source) = sources.iter_mut().find(|s| s.player_id() == player) else {
            continue;
        };
        match source.on_input_requested(game) {
            Ok(()) => {}
            Err(MtgError::IllegalAction(reason)) => {
                game.logger.log_args(
                    VerbosityLevel::Normal,
                    "input",
                    format_args!("{} chose an illegal action ({reason}), falling back", source.name()),
                );
                let fallback = fallback_intent(game, player)?;
                source.submit(game, fallback)?;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// One driver iteration: advance the match, then collect pending input
pub fn tick(game: &mut Match, sources: &mut [Box<dyn InputSource>]) -> Result<()> {
    game.update()?;
    service_input(game, sources)
}

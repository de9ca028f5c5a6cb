//! Rule enforcement
//!
//! The rule enforcer is the only subscriber on the match's message bus. It
//! validates player and special actions, applies turn-based actions, collects
//! state-based actions, resolves the stack and decides who holds priority.
//!
//! Every check runs before any mutation, so a rejected action leaves the match
//! exactly as it was.

use crate::core::{
    AdditionalCost, CardId, CardType, Effect, ManaPayment, PaymentPurpose, PermanentId, PlayerId, PlayerState,
};
use crate::error::IllegalAction;
use crate::game::actions::{
    ActionMessage, MessageKind, PlayerAction, SpecialAction, StateBasedAction, TurnBasedAction,
};
use crate::game::bus::MessageBus;
use crate::game::combat::{Attack, Attackable, DamageRecipient};
use crate::game::logger::VerbosityLevel;
use crate::game::match_state::{seat, Match, MatchEndReason};
use crate::game::phase::StepType;
use crate::game::stack::Spell;
use crate::Result;
use std::mem;

fn reject<T>(reason: IllegalAction) -> Result<T> {
    Err(reason.into())
}

pub struct RuleEnforcer;

impl RuleEnforcer {
    pub fn subscribe(bus: &mut MessageBus) {
        bus.subscribe(MessageKind::Player, Self::on_player_action);
        bus.subscribe(MessageKind::Special, Self::on_special_action);
        bus.subscribe(MessageKind::TurnBased, Self::on_turn_based_action);
        bus.subscribe(MessageKind::StateBased, Self::on_state_based_action);
    }

    // ----- Player actions -----

    fn on_player_action(game: &mut Match, message: &ActionMessage) -> Result<()> {
        let ActionMessage::Player { player, action } = *message else {
            return Ok(());
        };

        if action == PlayerAction::Concede {
            return Self::concede(game, player);
        }
        Self::check_can_act(game, player)?;

        match action {
            PlayerAction::CastSpell { card } => Self::cast_spell(game, player, card),
            PlayerAction::SelectCostMap { index } => Self::select_cost_map(game, player, index),
            PlayerAction::ActivateAbility { permanent, index } => {
                Self::activate_ability(game, player, permanent, index)
            }
            PlayerAction::PassPriority => Self::pass_priority(game, player),
            PlayerAction::DeclareAttacker { attacker } => Self::declare_attacker(game, player, attacker),
            PlayerAction::EndDeclareAttackers => Self::end_declare_attackers(game, player),
            PlayerAction::DeclareBlocker { blocker, attacker } => {
                Self::declare_blocker(game, player, blocker, attacker)
            }
            PlayerAction::EndDeclareBlockers => Self::end_declare_blockers(game, player),
            PlayerAction::Discard { card } => Self::discard(game, player, card),
            PlayerAction::Concede => unreachable!("handled above"),
        }
    }

    /// Only the player the engine is waiting on may act
    fn check_can_act(game: &Match, player: PlayerId) -> Result<()> {
        if !game.is_running() {
            return reject(IllegalAction::MatchNotRunning);
        }
        let p = game.player(player)?;
        if !p.needs_input && !p.is_declaring() {
            return reject(IllegalAction::NotYourTurnToAct(player.as_u32()));
        }
        Ok(())
    }

    /// The player must hold priority with nothing half-done
    fn check_prioritized(game: &Match, player: PlayerId) -> Result<()> {
        match game.player(player)?.state {
            PlayerState::Prioritized => Ok(()),
            PlayerState::Paying | PlayerState::CastingSpell | PlayerState::ActivatingAbility => {
                reject(IllegalAction::PaymentInProgress)
            }
            _ => reject(IllegalAction::NotYourTurnToAct(player.as_u32())),
        }
    }

    fn concede(game: &mut Match, player: PlayerId) -> Result<()> {
        let p = game.player_mut(player)?;
        p.has_lost = true;
        p.needs_input = false;
        let name = p.name.clone();
        game.logger
            .log_args(VerbosityLevel::Minimal, "action", format_args!("{name} concedes"));
        game.end_match(MatchEndReason::Concession(player));
        Ok(())
    }

    fn cast_spell(game: &mut Match, player: PlayerId, card: CardId) -> Result<()> {
        Self::check_prioritized(game, player)?;
        if game.active_player() != Some(player) {
            return reject(IllegalAction::NotActivePlayer);
        }
        if !game.in_main_phase() {
            return reject(IllegalAction::NotMainPhase);
        }
        if !game.players[seat(player)].hand.contains(card) {
            return reject(IllegalAction::CardNotInHand(card.as_u32()));
        }
        let definition = game.card(card)?;
        if definition.is_land() {
            return reject(IllegalAction::CannotCastLand(card.as_u32()));
        }
        if !definition.is_type(CardType::Instant) && !game.stack.is_empty() {
            return reject(IllegalAction::StackNotEmpty);
        }
        let cost_options = definition.costs.len();
        let name = definition.name.clone();

        let p = &mut game.players[seat(player)];
        p.hand.remove(card);
        p.state = PlayerState::CastingSpell;
        game.stack.push(Spell::new(card, player));
        game.logger.log_args(
            VerbosityLevel::Normal,
            "action",
            format_args!("{} casts {name}", game.players[seat(player)].name),
        );

        if cost_options > 1 {
            game.players[seat(player)].pending_cost_choice = Some(card);
            return Ok(());
        }
        Self::begin_spell_payment(game, player, card, 0)
    }

    fn select_cost_map(game: &mut Match, player: PlayerId, index: usize) -> Result<()> {
        let p = game.player(player)?;
        let card = match p.pending_cost_choice {
            Some(card) if p.state == PlayerState::CastingSpell => card,
            _ => return reject(IllegalAction::NoCostChoicePending),
        };
        if index >= game.card(card)?.costs.len() {
            return reject(IllegalAction::NoSuchCostOption(index));
        }

        game.players[seat(player)].pending_cost_choice = None;
        Self::begin_spell_payment(game, player, card, index)
    }

    /// Start paying cost option `index` of a spell that is already on the stack
    fn begin_spell_payment(game: &mut Match, player: PlayerId, card: CardId, index: usize) -> Result<()> {
        let cost = game.card(card)?.costs.get(index).copied().unwrap_or_default();
        if let Some(spell) = game.stack.find_mut(card) {
            spell.cost_index = Some(index);
        }

        let mut payment = ManaPayment::new(PaymentPurpose::Spell(card), cost);
        if payment.is_free() {
            return Self::finish_action(game, player);
        }

        let p = &mut game.players[seat(player)];
        payment.pay_from_pool(&mut p.mana_pool);
        if payment.is_complete() {
            return Self::finish_action(game, player);
        }
        p.payment = Some(payment);
        p.state = PlayerState::Paying;
        p.needs_input = true;
        Ok(())
    }

    /// Cast, ability or land done: everyone gets a fresh chance to respond
    fn finish_action(game: &mut Match, player: PlayerId) -> Result<()> {
        let p = &mut game.players[seat(player)];
        p.payment = None;
        p.pending_cost_choice = None;
        p.reset_state();
        game.reset_passed_flags();
        Self::derive_priority(game);
        Ok(())
    }

    fn activate_ability(
        game: &mut Match,
        player: PlayerId,
        permanent: PermanentId,
        index: usize,
    ) -> Result<()> {
        let state = game.player(player)?.state;
        if !matches!(
            state,
            PlayerState::Prioritized | PlayerState::Paying | PlayerState::ActivatingAbility
        ) {
            return reject(IllegalAction::WrongStateForAbility);
        }

        let source = game.permanent(permanent)?;
        if source.controller != player {
            return reject(IllegalAction::NotYourPermanent(permanent.as_u32()));
        }
        let Some(ability) = game.card(source.card)?.abilities.get(index).cloned() else {
            return reject(IllegalAction::NoSuchAbility(permanent.as_u32(), index));
        };
        if !ability.is_mana_ability() {
            return reject(IllegalAction::AbilityNotSupported);
        }
        if ability.requires_tap() {
            if source.tapped {
                return reject(IllegalAction::PermanentTapped(permanent.as_u32()));
            }
            if source.is_creature() && source.summoning_sick {
                return reject(IllegalAction::SummoningSick(permanent.as_u32()));
            }
        }

        let mut payment = ManaPayment::new(
            PaymentPurpose::Ability {
                source: permanent,
                index,
            },
            ability.mana_cost,
        )
        .with_additional(ability.additional);
        if !payment.is_mana_paid() {
            if state == PlayerState::Paying {
                return reject(IllegalAction::PaymentInProgress);
            }
            if !payment.can_be_paid_from(&game.players[seat(player)].mana_pool) {
                return reject(IllegalAction::InsufficientMana);
            }
        }

        // Costs first: mana from the pool, then the tap
        let was_paying = state == PlayerState::Paying;
        let p = &mut game.players[seat(player)];
        if !was_paying {
            p.state = PlayerState::ActivatingAbility;
        }
        payment.pay_from_pool(&mut p.mana_pool);
        if payment.pay_additional() == AdditionalCost::Tap {
            if let Some(source) = game.battlefield.get_mut(permanent) {
                source.tap();
            }
        }
        debug_assert!(payment.is_complete());

        game.logger.log_args(
            VerbosityLevel::Verbose,
            "action",
            format_args!(
                "{} activates {}: {}",
                game.players[seat(player)].name,
                game.permanent(permanent)?.name,
                ability.effect
            ),
        );
        Self::apply_effect(game, player, &ability.effect)?;

        if !was_paying {
            return Self::finish_action(game, player);
        }
        let p = &mut game.players[seat(player)];
        let complete = p.payment.as_ref().is_some_and(ManaPayment::is_complete);
        if complete {
            p.state = PlayerState::CastingSpell;
            return Self::finish_action(game, player);
        }
        Ok(())
    }

    fn pass_priority(game: &mut Match, player: PlayerId) -> Result<()> {
        let p = game.player(player)?;
        if p.is_declaring()
            || matches!(
                p.state,
                PlayerState::Discarding | PlayerState::ChoosingBlockTarget
            )
        {
            return reject(IllegalAction::CannotPassPriority);
        }

        if matches!(p.state, PlayerState::Paying | PlayerState::CastingSpell) {
            Self::abandon_cast(game, player);
        }

        let p = &mut game.players[seat(player)];
        p.passed_priority = true;
        p.reset_state();
        p.needs_input = false;
        game.prioritized_player = None;
        game.logger.log_args(
            VerbosityLevel::Verbose,
            "action",
            format_args!("{} passes priority", game.players[seat(player)].name),
        );
        Ok(())
    }

    /// Back out of a half-finished cast: paid mana returns to the pool and
    /// the card returns to hand
    fn abandon_cast(game: &mut Match, player: PlayerId) {
        let p = &mut game.players[seat(player)];
        let payment = p.payment.take();
        let pending = p.pending_cost_choice.take();
        if let Some(payment) = &payment {
            p.mana_pool.add_map(&payment.already_paid);
        }
        let card = match payment.map(|payment| payment.purpose) {
            Some(PaymentPurpose::Spell(card)) => Some(card),
            _ => pending,
        };
        if let Some(card) = card {
            if game.stack.remove(card).is_some() {
                game.players[seat(player)].hand.add(card);
            }
        }
    }

    fn declare_attacker(game: &mut Match, player: PlayerId, attacker: PermanentId) -> Result<()> {
        if !game.player(player)?.declaring_attackers {
            return reject(IllegalAction::NotDeclaringAttackers);
        }
        let creature = game.permanent(attacker)?;
        if creature.controller != player {
            return reject(IllegalAction::NotYourPermanent(attacker.as_u32()));
        }
        if !creature.is_creature() {
            return reject(IllegalAction::NotACreature(attacker.as_u32()));
        }
        if creature.attacking || game.combat.is_attacking(attacker) {
            return reject(IllegalAction::AlreadyInCombat(attacker.as_u32()));
        }
        if creature.tapped {
            return reject(IllegalAction::PermanentTapped(attacker.as_u32()));
        }
        if creature.summoning_sick {
            return reject(IllegalAction::SummoningSick(attacker.as_u32()));
        }

        let defender = game.opponent(player);
        let Some(creature) = game.battlefield.get_mut(attacker) else {
            return reject(IllegalAction::NotYourPermanent(attacker.as_u32()));
        };
        let attack = Attack::new(creature, &game.players[seat(defender)]);
        game.combat.attacks.push(attack);

        game.logger.log_args(
            VerbosityLevel::Normal,
            "combat",
            format_args!(
                "{} attacks {}",
                game.permanent(attacker)?.name,
                game.players[seat(defender)].name
            ),
        );
        Ok(())
    }

    fn end_declare_attackers(game: &mut Match, player: PlayerId) -> Result<()> {
        let p = game.player_mut(player)?;
        if !p.declaring_attackers {
            return reject(IllegalAction::NotDeclaringAttackers);
        }
        p.declaring_attackers = false;
        p.needs_input = false;
        p.reset_state();

        if game.combat.is_empty() {
            if let Some(turn) = game.turn.as_mut() {
                turn.skip_step(StepType::DeclareBlockers);
                turn.skip_step(StepType::CombatDamage);
            }
        }
        Ok(())
    }

    fn declare_blocker(
        game: &mut Match,
        player: PlayerId,
        blocker: PermanentId,
        attacker: Option<PermanentId>,
    ) -> Result<()> {
        let p = game.player(player)?;
        if !p.declaring_blockers {
            return reject(IllegalAction::NotDeclaringBlockers);
        }
        let pending = p.pending_blocker;

        let Some(attacker) = attacker else {
            let creature = game.permanent(blocker)?;
            if creature.controller != player {
                return reject(IllegalAction::NotYourPermanent(blocker.as_u32()));
            }
            if !creature.is_creature() {
                return reject(IllegalAction::NotACreature(blocker.as_u32()));
            }
            if creature.tapped {
                return reject(IllegalAction::PermanentTapped(blocker.as_u32()));
            }
            if creature.blocking || game.combat.is_blocking(blocker) {
                return reject(IllegalAction::AlreadyInCombat(blocker.as_u32()));
            }
            let p = &mut game.players[seat(player)];
            p.pending_blocker = Some(blocker);
            p.state = PlayerState::ChoosingBlockTarget;
            return Ok(());
        };

        if pending != Some(blocker) {
            return reject(IllegalAction::NoBlockerChosen);
        }
        if !game.combat.is_attacking(attacker) {
            return reject(IllegalAction::NotAttacking(attacker.as_u32()));
        }

        game.combat.attack_of_mut(attacker).add_blocker(blocker);
        if let Some(creature) = game.battlefield.get_mut(blocker) {
            creature.blocking = true;
        }
        if let Some(creature) = game.battlefield.get_mut(attacker) {
            creature.blocked = true;
        }
        let p = &mut game.players[seat(player)];
        p.pending_blocker = None;
        p.state = PlayerState::Defending;

        game.logger.log_args(
            VerbosityLevel::Normal,
            "combat",
            format_args!(
                "{} blocks {}",
                game.permanent(blocker)?.name,
                game.permanent(attacker)?.name
            ),
        );
        Ok(())
    }

    fn end_declare_blockers(game: &mut Match, player: PlayerId) -> Result<()> {
        let p = game.player_mut(player)?;
        if !p.declaring_blockers {
            return reject(IllegalAction::NotDeclaringBlockers);
        }
        p.declaring_blockers = false;
        p.pending_blocker = None;
        p.needs_input = false;
        p.reset_state();
        Ok(())
    }

    fn discard(game: &mut Match, player: PlayerId, card: CardId) -> Result<()> {
        let p = game.player(player)?;
        if p.state != PlayerState::Discarding {
            return reject(IllegalAction::NotDiscarding);
        }
        if !p.hand.contains(card) {
            return reject(IllegalAction::CardNotInHand(card.as_u32()));
        }
        let name = game.card(card)?.name.clone();

        let p = &mut game.players[seat(player)];
        p.hand.remove(card);
        p.graveyard.add(card);
        p.cards_to_discard = p.cards_to_discard.saturating_sub(1);
        if p.cards_to_discard == 0 {
            p.reset_state();
            p.needs_input = false;
        }
        game.logger.log_args(
            VerbosityLevel::Normal,
            "action",
            format_args!("{} discards {name}", game.players[seat(player)].name),
        );
        Ok(())
    }

    // ----- Special actions -----

    fn on_special_action(game: &mut Match, message: &ActionMessage) -> Result<()> {
        let ActionMessage::Special { player, action } = *message else {
            return Ok(());
        };
        Self::check_can_act(game, player)?;

        match action {
            SpecialAction::PlayLand { card } => Self::play_land(game, player, card),
        }
    }

    fn play_land(game: &mut Match, player: PlayerId, card: CardId) -> Result<()> {
        Self::check_prioritized(game, player)?;
        if game.active_player() != Some(player) {
            return reject(IllegalAction::NotActivePlayer);
        }
        if !game.in_main_phase() {
            return reject(IllegalAction::NotMainPhase);
        }
        if !game.stack.is_empty() {
            return reject(IllegalAction::StackNotEmpty);
        }
        let p = &game.players[seat(player)];
        if !p.can_play_land() {
            return reject(IllegalAction::LandAlreadyPlayed);
        }
        if !p.hand.contains(card) {
            return reject(IllegalAction::CardNotInHand(card.as_u32()));
        }
        if !game.card(card)?.is_land() {
            return reject(IllegalAction::NotALand(card.as_u32()));
        }

        let p = &mut game.players[seat(player)];
        p.state = PlayerState::TakingSpecialAction;
        p.hand.remove(card);
        p.play_land();
        game.put_onto_battlefield(card, player)?;
        Self::finish_action(game, player)
    }

    // ----- Turn-based actions -----

    fn on_turn_based_action(game: &mut Match, message: &ActionMessage) -> Result<()> {
        let ActionMessage::TurnBased(action) = *message else {
            return Ok(());
        };
        let (Some(active), Some(nonactive)) = (game.active_player(), game.nonactive_player()) else {
            return Ok(());
        };

        match action {
            // Nothing phases in or out yet
            TurnBasedAction::Phasing => {}
            TurnBasedAction::Untap => {
                for permanent in game.battlefield.iter_mut() {
                    if permanent.controller == active {
                        permanent.untap();
                    }
                }
            }
            TurnBasedAction::Upkeep => {}
            TurnBasedAction::Draw => {
                let p = &mut game.players[seat(active)];
                let drawn = p.draw_card();
                let name = p.name.clone();
                match drawn {
                    Some(card) => game.logger.log_args(
                        VerbosityLevel::Verbose,
                        "zone",
                        format_args!("{name} draws {}", game.card(card)?.name),
                    ),
                    None => game.logger.log_args(
                        VerbosityLevel::Normal,
                        "zone",
                        format_args!("{name} cannot draw from an empty library"),
                    ),
                }
            }
            TurnBasedAction::DeclareAttackers => {
                let p = &mut game.players[seat(active)];
                p.declaring_attackers = true;
                p.needs_input = true;
                p.state = PlayerState::Attacking;
            }
            TurnBasedAction::DeclareBlockers => {
                let p = &mut game.players[seat(nonactive)];
                p.declaring_blockers = true;
                p.needs_input = true;
                p.state = PlayerState::Defending;
            }
            TurnBasedAction::DamageAssignmentOrder => game.combat.order_blockers(),
            TurnBasedAction::AssignCombatDamage => game.combat.assign_damage(&game.battlefield),
            TurnBasedAction::DealCombatDamage => Self::deal_combat_damage(game),
            TurnBasedAction::EndOfCombat => {
                for permanent in game.battlefield.iter_mut() {
                    permanent.remove_from_combat();
                }
                game.combat.clear();
                Self::clear_mana_pools(game);
            }
            TurnBasedAction::DiscardToHandSize => {
                let max = game.config.max_hand_size;
                let p = &mut game.players[seat(active)];
                let excess = p.hand.len().saturating_sub(max);
                if excess > 0 {
                    p.cards_to_discard = excess;
                    p.state = PlayerState::Discarding;
                    p.needs_input = true;
                }
            }
            TurnBasedAction::Cleanup => {
                for permanent in game.battlefield.iter_mut() {
                    permanent.damage = 0;
                }
            }
            TurnBasedAction::ClearManaPools => Self::clear_mana_pools(game),
        }
        Ok(())
    }

    /// All assignments land at once
    fn deal_combat_damage(game: &mut Match) {
        for assignment in mem::take(&mut game.combat.assignments) {
            match assignment.recipient {
                DamageRecipient::Player(id) => {
                    game.players[seat(id)].receive_combat_damage(assignment.amount);
                }
                DamageRecipient::Permanent(id) => {
                    if let Some(permanent) = game.battlefield.get_mut(id) {
                        permanent.receive_combat_damage(assignment.amount);
                    }
                }
            }
            game.logger.log_args(
                VerbosityLevel::Verbose,
                "combat",
                format_args!(
                    "{} deals {} damage to {:?}",
                    assignment.source, assignment.amount, assignment.recipient
                ),
            );
        }
    }

    fn clear_mana_pools(game: &mut Match) {
        for player in &mut game.players {
            player.empty_mana_pool();
        }
    }

    // ----- State-based actions -----

    fn on_state_based_action(game: &mut Match, message: &ActionMessage) -> Result<()> {
        if let ActionMessage::StateBased(action) = *message {
            game.pending_state_based_actions.insert(action);
        }
        Ok(())
    }

    /// Current state-based action conditions
    pub fn check_state_based_actions(game: &Match) -> Vec<StateBasedAction> {
        let mut found = Vec::new();
        for permanent in game.battlefield.iter().filter(|p| p.should_be_destroyed()) {
            if permanent.current_toughness() <= 0 {
                found.push(StateBasedAction::ZeroToughness(permanent.id));
            } else {
                found.push(StateBasedAction::LethalDamage(permanent.id));
            }
        }
        for player in game.players.iter().filter(|p| !p.has_lost) {
            if player.life <= 0 {
                found.push(StateBasedAction::ZeroLife(player.id));
            }
            if player.drew_from_empty_library {
                found.push(StateBasedAction::DrewFromEmptyLibrary(player.id));
            }
        }
        found
    }

    /// Sweep and apply state-based actions until none are found
    pub fn process_state_based_actions(game: &mut Match) -> Result<()> {
        while game.is_running() {
            let found = Self::check_state_based_actions(game);
            if found.is_empty() {
                break;
            }
            for action in found {
                game.post(ActionMessage::StateBased(action))?;
            }
            let batch = mem::take(&mut game.pending_state_based_actions);
            Self::apply_state_based_actions(game, batch);
        }
        Ok(())
    }

    fn apply_state_based_actions(
        game: &mut Match,
        batch: impl IntoIterator<Item = StateBasedAction>,
    ) {
        let mut reason = None;
        for action in batch {
            match action {
                StateBasedAction::LethalDamage(id) | StateBasedAction::ZeroToughness(id) => {
                    game.destroy_permanent(id);
                }
                StateBasedAction::ZeroLife(id) => {
                    let p = &mut game.players[seat(id)];
                    p.has_lost = true;
                    game.logger.log_args(
                        VerbosityLevel::Normal,
                        "match",
                        format_args!("{} has no life left", game.players[seat(id)].name),
                    );
                    reason.get_or_insert(MatchEndReason::PlayerDeath(id));
                }
                StateBasedAction::DrewFromEmptyLibrary(id) => {
                    let p = &mut game.players[seat(id)];
                    p.has_lost = true;
                    p.drew_from_empty_library = false;
                    game.logger.log_args(
                        VerbosityLevel::Normal,
                        "match",
                        format_args!("{} drew from an empty library", game.players[seat(id)].name),
                    );
                    reason.get_or_insert(MatchEndReason::Decking(id));
                }
            }
        }
        if let Some(reason) = reason {
            game.end_match(reason);
        }
    }

    // ----- Stack and priority -----

    /// Resolve as many spells as were on the stack when called
    pub fn resolve_stack(game: &mut Match) -> Result<()> {
        let count = game.stack.len();
        for _ in 0..count {
            let Some(spell) = game.stack.pop() else {
                break;
            };
            let card = game.card(spell.card)?;
            let is_permanent = card.is_permanent();
            let effect = card.spell_effect.clone();
            let owner = card.owner;
            game.logger.log_args(
                VerbosityLevel::Normal,
                "stack",
                format_args!("{} resolves", card.name),
            );

            if is_permanent {
                game.put_onto_battlefield(spell.card, spell.controller)?;
            } else {
                if let Some(effect) = effect {
                    Self::apply_effect(game, spell.controller, &effect)?;
                }
                game.players[seat(owner)].graveyard.add(spell.card);
            }

            game.reset_passed_flags();
            Self::derive_priority(game);
        }
        Ok(())
    }

    /// Hand priority to whoever should hold it
    ///
    /// The active player first, unless they passed and are not paying; then
    /// the nonactive player if they have not passed; otherwise no one.
    pub fn derive_priority(game: &mut Match) {
        let (Some(active), Some(nonactive)) = (game.active_player(), game.nonactive_player()) else {
            return;
        };
        let ap = &game.players[seat(active)];
        let target = if !ap.passed_priority || ap.is_paying() {
            Some(active)
        } else if !game.players[seat(nonactive)].passed_priority {
            Some(nonactive)
        } else {
            None
        };

        for player in &mut game.players {
            if Some(player.id) != target && player.state == PlayerState::Prioritized {
                player.reset_state();
                player.needs_input = false;
            }
        }
        if let Some(target) = target {
            let p = &mut game.players[seat(target)];
            if p.state == p.baseline {
                p.state = PlayerState::Prioritized;
            }
            p.needs_input = true;
        }
        if game.prioritized_player != target {
            if let Some(target) = target {
                game.logger.log_args(
                    VerbosityLevel::Verbose,
                    "priority",
                    format_args!("{} has priority", game.players[seat(target)].name),
                );
            }
        }
        game.prioritized_player = target;
    }

    /// Apply an effect controlled by `controller`
    pub fn apply_effect(game: &mut Match, controller: PlayerId, effect: &Effect) -> Result<()> {
        match effect {
            Effect::AddMana(mana) => game.player_mut(controller)?.add_mana(mana),
            Effect::GainLife { amount } => game.player_mut(controller)?.gain_life(*amount),
            Effect::DrawCards { count } => {
                let p = game.player_mut(controller)?;
                for _ in 0..*count {
                    p.draw_card();
                }
            }
            Effect::DamageOpponent { amount } => {
                let opponent = game.opponent(controller);
                game.player_mut(opponent)?.lose_life(*amount);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::core::ManaMap;
    use crate::error::MtgError;
    use crate::loader::CardDatabase;

    fn new_match() -> Match {
        let config = MatchConfig {
            seed: Some(7),
            ..MatchConfig::default()
        };
        let mut game = Match::new(config).unwrap();
        game.logger.enable_capture();
        let db = CardDatabase::builtin();
        for seat in 0..2u32 {
            for _ in 0..15 {
                game.add_card_to_library(crate::core::EntityId::new(seat), "Forest", &db)
                    .unwrap();
            }
        }
        game
    }

    fn act(game: &mut Match, player: PlayerId, action: PlayerAction) -> Result<()> {
        game.post(ActionMessage::Player { player, action })
    }

    fn pass(game: &mut Match, player: PlayerId) {
        act(game, player, PlayerAction::PassPriority).unwrap();
    }

    /// Tick and pass until the active player holds priority in a main phase
    fn advance_to_main(game: &mut Match) -> PlayerId {
        for _ in 0..200 {
            if let Some(active) = game.active_player() {
                let p = &game.players[seat(active)];
                if game.in_main_phase() && p.needs_input && p.state == PlayerState::Prioritized {
                    return active;
                }
            }
            let waiting: Vec<PlayerId> = game.awaiting_players().collect();
            match waiting.first() {
                Some(&player) => pass(game, player),
                None => game.update().unwrap(),
            }
        }
        panic!("never reached a main phase");
    }

    /// Hand the player a fresh card by name
    fn give(game: &mut Match, player: PlayerId, name: &str) -> CardId {
        let id = game
            .add_card_to_library(player, name, &CardDatabase::builtin())
            .unwrap();
        let p = &mut game.players[seat(player)];
        p.library.remove(id);
        p.hand.add(id);
        id
    }

    /// Put a card straight onto the battlefield, ready to use
    fn put(game: &mut Match, player: PlayerId, name: &str) -> PermanentId {
        let card = give(game, player, name);
        game.players[seat(player)].hand.remove(card);
        let id = game.put_onto_battlefield(card, player).unwrap();
        game.battlefield.get_mut(id).unwrap().summoning_sick = false;
        id
    }

    fn illegal(result: Result<()>) -> IllegalAction {
        match result {
            Err(MtgError::IllegalAction(reason)) => reason,
            other => panic!("expected an illegal action, got {other:?}"),
        }
    }

    #[test]
    fn test_play_land_once_per_turn() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let first = give(&mut game, active, "Forest");
        let second = give(&mut game, active, "Forest");

        game.post(ActionMessage::Special {
            player: active,
            action: SpecialAction::PlayLand { card: first },
        })
        .unwrap();
        assert_eq!(game.battlefield.len(), 1);
        assert_eq!(game.players[seat(active)].state, PlayerState::Prioritized);

        let hand_before = game.players[seat(active)].hand.len();
        let reason = illegal(game.post(ActionMessage::Special {
            player: active,
            action: SpecialAction::PlayLand { card: second },
        }));
        assert_eq!(reason, IllegalAction::LandAlreadyPlayed);
        assert_eq!(game.players[seat(active)].hand.len(), hand_before);
        assert_eq!(game.battlefield.len(), 1);
    }

    #[test]
    fn test_only_awaited_player_may_act() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let nonactive = game.opponent(active);
        let card = give(&mut game, nonactive, "Forest");

        let reason = illegal(game.post(ActionMessage::Special {
            player: nonactive,
            action: SpecialAction::PlayLand { card },
        }));
        assert_eq!(reason, IllegalAction::NotYourTurnToAct(nonactive.as_u32()));
    }

    #[test]
    fn test_cannot_cast_land() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let card = give(&mut game, active, "Forest");
        let reason = illegal(act(&mut game, active, PlayerAction::CastSpell { card }));
        assert_eq!(reason, IllegalAction::CannotCastLand(card.as_u32()));
        assert!(game.stack.is_empty());
    }

    #[test]
    fn test_zero_cost_spell_never_pays() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let card = give(&mut game, active, "Ornithopter");

        act(&mut game, active, PlayerAction::CastSpell { card }).unwrap();
        let p = &game.players[seat(active)];
        assert_eq!(p.state, PlayerState::Prioritized);
        assert!(p.payment.is_none());
        assert_eq!(game.stack.len(), 1);

        // Both pass, then the next tick resolves it
        pass(&mut game, active);
        game.update().unwrap();
        let opponent = game.opponent(active);
        pass(&mut game, opponent);
        game.update().unwrap();

        assert!(game.stack.is_empty());
        assert!(game
            .battlefield
            .iter()
            .any(|p| p.card == card && p.summoning_sick));
    }

    #[test]
    fn test_paying_with_mana_abilities() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let forest_a = put(&mut game, active, "Forest");
        let forest_b = put(&mut game, active, "Forest");
        let bears = give(&mut game, active, "Grizzly Bears");

        act(&mut game, active, PlayerAction::CastSpell { card: bears }).unwrap();
        assert_eq!(game.players[seat(active)].state, PlayerState::Paying);

        act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: forest_a,
                index: 0,
            },
        )
        .unwrap();
        let p = &game.players[seat(active)];
        assert_eq!(p.state, PlayerState::Paying);
        assert_eq!(p.payment.as_ref().unwrap().remaining(), ManaMap::from_string("1"));

        act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: forest_b,
                index: 0,
            },
        )
        .unwrap();
        let p = &game.players[seat(active)];
        assert_eq!(p.state, PlayerState::Prioritized);
        assert!(p.payment.is_none());
        assert!(p.mana_pool.is_empty());
        assert!(game.stack.contains(bears));
        assert!(game.permanent(forest_a).unwrap().tapped);

        let reason = illegal(act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: forest_a,
                index: 0,
            },
        ));
        assert_eq!(reason, IllegalAction::PermanentTapped(forest_a.as_u32()));
    }

    #[test]
    fn test_mana_ability_pays_tap_cost() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let forest = put(&mut game, active, "Forest");

        act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: forest,
                index: 0,
            },
        )
        .unwrap();
        assert!(game.permanent(forest).unwrap().tapped);
        let p = &game.players[seat(active)];
        assert_eq!(p.mana_pool, ManaMap::from_string("G"));
        assert_eq!(p.state, PlayerState::Prioritized);

        let reason = illegal(act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: forest,
                index: 0,
            },
        ));
        assert_eq!(reason, IllegalAction::PermanentTapped(forest.as_u32()));
        assert_eq!(game.players[seat(active)].mana_pool, ManaMap::from_string("G"));

        // A fresh creature cannot tap for mana yet
        let elves = give(&mut game, active, "Llanowar Elves");
        game.players[seat(active)].hand.remove(elves);
        let elves = game.put_onto_battlefield(elves, active).unwrap();
        let reason = illegal(act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: elves,
                index: 0,
            },
        ));
        assert_eq!(reason, IllegalAction::SummoningSick(elves.as_u32()));
        assert!(!game.permanent(elves).unwrap().tapped);
    }

    #[test]
    fn test_passing_abandons_cast() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let forest = put(&mut game, active, "Forest");
        let bears = give(&mut game, active, "Grizzly Bears");

        act(&mut game, active, PlayerAction::CastSpell { card: bears }).unwrap();
        act(
            &mut game,
            active,
            PlayerAction::ActivateAbility {
                permanent: forest,
                index: 0,
            },
        )
        .unwrap();
        pass(&mut game, active);

        let p = &game.players[seat(active)];
        assert!(p.hand.contains(bears));
        assert!(game.stack.is_empty());
        assert_eq!(p.mana_pool, ManaMap::from_string("G"));
        assert!(p.passed_priority);
        assert!(!p.needs_input);
    }

    #[test]
    fn test_cost_choice() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let recruit = give(&mut game, active, "Boros Recruit");

        act(&mut game, active, PlayerAction::CastSpell { card: recruit }).unwrap();
        let p = &game.players[seat(active)];
        assert_eq!(p.state, PlayerState::CastingSpell);
        assert_eq!(p.pending_cost_choice, Some(recruit));

        let reason = illegal(act(&mut game, active, PlayerAction::SelectCostMap { index: 5 }));
        assert_eq!(reason, IllegalAction::NoSuchCostOption(5));

        act(&mut game, active, PlayerAction::SelectCostMap { index: 0 }).unwrap();
        let p = &game.players[seat(active)];
        assert_eq!(p.state, PlayerState::Paying);
        assert_eq!(
            p.payment.as_ref().unwrap().goal(),
            game.card(recruit).unwrap().costs[0]
        );
        assert_eq!(game.stack.peek().unwrap().cost_index, Some(0));
    }

    #[test]
    fn test_lethal_damage_waits_for_sweep() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let bears = put(&mut game, active, "Grizzly Bears");

        let forest = put(&mut game, active, "Forest");
        game.battlefield.get_mut(forest).unwrap().mark_damage(5);
        assert!(RuleEnforcer::check_state_based_actions(&game).is_empty());

        game.battlefield.get_mut(bears).unwrap().mark_damage(2);
        assert!(game.permanent(bears).is_ok());
        assert_eq!(
            RuleEnforcer::check_state_based_actions(&game),
            vec![StateBasedAction::LethalDamage(bears)]
        );

        RuleEnforcer::process_state_based_actions(&mut game).unwrap();
        assert!(game.permanent(bears).is_err());
        assert_eq!(game.players[seat(active)].graveyard.len(), 1);
        assert!(game.is_running());
    }

    #[test]
    fn test_zero_life_ends_match() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let loser = game.opponent(active);
        game.players[seat(loser)].life = 0;

        RuleEnforcer::process_state_based_actions(&mut game).unwrap();
        assert!(!game.is_running());
        let result = game.result().unwrap();
        assert_eq!(result.winner, Some(active));
        assert_eq!(result.end_reason, MatchEndReason::PlayerDeath(loser));

        let card = give(&mut game, active, "Forest");
        let reason = illegal(game.post(ActionMessage::Special {
            player: active,
            action: SpecialAction::PlayLand { card },
        }));
        assert_eq!(reason, IllegalAction::MatchNotRunning);
    }

    #[test]
    fn test_concede_is_always_accepted() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let nonactive = game.opponent(active);

        act(&mut game, nonactive, PlayerAction::Concede).unwrap();
        assert!(game.is_finished());
        let result = game.result().unwrap();
        assert_eq!(result.winner, Some(active));
        assert_eq!(result.end_reason, MatchEndReason::Concession(nonactive));
    }

    #[test]
    fn test_spell_effects_resolve() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let opponent = game.opponent(active);
        game.players[seat(active)].mana_pool = ManaMap::from_string("R");
        let bolt = give(&mut game, active, "Lightning Bolt");

        // The floating red pays for it outright
        act(&mut game, active, PlayerAction::CastSpell { card: bolt }).unwrap();
        assert_eq!(game.players[seat(active)].state, PlayerState::Prioritized);

        RuleEnforcer::resolve_stack(&mut game).unwrap();
        assert_eq!(game.players[seat(opponent)].life, 17);
        assert!(game.players[seat(active)].graveyard.contains(bolt));
    }

    #[test]
    fn test_stack_resolves_last_in_first_out() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let thopter = give(&mut game, active, "Ornithopter");
        act(&mut game, active, PlayerAction::CastSpell { card: thopter }).unwrap();

        game.players[seat(active)].mana_pool = ManaMap::from_string("R");
        let bolt = give(&mut game, active, "Lightning Bolt");
        act(&mut game, active, PlayerAction::CastSpell { card: bolt }).unwrap();
        assert_eq!(game.stack.len(), 2);

        RuleEnforcer::resolve_stack(&mut game).unwrap();
        assert!(game.stack.is_empty());
        let resolved: Vec<String> = game
            .logger
            .logs()
            .iter()
            .filter(|e| e.message.ends_with(" resolves"))
            .map(|e| e.message.clone())
            .collect();
        assert_eq!(resolved, ["Lightning Bolt resolves", "Ornithopter resolves"]);
    }

    #[test]
    fn test_both_passing_ends_upkeep() {
        let mut game = new_match();
        for _ in 0..20 {
            if game.waiting_for_input() {
                break;
            }
            game.update().unwrap();
        }
        assert_eq!(game.step_type(), Some(StepType::Upkeep));
        let active = game.active_player().unwrap();
        let nonactive = game.opponent(active);

        pass(&mut game, active);
        game.update().unwrap();
        pass(&mut game, nonactive);
        game.update().unwrap();

        assert_ne!(game.step_type(), Some(StepType::Upkeep));
        assert!(!game.players[seat(active)].passed_priority);
        assert!(!game.players[seat(nonactive)].passed_priority);
    }

    #[test]
    fn test_derive_priority_order() {
        let mut game = new_match();
        let active = advance_to_main(&mut game);
        let nonactive = game.opponent(active);

        game.players[seat(active)].passed_priority = true;
        RuleEnforcer::derive_priority(&mut game);
        assert_eq!(game.prioritized_player, Some(nonactive));
        assert_eq!(game.players[seat(active)].state, PlayerState::Active);
        assert_eq!(game.players[seat(nonactive)].state, PlayerState::Prioritized);

        game.players[seat(nonactive)].passed_priority = true;
        RuleEnforcer::derive_priority(&mut game);
        assert_eq!(game.prioritized_player, None);
    }
}

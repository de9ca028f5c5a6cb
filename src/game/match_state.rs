//! The match: root of all game state and the `update()` tick
//!
//! `update()` is meant to be called on a fixed cadence by a driver. Each call
//! does at most one unit of timeline work (begin the match, begin a turn,
//! activate a phase or step, run a priority round, end a unit) and returns
//! immediately while any player owes input.

use crate::config::MatchConfig;
use crate::core::{Card, CardId, EntityId, EntityStore, Permanent, PermanentId, Player, PlayerId, PlayerState};
use crate::game::actions::{ActionMessage, StateBasedAction};
use crate::game::bus::MessageBus;
use crate::game::combat::CombatState;
use crate::game::logger::{GameLogger, VerbosityLevel};
use crate::game::observer::{ChangeListener, ObservedView, Observers, PlayerView};
use crate::game::phase::{Phase, PhaseType, Step, StepType, Turn};
use crate::game::rule_enforcer::RuleEnforcer;
use crate::game::stack::Stack;
use crate::loader::CardFactory;
use crate::zones::{Zone, ZoneKind};
use crate::{MtgError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Why the match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEndReason {
    /// The player's life total reached zero
    PlayerDeath(PlayerId),
    /// The player drew from an empty library
    Decking(PlayerId),
    Concession(PlayerId),
    /// The configured turn limit was reached
    TurnLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// `None` for a draw or a turn-limit stop
    pub winner: Option<PlayerId>,
    pub turns_played: u32,
    pub end_reason: MatchEndReason,
}

/// Which timeline unit a priority round closes when both players pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PriorityUnit {
    Step,
    Phase,
}

/// Copy of the timeline cursor, taken before deciding what to do next
#[derive(Debug, Clone, Copy)]
struct Position {
    turn_running: bool,
    has_next_phase: bool,
    phase: Option<(PhaseType, bool)>,
    step: Option<(StepType, bool)>,
    has_next_step: bool,
}

pub(crate) fn seat(id: PlayerId) -> usize {
    id.as_u32() as usize
}

pub struct Match {
    pub config: MatchConfig,

    /// Indexed by seat; `PlayerId` 0 and 1
    pub players: [Player; 2],

    /// Every card in the match, whatever zone it is in
    pub cards: EntityStore<Card>,

    pub battlefield: Zone<Permanent>,

    pub exile: Zone<CardId>,

    pub stack: Stack,

    pub combat: CombatState,

    /// Current (or most recent) turn
    pub turn: Option<Turn>,

    pub turn_number: u32,

    pub prioritized_player: Option<PlayerId>,

    /// State-based actions found by the last sweep, applied as one batch
    pub pending_state_based_actions: BTreeSet<StateBasedAction>,

    pub rng: ChaCha12Rng,

    pub logger: GameLogger,

    started: bool,
    running: bool,
    finished: bool,
    result: Option<MatchResult>,
    next_entity_id: u32,
    bus: MessageBus,
    observers: Observers,
}

impl Match {
    pub fn new(config: MatchConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::from_entropy(),
        };

        let mut players = [
            Player::new(EntityId::new(0), config.player_names[0].as_str(), config.starting_life),
            Player::new(EntityId::new(1), config.player_names[1].as_str(), config.starting_life),
        ];
        for player in &mut players {
            player.max_lands_per_turn = config.lands_per_turn;
        }

        let mut bus = MessageBus::new();
        RuleEnforcer::subscribe(&mut bus);

        Ok(Match {
            config,
            players,
            cards: EntityStore::new(),
            battlefield: Zone::new(ZoneKind::Battlefield, None),
            exile: Zone::new(ZoneKind::Exile, None),
            stack: Stack::new(),
            combat: CombatState::new(),
            turn: None,
            turn_number: 0,
            prioritized_player: None,
            pending_state_based_actions: BTreeSet::new(),
            rng,
            logger: GameLogger::new(),
            started: false,
            running: true,
            finished: false,
            result: None,
            // 0 and 1 are the players
            next_entity_id: 2,
            bus,
            observers: Observers::new(),
        })
    }

    /// Get next entity ID (unified across all entity types)
    pub fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Create a card through `factory` and put it on top of `owner`'s library
    pub fn add_card_to_library(
        &mut self,
        owner: PlayerId,
        name: &str,
        factory: &dyn CardFactory,
    ) -> Result<CardId> {
        seat_check(owner)?;
        let id = self.next_id();
        let card = factory.create_card(name, id, owner)?;
        self.cards.insert(id, card);
        self.players[seat(owner)].library.add(id);
        Ok(id)
    }

    /// Register a presentation-layer listener
    pub fn subscribe(&mut self, listener: ChangeListener) {
        self.observers.subscribe(listener);
        self.publish_changes();
    }

    // ----- Accessors -----

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .get(seat(id))
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .get_mut(seat(id))
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn opponent(&self, id: PlayerId) -> PlayerId {
        if seat(id) == 0 {
            EntityId::new(1)
        } else {
            EntityId::new(0)
        }
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    pub fn permanent(&self, id: PermanentId) -> Result<&Permanent> {
        self.battlefield
            .get(id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn active_player(&self) -> Option<PlayerId> {
        self.turn.as_ref().map(|t| t.active_player)
    }

    pub fn nonactive_player(&self) -> Option<PlayerId> {
        self.turn.as_ref().map(|t| t.nonactive_player)
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.turn.as_ref().and_then(Turn::current_phase)
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.turn.as_ref().and_then(Turn::current_step)
    }

    /// The running phase's type, if a phase is running
    pub fn phase_type(&self) -> Option<PhaseType> {
        self.current_phase().filter(|p| p.is_running()).map(|p| p.kind)
    }

    /// The running step's type, if a step is running
    pub fn step_type(&self) -> Option<StepType> {
        if self.phase_type().is_none() {
            return None;
        }
        self.current_step().filter(|s| s.is_running()).map(|s| s.kind)
    }

    pub fn in_main_phase(&self) -> bool {
        self.phase_type().is_some_and(|p| p.is_main())
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Is the engine suspended until some player acts?
    pub fn waiting_for_input(&self) -> bool {
        self.players.iter().any(|p| p.needs_input || p.is_declaring())
    }

    /// Players the engine is currently waiting on
    pub fn awaiting_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(|p| p.needs_input || p.is_declaring())
            .map(|p| p.id)
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    // ----- Message delivery -----

    /// Post a message and deliver it synchronously
    ///
    /// Messages posted by handlers while this one is being delivered are
    /// queued and delivered, in order, before `post` returns. The returned
    /// error is the first rejection or failure encountered.
    pub fn post(&mut self, message: ActionMessage) -> Result<()> {
        if self.bus.is_dispatching() {
            self.bus.enqueue(message);
            return Ok(());
        }

        self.bus.set_dispatching(true);
        let mut result = self.deliver(&message);
        while let Some(queued) = self.bus.dequeue() {
            if let Err(e) = self.deliver(&queued) {
                self.logger
                    .log_args(VerbosityLevel::Normal, "rejected", format_args!("{queued} failed: {e}"));
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        self.bus.set_dispatching(false);

        if let Err(e) = &result {
            self.logger
                .log_args(VerbosityLevel::Normal, "rejected", format_args!("{message} rejected: {e}"));
        }

        if !self.running {
            self.finalize();
        }
        self.publish_changes();
        result
    }

    fn deliver(&mut self, message: &ActionMessage) -> Result<()> {
        self.bus.record_delivery();
        self.logger
            .log_args(VerbosityLevel::Verbose, "message", format_args!("{message}"));
        for handler in self.bus.handlers_for(message.kind()) {
            handler(self, message)?;
        }
        Ok(())
    }

    // ----- The tick -----

    /// Advance the match by one unit of work
    pub fn update(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        if self.running && !self.waiting_for_input() {
            self.advance()?;
        }

        if !self.running {
            self.finalize();
        }
        self.publish_changes();
        Ok(())
    }

    fn position(&self) -> Position {
        let turn = self.turn.as_ref();
        let phase = turn.and_then(Turn::current_phase);
        Position {
            turn_running: turn.is_some_and(Turn::is_running),
            has_next_phase: turn.is_some_and(Turn::has_next_phase),
            phase: phase.map(|p| (p.kind, p.is_running())),
            step: phase
                .and_then(Phase::current_step)
                .map(|s| (s.kind, s.is_running())),
            has_next_step: phase.is_some_and(Phase::has_next_step),
        }
    }

    fn advance(&mut self) -> Result<()> {
        if !self.started {
            return self.begin_match();
        }

        let pos = self.position();
        if !pos.turn_running {
            return self.begin_turn();
        }

        let phase = match pos.phase {
            Some((kind, true)) => kind,
            _ => {
                if pos.has_next_phase {
                    return self.activate_next_phase();
                }
                let active_discarding = self
                    .active_player()
                    .is_some_and(|id| self.players[seat(id)].state == PlayerState::Discarding);
                if !active_discarding {
                    self.end_turn();
                }
                return Ok(());
            }
        };

        if phase.is_main() {
            return self.run_priority_round(PriorityUnit::Phase);
        }

        match pos.step {
            Some((kind, true)) => {
                if kind.grants_priority() {
                    self.run_priority_round(PriorityUnit::Step)
                } else {
                    self.end_step()
                }
            }
            _ => {
                if pos.has_next_step {
                    self.activate_next_step()
                } else {
                    self.end_phase()
                }
            }
        }
    }

    fn begin_match(&mut self) -> Result<()> {
        let hand_size = self.config.hand_size;
        for player in &mut self.players {
            player.library.shuffle(&mut self.rng);
            // Opening hands never count as drawing from an empty library
            for _ in 0..hand_size {
                match player.library.draw_top() {
                    Some(card) => player.hand.add(card),
                    None => break,
                }
            }
        }
        self.started = true;
        self.logger.log_args(
            VerbosityLevel::Normal,
            "match",
            format_args!(
                "Match begins: {} vs {}",
                self.players[0].name, self.players[1].name
            ),
        );
        Ok(())
    }

    fn begin_turn(&mut self) -> Result<()> {
        let active = match self.turn.as_ref() {
            Some(previous) => previous.nonactive_player,
            None => EntityId::new(self.rng.gen_range(0..2u32)),
        };
        let nonactive = self.opponent(active);

        self.turn_number += 1;
        let mut turn = Turn::new(self.turn_number, active, nonactive);
        if self.turn_number == 1 {
            // The starting player skips their first draw
            turn.skip_step(StepType::Draw);
        }
        turn.flags.running = true;
        self.turn = Some(turn);
        self.prioritized_player = None;

        for player in &mut self.players {
            player.baseline = if player.id == active {
                PlayerState::Active
            } else {
                PlayerState::Nonactive
            };
            player.reset_state();
            player.passed_priority = false;
            player.reset_lands_played();
        }
        for permanent in self.battlefield.iter_mut() {
            if permanent.controller == active {
                permanent.summoning_sick = false;
            }
        }

        self.logger.log_args(
            VerbosityLevel::Normal,
            "turn",
            format_args!("Turn {} ({})", self.turn_number, self.players[seat(active)].name),
        );
        Ok(())
    }

    fn end_turn(&mut self) {
        if let Some(turn) = self.turn.as_mut() {
            turn.flags.running = false;
        }
        for player in &mut self.players {
            player.passed_priority = false;
        }
        self.prioritized_player = None;

        if let Some(limit) = self.config.max_turns {
            if self.turn_number >= limit {
                self.logger.log_args(
                    VerbosityLevel::Normal,
                    "match",
                    format_args!("Turn limit of {limit} reached"),
                );
                self.end_match(MatchEndReason::TurnLimit);
            }
        }
    }

    fn activate_next_phase(&mut self) -> Result<()> {
        let Some(phase) = self.turn.as_mut().and_then(Turn::advance_phase) else {
            return Ok(());
        };
        let kind = phase.kind;
        if phase.flags.skipped {
            self.logger
                .log_args(VerbosityLevel::Verbose, "phase", format_args!("{kind} phase skipped"));
            return Ok(());
        }
        phase.flags.running = true;
        self.logger
            .log_args(VerbosityLevel::Verbose, "phase", format_args!("{kind} phase"));
        Ok(())
    }

    fn end_phase(&mut self) -> Result<()> {
        let Some(phase) = self.turn.as_mut().and_then(Turn::current_phase_mut) else {
            return Ok(());
        };
        phase.flags.running = false;
        let kind = phase.kind;

        if kind.is_main() {
            self.post(ActionMessage::TurnBased(
                crate::game::actions::TurnBasedAction::ClearManaPools,
            ))?;
            self.reset_passed_flags();
        }

        if kind == PhaseType::PrecombatMain && !self.active_player_can_attack() {
            if let Some(turn) = self.turn.as_mut() {
                turn.skip_phase(PhaseType::Combat);
            }
        }
        Ok(())
    }

    fn activate_next_step(&mut self) -> Result<()> {
        let Some(step) = self
            .turn
            .as_mut()
            .and_then(Turn::current_phase_mut)
            .and_then(Phase::advance_step)
        else {
            return Ok(());
        };
        let kind = step.kind;
        if step.flags.skipped {
            self.logger
                .log_args(VerbosityLevel::Verbose, "step", format_args!("{kind} step skipped"));
            return Ok(());
        }
        step.flags.running = true;
        self.logger
            .log_args(VerbosityLevel::Normal, "step", format_args!("{kind} step"));

        for action in kind.begin_actions() {
            self.post(ActionMessage::TurnBased(action))?;
        }
        Ok(())
    }

    fn end_step(&mut self) -> Result<()> {
        let Some(phase) = self.turn.as_mut().and_then(Turn::current_phase_mut) else {
            return Ok(());
        };
        let Some(step) = phase.current_step_mut() else {
            return Ok(());
        };
        step.flags.running = false;
        let kind = step.kind;
        let last_step = !phase.has_next_step();

        self.post(ActionMessage::TurnBased(kind.end_action()))?;
        self.reset_passed_flags();

        if last_step {
            self.end_phase()?;
        }
        Ok(())
    }

    /// Sweep state-based actions, then resolve the stack, hand out priority,
    /// or close the unit once both players have passed
    fn run_priority_round(&mut self, unit: PriorityUnit) -> Result<()> {
        RuleEnforcer::process_state_based_actions(self)?;
        if !self.running {
            return Ok(());
        }

        let both_passed = self.players.iter().all(|p| p.passed_priority);
        if both_passed && !self.stack.is_empty() {
            RuleEnforcer::resolve_stack(self)
        } else if !both_passed {
            RuleEnforcer::derive_priority(self);
            Ok(())
        } else {
            match unit {
                PriorityUnit::Step => self.end_step(),
                PriorityUnit::Phase => self.end_phase(),
            }
        }
    }

    // ----- Mutators used by the rule enforcer -----

    pub fn reset_passed_flags(&mut self) {
        for player in &mut self.players {
            player.passed_priority = false;
        }
    }

    /// Put a card onto the battlefield as a new permanent
    pub fn put_onto_battlefield(&mut self, card: CardId, controller: PlayerId) -> Result<PermanentId> {
        let id = self.next_id();
        let permanent = Permanent::from_card(id, self.cards.get(card)?, controller);
        self.logger.log_args(
            VerbosityLevel::Normal,
            "zone",
            format_args!(
                "{} enters the battlefield under {}'s control",
                permanent.name,
                self.players[seat(controller)].name
            ),
        );
        self.battlefield.add(permanent);
        Ok(id)
    }

    /// Move a permanent's card to its controller's graveyard
    pub fn destroy_permanent(&mut self, id: PermanentId) -> Option<CardId> {
        let permanent = self.battlefield.remove_permanent(id)?;
        self.logger
            .log_args(VerbosityLevel::Normal, "zone", format_args!("{} dies", permanent.name));
        self.players[seat(permanent.controller)]
            .graveyard
            .add(permanent.card);
        Some(permanent.card)
    }

    /// Does the active player control a creature able to attack?
    pub fn active_player_can_attack(&self) -> bool {
        self.active_player().is_some_and(|active| {
            self.battlefield
                .creatures_controlled_by(active)
                .any(Permanent::can_attack)
        })
    }

    /// Stop the match. The first reason recorded wins.
    pub fn end_match(&mut self, reason: MatchEndReason) {
        self.running = false;
        if self.result.is_some() {
            return;
        }
        let losers: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| p.has_lost)
            .map(|p| p.id)
            .collect();
        let winner = match losers.as_slice() {
            [loser] => Some(self.opponent(*loser)),
            _ => None,
        };
        self.result = Some(MatchResult {
            winner,
            turns_played: self.turn_number,
            end_reason: reason,
        });
    }

    fn finalize(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        for player in &mut self.players {
            player.needs_input = false;
            player.declaring_attackers = false;
            player.declaring_blockers = false;
        }
        self.prioritized_player = None;

        let Some(result) = self.result else {
            self.logger.minimal("Match stopped");
            return;
        };
        let message = match result.winner {
            Some(winner) => format!(
                "{} wins after {} turn(s) ({:?})",
                self.players[seat(winner)].name, result.turns_played, result.end_reason
            ),
            None => format!(
                "Match ends without a winner after {} turn(s) ({:?})",
                result.turns_played, result.end_reason
            ),
        };
        self.logger.minimal(&message);
    }

    // ----- Change notification -----

    fn observed_view(&self) -> ObservedView {
        let player_view = |p: &Player| PlayerView {
            id: Some(p.id),
            life: p.life,
            state: Some(p.state),
            library: p.library.len(),
            hand: p.hand.len(),
            graveyard: p.graveyard.len(),
        };
        ObservedView {
            turn: self.turn.as_ref().map(|t| (t.number, t.active_player)),
            phase: self.phase_type(),
            step: self.step_type(),
            players: [player_view(&self.players[0]), player_view(&self.players[1])],
            battlefield: self.battlefield.len(),
            exile: self.exile.len(),
            stack: self.stack.len(),
            finished: self.finished.then(|| self.result.and_then(|r| r.winner)),
        }
    }

    fn publish_changes(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.observed_view();
        self.observers.publish(view);
    }
}

fn seat_check(id: PlayerId) -> Result<()> {
    if seat(id) < 2 {
        Ok(())
    } else {
        Err(MtgError::EntityNotFound(id.as_u32()))
    }
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("turn_number", &self.turn_number)
            .field("phase", &self.phase_type())
            .field("step", &self.step_type())
            .field("running", &self.running)
            .field("result", &self.result)
            .finish()
    }
}

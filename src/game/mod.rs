//! Match state, the turn timeline and the rules that drive it

pub mod actions;
pub mod bus;
pub mod combat;
pub mod controller;
pub mod logger;
pub mod match_state;
pub mod observer;
pub mod phase;
pub mod random_controller;
pub mod rule_enforcer;
pub mod snapshot;
pub mod stack;
pub mod zero_controller;

pub use actions::{ActionMessage, MessageKind, PlayerAction, SpecialAction, StateBasedAction, TurnBasedAction};
pub use bus::MessageBus;
pub use combat::{Attack, AttackTarget, CombatState};
pub use controller::{candidate_intents, fallback_intent, service_input, tick, InputSource, Intent, MatchView};
pub use logger::{GameLogger, OutputFormat, OutputMode, VerbosityLevel};
pub use match_state::{Match, MatchEndReason, MatchResult};
pub use observer::{ChangeListener, ChangeNotice};
pub use phase::{Phase, PhaseType, Step, StepType, Turn};
pub use random_controller::RandomController;
pub use rule_enforcer::RuleEnforcer;
pub use snapshot::MatchSnapshot;
pub use stack::{Spell, Stack};
pub use zero_controller::ZeroController;

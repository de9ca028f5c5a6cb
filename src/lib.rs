//! Two-player rules engine for Magic: The Gathering style card games
//!
//! The engine models the turn timeline (turns, phases, steps), priority, a
//! LIFO stack, state-based actions and mana payment. A `Match` is advanced by
//! calling `update()` on a fixed cadence; players act by posting messages that
//! the rule enforcer validates.

pub mod config;
pub mod core;
pub mod error;
pub mod game;
pub mod loader;
pub mod zones;

pub use config::MatchConfig;
pub use error::{IllegalAction, MtgError, Result};

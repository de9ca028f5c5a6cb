//! Error types for the rules engine

use thiserror::Error;

/// Reason a posted action was refused by the rule enforcer
///
/// Rejections never mutate game state. They are handed back to whoever
/// posted the action so an input source can react instead of waiting forever.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalAction {
    #[error("the match is not running")]
    MatchNotRunning,

    #[error("player {0} is not the player the engine is waiting on")]
    NotYourTurnToAct(u32),

    #[error("only the active player may do that")]
    NotActivePlayer,

    #[error("only allowed during a main phase")]
    NotMainPhase,

    #[error("the stack must be empty")]
    StackNotEmpty,

    #[error("no land drops left this turn")]
    LandAlreadyPlayed,

    #[error("card {0} is not in hand")]
    CardNotInHand(u32),

    #[error("card {0} is not a land")]
    NotALand(u32),

    #[error("card {0} is a land and cannot be cast")]
    CannotCastLand(u32),

    #[error("permanent {0} is not controlled by the acting player")]
    NotYourPermanent(u32),

    #[error("permanent {0} does not have ability #{1}")]
    NoSuchAbility(u32, usize),

    #[error("only mana abilities can be activated")]
    AbilityNotSupported,

    #[error("the ability cannot be activated in the current player state")]
    WrongStateForAbility,

    #[error("permanent {0} is tapped")]
    PermanentTapped(u32),

    #[error("permanent {0} has summoning sickness")]
    SummoningSick(u32),

    #[error("a mana payment is already in progress")]
    PaymentInProgress,

    #[error("not enough mana in the pool")]
    InsufficientMana,

    #[error("priority cannot be passed until the pending declaration or discard is finished")]
    CannotPassPriority,

    #[error("player is not declaring attackers")]
    NotDeclaringAttackers,

    #[error("player is not declaring blockers")]
    NotDeclaringBlockers,

    #[error("permanent {0} is not a creature")]
    NotACreature(u32),

    #[error("permanent {0} is already in combat")]
    AlreadyInCombat(u32),

    #[error("permanent {0} is not attacking")]
    NotAttacking(u32),

    #[error("no blocker has been chosen yet")]
    NoBlockerChosen,

    #[error("player has no discard pending")]
    NotDiscarding,

    #[error("no cost choice is pending")]
    NoCostChoicePending,

    #[error("cost option #{0} does not exist")]
    NoSuchCostOption(usize),
}

#[derive(Error, Debug)]
pub enum MtgError {
    #[error("Illegal action: {0}")]
    IllegalAction(#[from] IllegalAction),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid deck format: {0}")]
    InvalidDeckFormat(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, MtgError>;

//! Core game types and entities

pub mod card;
pub mod costs;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod permanent;
pub mod player;
pub mod types;

pub use card::{ActivatedAbility, Card, CardType};
pub use costs::{AdditionalCost, ManaPayment, PaymentPurpose};
pub use effects::Effect;
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{Color, ManaMap};
pub use permanent::Permanent;
pub use player::{Player, PlayerState};
pub use types::{CardName, PlayerName, Subtype};

pub type CardId = EntityId<Card>;
pub type PlayerId = EntityId<Player>;
pub type PermanentId = EntityId<Permanent>;

//! Domain module
//!
//! Core domain types: entities, events, errors and the caller context.

pub mod context;
pub mod entities;
pub mod error;
pub mod events;
pub mod region;

pub use context::CallerContext;
pub use entities::{
    Challenge, Clan, ClanRole, ClanType, EntityKey, EntityKind, PlayerChallenge, PlayerClan,
    PlayerWar, Role, War,
};
pub use error::DomainError;
pub use events::{DomainEvent, Participation};
pub use region::{Region, RegionError};

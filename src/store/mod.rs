//! Entity Store module
//!
//! Persistence for clans, challenges, wars and their relation rows.
//! Handlers load by key, stage changes on a `UnitOfWork`, and hand the
//! changes to `EntityStore::save_all`, which applies them atomically.

mod cancel;
mod error;
mod memory;
mod postgres;
mod unit_of_work;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgEntityStore;
pub use unit_of_work::{Change, Record, RecordKey, UnitOfWork};

use async_trait::async_trait;

use crate::domain::{Challenge, Clan, EntityKind, PlayerChallenge, PlayerClan, PlayerWar, War};

/// Offset/limit window of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

/// One window of a listing plus the size of the whole listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
}

/// Key-based access to entities and atomic saving of a unit of work
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Reserve a fresh identifier for a new aggregate of `kind`
    async fn next_id(&self, kind: EntityKind, cancel: &CancelSignal) -> Result<i64, StoreError>;

    async fn find_clan(&self, id: i64, cancel: &CancelSignal) -> Result<Option<Clan>, StoreError>;

    async fn find_challenge(
        &self,
        id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<Challenge>, StoreError>;

    async fn find_war(&self, id: i64, cancel: &CancelSignal) -> Result<Option<War>, StoreError>;

    async fn find_player_clan(
        &self,
        clan_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerClan>, StoreError>;

    async fn find_player_challenge(
        &self,
        challenge_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerChallenge>, StoreError>;

    async fn find_player_war(
        &self,
        war_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerWar>, StoreError>;

    /// The chief row of a clan, if the clan has one
    async fn find_clan_chief(
        &self,
        clan_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerClan>, StoreError>;

    /// Apply every change in one atomic step. Either all changes are
    /// persisted or none are.
    async fn save_all(&self, changes: &[Change], cancel: &CancelSignal) -> Result<(), StoreError>;

    // Read side

    async fn list_clans(&self, page: PageRequest) -> Result<Page<Clan>, StoreError>;

    async fn list_challenges(&self, page: PageRequest) -> Result<Page<Challenge>, StoreError>;

    async fn list_wars(&self, page: PageRequest) -> Result<Page<War>, StoreError>;

    async fn list_clan_players(&self, clan_id: i64) -> Result<Vec<PlayerClan>, StoreError>;

    async fn list_challenge_players(
        &self,
        challenge_id: i64,
    ) -> Result<Vec<PlayerChallenge>, StoreError>;

    async fn list_war_players(&self, war_id: i64) -> Result<Vec<PlayerWar>, StoreError>;
}

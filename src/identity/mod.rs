//! Identity module
//!
//! Role and identity lookups for the caller of a command: role membership,
//! the player bound to a user, and API key verification.

mod postgres;

pub use postgres::PgIdentityService;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::domain::Role;
use crate::store::{CancelSignal, StoreError};

/// Hex-encoded SHA-256 of an API key, as stored in `api_keys.key_hash`
pub fn hash_api_key(api_key: &str) -> String {
    hex::encode(Sha256::digest(api_key.as_bytes()))
}

/// Role & identity oracle
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Does the user hold `role`?
    async fn is_in_role(
        &self,
        user_id: Uuid,
        role: Role,
        cancel: &CancelSignal,
    ) -> Result<bool, StoreError>;

    /// The player identity bound to a user, if any
    async fn player_id_for(&self, user_id: Uuid) -> Result<Option<i64>, StoreError>;

    /// Is this API key known and active?
    async fn verify_api_key(&self, api_key: &str) -> Result<bool, StoreError>;
}

/// In-memory identity oracle with a fixed set of users.
///
/// ```
/// use data_clash::identity::StaticIdentity;
/// use uuid::Uuid;
///
/// let admin = Uuid::new_v4();
/// let identity = StaticIdentity::new()
///     .with_administrator(admin)
///     .with_player(admin, 1)
///     .with_api_key("dev-key");
/// assert_eq!(identity.role_lookups(), 0);
/// ```
#[derive(Debug, Default)]
pub struct StaticIdentity {
    administrators: HashSet<Uuid>,
    players: HashMap<Uuid, i64>,
    api_key_hashes: HashSet<String>,
    role_lookups: AtomicUsize,
}

impl StaticIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_administrator(mut self, user_id: Uuid) -> Self {
        self.administrators.insert(user_id);
        self
    }

    pub fn with_player(mut self, user_id: Uuid, player_id: i64) -> Self {
        self.players.insert(user_id, player_id);
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key_hashes.insert(hash_api_key(api_key));
        self
    }

    /// Number of role lookups answered so far
    pub fn role_lookups(&self) -> usize {
        self.role_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityService for StaticIdentity {
    async fn is_in_role(
        &self,
        user_id: Uuid,
        role: Role,
        cancel: &CancelSignal,
    ) -> Result<bool, StoreError> {
        cancel.check()?;
        self.role_lookups.fetch_add(1, Ordering::SeqCst);

        Ok(match role {
            Role::Administrator => self.administrators.contains(&user_id),
        })
    }

    async fn player_id_for(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        Ok(self.players.get(&user_id).copied())
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<bool, StoreError> {
        Ok(self.api_key_hashes.contains(&hash_api_key(api_key)))
    }
}

//! PostgreSQL Identity Service
//!
//! Reads the pre-provisioned `user_roles`, `players` and `api_keys` tables.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::Role;
use crate::store::{CancelSignal, StoreError};

use super::{hash_api_key, IdentityService};

#[derive(Debug, Clone)]
pub struct PgIdentityService {
    pool: PgPool,
}

impl PgIdentityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityService for PgIdentityService {
    async fn is_in_role(
        &self,
        user_id: Uuid,
        role: Role,
        cancel: &CancelSignal,
    ) -> Result<bool, StoreError> {
        cancel.check()?;
        let in_role: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role = $2)",
        )
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(in_role)
    }

    async fn player_id_for(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        let player_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM players WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(player_id)
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<bool, StoreError> {
        let record: Option<(Uuid, bool)> =
            sqlx::query_as("SELECT id, is_active FROM api_keys WHERE key_hash = $1")
                .bind(hash_api_key(api_key))
                .fetch_optional(&self.pool)
                .await?;

        match record {
            Some((id, false)) => {
                tracing::warn!(api_key_id = %id, "Disabled API key presented");
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }
}

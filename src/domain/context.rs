//! Caller Context
//!
//! Identity of the caller for the current request, passed explicitly
//! into every handler.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is calling, as resolved by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Authenticated user
    pub user_id: Uuid,

    /// Player bound to the user, if the user has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<i64>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl CallerContext {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            player_id: None,
            correlation_id: None,
        }
    }

    /// Create context with the caller's player
    pub fn with_player(mut self, player_id: i64) -> Self {
        self.player_id = Some(player_id);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    /// Whether the caller is the given player
    pub fn is_player(&self, player_id: i64) -> bool {
        self.player_id == Some(player_id)
    }
}

//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

use super::{EntityKey, EntityKind};

/// Faults raised by the command gate.
///
/// Every variant aborts the unit of work before anything is saved.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Target aggregate or relation row is absent
    #[error("Entity \"{kind}\" ({key}) was not found")]
    NotFound { kind: EntityKind, key: EntityKey },

    /// Authorization predicate failed
    #[error("Access to this resource is forbidden")]
    ForbiddenAccess,

    /// A domain invariant would be violated
    #[error("Application constraint violation: {0}")]
    ApplicationConstraint(String),

    /// Command fields failed validation
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl DomainError {
    pub fn not_found(kind: EntityKind, key: EntityKey) -> Self {
        Self::NotFound { kind, key }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        Self::ApplicationConstraint(message.into())
    }
}

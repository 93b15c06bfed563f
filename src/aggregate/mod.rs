//! Aggregate module
//!
//! Aggregate roots and the mutable field sets their commands overwrite.

pub mod challenge;
pub mod clan;
pub mod war;

pub use challenge::ChallengeFields;
pub use clan::ClanFields;
pub use war::WarFields;

use crate::domain::{DomainError, EntityKey, EntityKind};

/// Aggregate trait that all aggregate roots implement
pub trait Aggregate: Sized {
    /// Kind of this aggregate (for keys and errors)
    fn kind() -> EntityKind;

    /// Kind of the relation rows this aggregate owns
    fn relation_kind() -> EntityKind;

    /// Get the aggregate ID
    fn id(&self) -> i64;

    fn key(&self) -> EntityKey {
        EntityKey::Id(self.id())
    }
}

const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Longest challenge or war window: 366 days
pub const MAX_DURATION_SECS: i64 = 366 * 24 * 60 * 60;

pub(crate) fn check_name(name: Option<&str>) -> Result<(), DomainError> {
    match name {
        Some(name) if name.trim().is_empty() => {
            Err(DomainError::Validation("name must not be blank".to_string()))
        }
        Some(name) if name.chars().count() > MAX_NAME_LEN => Err(DomainError::Validation(
            format!("name must be at most {} characters", MAX_NAME_LEN),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_description(description: Option<&str>) -> Result<(), DomainError> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LEN => Err(DomainError::Validation(
            format!("description must be at most {} characters", MAX_DESCRIPTION_LEN),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn check_non_negative(field: &str, value: i64) -> Result<(), DomainError> {
    if value < 0 {
        return Err(DomainError::Validation(format!(
            "{} must not be negative (got {})",
            field, value
        )));
    }
    Ok(())
}

pub(crate) fn check_positive(field: &str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation(format!(
            "{} must be positive (got {})",
            field, value
        )));
    }
    Ok(())
}

pub(crate) fn check_duration(value: i64) -> Result<(), DomainError> {
    check_positive("duration_secs", value)?;
    if value > MAX_DURATION_SECS {
        return Err(DomainError::Validation(format!(
            "duration_secs must be at most {} (got {})",
            MAX_DURATION_SECS, value
        )));
    }
    Ok(())
}

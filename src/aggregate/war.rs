//! War Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainEvent, EntityKind, War};

use super::{check_duration, Aggregate};

/// Mutable attribute set of a war
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarFields {
    pub begin_day: DateTime<Utc>,
    pub duration_secs: i64,
}

impl WarFields {
    pub fn new(begin_day: DateTime<Utc>, duration_secs: i64) -> Self {
        Self {
            begin_day,
            duration_secs,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_duration(self.duration_secs)
    }
}

impl War {
    pub fn create(id: i64, fields: WarFields) -> (Self, DomainEvent) {
        let war = Self {
            id,
            begin_day: fields.begin_day,
            duration_secs: fields.duration_secs,
        };
        let event = DomainEvent::WarCreated { war: war.clone() };
        (war, event)
    }

    pub fn overwrite(mut self, fields: WarFields) -> (Self, DomainEvent) {
        self.begin_day = fields.begin_day;
        self.duration_secs = fields.duration_secs;

        let event = DomainEvent::WarUpdated { war: self.clone() };
        (self, event)
    }

    pub fn deleted(self) -> DomainEvent {
        DomainEvent::WarDeleted { war: self }
    }
}

impl Aggregate for War {
    fn kind() -> EntityKind {
        EntityKind::War
    }

    fn relation_kind() -> EntityKind {
        EntityKind::PlayerWar
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKey;

    #[test]
    fn test_war_create_and_overwrite() {
        let begin = Utc::now();
        let (war, event) = War::create(9, WarFields::new(begin, 1));
        assert_eq!(war.key(), EntityKey::Id(9));
        assert!(matches!(event, DomainEvent::WarCreated { .. }));

        let later = begin + chrono::Duration::days(1);
        let (war, event) = war.overwrite(WarFields::new(later, 2));
        assert_eq!(war.begin_day, later);
        assert_eq!(war.duration_secs, 2);
        assert_eq!(event, DomainEvent::WarUpdated { war });
    }

    #[test]
    fn test_war_fields_validation() {
        assert!(WarFields::new(Utc::now(), -1).validate().is_err());
        assert!(WarFields::new(Utc::now(), 1).validate().is_ok());
    }
}

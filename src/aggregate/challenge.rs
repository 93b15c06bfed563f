//! Challenge Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Challenge, DomainError, DomainEvent, EntityKind};

use super::{check_description, check_duration, check_name, check_non_negative, Aggregate};

/// Mutable attribute set of a challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub begin_day: DateTime<Utc>,
    pub duration_secs: i64,
    #[serde(default)]
    pub bounty: i64,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub max_looses: i64,
    #[serde(default)]
    pub min_level: i64,
}

impl ChallengeFields {
    pub fn new(begin_day: DateTime<Utc>, duration_secs: i64) -> Self {
        Self {
            name: None,
            description: None,
            begin_day,
            duration_secs,
            bounty: 0,
            cost: 0,
            max_looses: 0,
            min_level: 0,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_name(self.name.as_deref())?;
        check_description(self.description.as_deref())?;
        check_duration(self.duration_secs)?;
        check_non_negative("bounty", self.bounty)?;
        check_non_negative("cost", self.cost)?;
        check_non_negative("max_looses", self.max_looses)?;
        check_non_negative("min_level", self.min_level)?;
        Ok(())
    }
}

impl Challenge {
    pub fn create(id: i64, fields: ChallengeFields) -> (Self, DomainEvent) {
        let challenge = Self {
            id,
            name: fields.name,
            description: fields.description,
            begin_day: fields.begin_day,
            duration_secs: fields.duration_secs,
            bounty: fields.bounty,
            cost: fields.cost,
            max_looses: fields.max_looses,
            min_level: fields.min_level,
        };
        let event = DomainEvent::ChallengeCreated {
            challenge: challenge.clone(),
        };
        (challenge, event)
    }

    pub fn overwrite(mut self, fields: ChallengeFields) -> (Self, DomainEvent) {
        self.name = fields.name;
        self.description = fields.description;
        self.begin_day = fields.begin_day;
        self.duration_secs = fields.duration_secs;
        self.bounty = fields.bounty;
        self.cost = fields.cost;
        self.max_looses = fields.max_looses;
        self.min_level = fields.min_level;

        let event = DomainEvent::ChallengeUpdated {
            challenge: self.clone(),
        };
        (self, event)
    }

    pub fn deleted(self) -> DomainEvent {
        DomainEvent::ChallengeDeleted { challenge: self }
    }
}

impl Aggregate for Challenge {
    fn kind() -> EntityKind {
        EntityKind::Challenge
    }

    fn relation_kind() -> EntityKind {
        EntityKind::PlayerChallenge
    }

    fn id(&self) -> i64 {
        self.id
    }
}

//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};

use crate::aggregate::{check_non_negative, check_positive, ChallengeFields, ClanFields, WarFields};
use crate::domain::{ClanRole, DomainError};

// =========================================================================
// Clan commands
// =========================================================================

/// Command to create a new clan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClanCommand {
    pub fields: ClanFields,
}

impl CreateClanCommand {
    pub fn new(fields: ClanFields) -> Self {
        Self { fields }
    }
}

/// Command to overwrite every mutable field of a clan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateClanCommand {
    pub clan_id: i64,
    pub fields: ClanFields,
}

impl UpdateClanCommand {
    pub fn new(clan_id: i64, fields: ClanFields) -> Self {
        Self { clan_id, fields }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteClanCommand {
    pub clan_id: i64,
}

impl DeleteClanCommand {
    pub fn new(clan_id: i64) -> Self {
        Self { clan_id }
    }
}

/// Command to add a player to a clan with a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddClanPlayerCommand {
    pub clan_id: i64,
    pub player_id: i64,
    #[serde(default)]
    pub role: ClanRole,
}

impl AddClanPlayerCommand {
    pub fn new(clan_id: i64, player_id: i64) -> Self {
        Self {
            clan_id,
            player_id,
            role: ClanRole::Member,
        }
    }

    pub fn with_role(mut self, role: ClanRole) -> Self {
        self.role = role;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_positive("player_id", self.player_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveClanPlayerCommand {
    pub clan_id: i64,
    pub player_id: i64,
}

impl RemoveClanPlayerCommand {
    pub fn new(clan_id: i64, player_id: i64) -> Self {
        Self { clan_id, player_id }
    }
}

// =========================================================================
// Challenge commands
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChallengeCommand {
    pub fields: ChallengeFields,
}

impl CreateChallengeCommand {
    pub fn new(fields: ChallengeFields) -> Self {
        Self { fields }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateChallengeCommand {
    pub challenge_id: i64,
    pub fields: ChallengeFields,
}

impl UpdateChallengeCommand {
    pub fn new(challenge_id: i64, fields: ChallengeFields) -> Self {
        Self {
            challenge_id,
            fields,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteChallengeCommand {
    pub challenge_id: i64,
}

impl DeleteChallengeCommand {
    pub fn new(challenge_id: i64) -> Self {
        Self { challenge_id }
    }
}

/// Command to enter a player into a challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddChallengePlayerCommand {
    pub challenge_id: i64,
    pub player_id: i64,
    #[serde(default)]
    pub won_trophies: i64,
}

impl AddChallengePlayerCommand {
    pub fn new(challenge_id: i64, player_id: i64) -> Self {
        Self {
            challenge_id,
            player_id,
            won_trophies: 0,
        }
    }

    pub fn with_won_trophies(mut self, won_trophies: i64) -> Self {
        self.won_trophies = won_trophies;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_positive("player_id", self.player_id)?;
        check_non_negative("won_trophies", self.won_trophies)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveChallengePlayerCommand {
    pub challenge_id: i64,
    pub player_id: i64,
}

impl RemoveChallengePlayerCommand {
    pub fn new(challenge_id: i64, player_id: i64) -> Self {
        Self {
            challenge_id,
            player_id,
        }
    }
}

// =========================================================================
// War commands
// =========================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWarCommand {
    pub fields: WarFields,
}

impl CreateWarCommand {
    pub fn new(fields: WarFields) -> Self {
        Self { fields }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateWarCommand {
    pub war_id: i64,
    pub fields: WarFields,
}

impl UpdateWarCommand {
    pub fn new(war_id: i64, fields: WarFields) -> Self {
        Self { war_id, fields }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteWarCommand {
    pub war_id: i64,
}

impl DeleteWarCommand {
    pub fn new(war_id: i64) -> Self {
        Self { war_id }
    }
}

/// Command to enter a player into a war
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWarPlayerCommand {
    pub war_id: i64,
    pub player_id: i64,
    #[serde(default)]
    pub won_trophies: i64,
}

impl AddWarPlayerCommand {
    pub fn new(war_id: i64, player_id: i64) -> Self {
        Self {
            war_id,
            player_id,
            won_trophies: 0,
        }
    }

    pub fn with_won_trophies(mut self, won_trophies: i64) -> Self {
        self.won_trophies = won_trophies;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        check_positive("player_id", self.player_id)?;
        check_non_negative("won_trophies", self.won_trophies)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveWarPlayerCommand {
    pub war_id: i64,
    pub player_id: i64,
}

impl RemoveWarPlayerCommand {
    pub fn new(war_id: i64, player_id: i64) -> Self {
        Self { war_id, player_id }
    }
}

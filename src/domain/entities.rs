//! Entities
//!
//! Aggregate roots (Clan, Challenge, War) and the relation rows they own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Region;

/// Kinds of entity known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Clan,
    Challenge,
    War,
    PlayerClan,
    PlayerChallenge,
    PlayerWar,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Clan => "Clan",
            EntityKind::Challenge => "Challenge",
            EntityKind::War => "War",
            EntityKind::PlayerClan => "PlayerClan",
            EntityKind::PlayerChallenge => "PlayerChallenge",
            EntityKind::PlayerWar => "PlayerWar",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary key of an entity: a single id for aggregates,
/// (aggregate id, player id) for relation rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    Id(i64),
    Composite(i64, i64),
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "{}", id),
            EntityKey::Composite(aggregate_id, player_id) => {
                write!(f, "({}, {})", aggregate_id, player_id)
            }
        }
    }
}

// =========================================================================
// Enums
// =========================================================================

/// Privilege level of a player inside a clan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClanRole {
    #[default]
    Member,
    Elder,
    CoChief,
    Chief,
}

impl ClanRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClanRole::Member => "member",
            ClanRole::Elder => "elder",
            ClanRole::CoChief => "co_chief",
            ClanRole::Chief => "chief",
        }
    }
}

impl FromStr for ClanRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(ClanRole::Member),
            "elder" => Ok(ClanRole::Elder),
            "co_chief" => Ok(ClanRole::CoChief),
            "chief" => Ok(ClanRole::Chief),
            other => Err(format!("unknown clan role '{}'", other)),
        }
    }
}

/// Admission policy of a clan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClanType {
    #[default]
    Open,
    InviteOnly,
    Closed,
}

impl ClanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClanType::Open => "open",
            ClanType::InviteOnly => "invite_only",
            ClanType::Closed => "closed",
        }
    }
}

impl FromStr for ClanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ClanType::Open),
            "invite_only" => Ok(ClanType::InviteOnly),
            "closed" => Ok(ClanType::Closed),
            other => Err(format!("unknown clan type '{}'", other)),
        }
    }
}

/// Application-wide roles answered by the identity oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
        }
    }
}

// =========================================================================
// Aggregates
// =========================================================================

/// A clan of players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clan {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub region: Option<Region>,
    pub total_trophies_to_enter: i64,
    pub total_trophies_won_on_war: i64,
    #[serde(rename = "type")]
    pub clan_type: ClanType,
}

/// A timed challenge players can enter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub begin_day: DateTime<Utc>,
    /// Length of the challenge window in seconds
    pub duration_secs: i64,
    pub bounty: i64,
    pub cost: i64,
    pub max_looses: i64,
    pub min_level: i64,
}

/// A clan war
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct War {
    pub id: i64,
    pub begin_day: DateTime<Utc>,
    /// Length of the war window in seconds
    pub duration_secs: i64,
}

/// End of a window, or `None` when it falls outside the representable range
fn window_end(begin: DateTime<Utc>, duration_secs: i64) -> Option<DateTime<Utc>> {
    chrono::Duration::try_seconds(duration_secs).and_then(|d| begin.checked_add_signed(d))
}

impl Challenge {
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        window_end(self.begin_day, self.duration_secs)
    }
}

impl War {
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        window_end(self.begin_day, self.duration_secs)
    }
}

// =========================================================================
// Relation rows
// =========================================================================

/// Clan membership and privilege level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerClan {
    pub clan_id: i64,
    pub player_id: i64,
    pub role: ClanRole,
}

impl PlayerClan {
    pub fn key(&self) -> EntityKey {
        EntityKey::Composite(self.clan_id, self.player_id)
    }

    pub fn is_chief(&self) -> bool {
        self.role == ClanRole::Chief
    }
}

/// Participation of a player in a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerChallenge {
    pub challenge_id: i64,
    pub player_id: i64,
    pub won_trophies: i64,
}

impl PlayerChallenge {
    pub fn key(&self) -> EntityKey {
        EntityKey::Composite(self.challenge_id, self.player_id)
    }
}

/// Participation of a player in a war
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerWar {
    pub war_id: i64,
    pub player_id: i64,
    pub won_trophies: i64,
}

impl PlayerWar {
    pub fn key(&self) -> EntityKey {
        EntityKey::Composite(self.war_id, self.player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_display() {
        assert_eq!(EntityKey::Id(7).to_string(), "7");
        assert_eq!(EntityKey::Composite(3, 9).to_string(), "(3, 9)");
    }

    #[test]
    fn test_clan_role_parse() {
        assert_eq!("chief".parse::<ClanRole>(), Ok(ClanRole::Chief));
        assert_eq!(ClanRole::CoChief.as_str().parse::<ClanRole>(), Ok(ClanRole::CoChief));
        assert!("leader".parse::<ClanRole>().is_err());
    }

    #[test]
    fn test_clan_role_serde() {
        let json = serde_json::to_string(&ClanRole::CoChief).unwrap();
        assert_eq!(json, r#""co_chief""#);
    }

    #[test]
    fn test_war_ends_at() {
        let begin = Utc::now();
        let war = War {
            id: 1,
            begin_day: begin,
            duration_secs: 3600,
        };
        assert_eq!(war.ends_at(), Some(begin + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_ends_at_out_of_range_is_none() {
        let war = War {
            id: 1,
            begin_day: DateTime::<Utc>::MAX_UTC,
            duration_secs: 1,
        };
        assert_eq!(war.ends_at(), None);

        let war = War {
            id: 2,
            begin_day: Utc::now(),
            duration_secs: 10_000_000_000_000,
        };
        assert_eq!(war.ends_at(), None);
    }
}

//! Domain Events
//!
//! Immutable facts describing a change that has been committed.
//! Events are queued on a unit of work and only dispatched after the
//! store has saved that unit of work.

use serde::{Deserialize, Serialize};

use super::{Challenge, Clan, EntityKey, EntityKind, PlayerChallenge, PlayerClan, PlayerWar, War};

/// A membership or participation row, used as the payload of
/// `PlayerAdded` / `PlayerRemoved`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "relation", rename_all = "snake_case")]
pub enum Participation {
    Clan(PlayerClan),
    Challenge(PlayerChallenge),
    War(PlayerWar),
}

impl Participation {
    pub fn kind(&self) -> EntityKind {
        match self {
            Participation::Clan(_) => EntityKind::PlayerClan,
            Participation::Challenge(_) => EntityKind::PlayerChallenge,
            Participation::War(_) => EntityKind::PlayerWar,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Participation::Clan(row) => row.key(),
            Participation::Challenge(row) => row.key(),
            Participation::War(row) => row.key(),
        }
    }

    pub fn player_id(&self) -> i64 {
        match self {
            Participation::Clan(row) => row.player_id,
            Participation::Challenge(row) => row.player_id,
            Participation::War(row) => row.player_id,
        }
    }
}

/// Events raised by the command handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    ClanCreated { clan: Clan },
    ClanUpdated { clan: Clan },
    ClanDeleted { clan: Clan },

    ChallengeCreated { challenge: Challenge },
    ChallengeUpdated { challenge: Challenge },
    ChallengeDeleted { challenge: Challenge },

    WarCreated { war: War },
    WarUpdated { war: War },
    WarDeleted { war: War },

    /// A player joined a clan, challenge or war
    PlayerAdded { relation: Participation },

    /// A player left (or was removed from) a clan, challenge or war
    PlayerRemoved { relation: Participation },
}

impl DomainEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ClanCreated { .. } => "ClanCreated",
            DomainEvent::ClanUpdated { .. } => "ClanUpdated",
            DomainEvent::ClanDeleted { .. } => "ClanDeleted",
            DomainEvent::ChallengeCreated { .. } => "ChallengeCreated",
            DomainEvent::ChallengeUpdated { .. } => "ChallengeUpdated",
            DomainEvent::ChallengeDeleted { .. } => "ChallengeDeleted",
            DomainEvent::WarCreated { .. } => "WarCreated",
            DomainEvent::WarUpdated { .. } => "WarUpdated",
            DomainEvent::WarDeleted { .. } => "WarDeleted",
            DomainEvent::PlayerAdded { .. } => "PlayerAdded",
            DomainEvent::PlayerRemoved { .. } => "PlayerRemoved",
        }
    }

    /// Kind of the entity the event is about
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            DomainEvent::ClanCreated { .. }
            | DomainEvent::ClanUpdated { .. }
            | DomainEvent::ClanDeleted { .. } => EntityKind::Clan,
            DomainEvent::ChallengeCreated { .. }
            | DomainEvent::ChallengeUpdated { .. }
            | DomainEvent::ChallengeDeleted { .. } => EntityKind::Challenge,
            DomainEvent::WarCreated { .. }
            | DomainEvent::WarUpdated { .. }
            | DomainEvent::WarDeleted { .. } => EntityKind::War,
            DomainEvent::PlayerAdded { relation } | DomainEvent::PlayerRemoved { relation } => {
                relation.kind()
            }
        }
    }

    /// Key of the entity the event is about
    pub fn entity_key(&self) -> EntityKey {
        match self {
            DomainEvent::ClanCreated { clan }
            | DomainEvent::ClanUpdated { clan }
            | DomainEvent::ClanDeleted { clan } => EntityKey::Id(clan.id),
            DomainEvent::ChallengeCreated { challenge }
            | DomainEvent::ChallengeUpdated { challenge }
            | DomainEvent::ChallengeDeleted { challenge } => EntityKey::Id(challenge.id),
            DomainEvent::WarCreated { war }
            | DomainEvent::WarUpdated { war }
            | DomainEvent::WarDeleted { war } => EntityKey::Id(war.id),
            DomainEvent::PlayerAdded { relation } | DomainEvent::PlayerRemoved { relation } => {
                relation.key()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ClanRole;

    #[test]
    fn test_player_added_serialization() {
        let event = DomainEvent::PlayerAdded {
            relation: Participation::Clan(PlayerClan {
                clan_id: 4,
                player_id: 11,
                role: ClanRole::Chief,
            }),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "PlayerAdded");
        assert_eq!(json["relation"]["relation"], "clan");
        assert_eq!(json["relation"]["role"], "chief");
    }

    #[test]
    fn test_event_entity_identity() {
        let event = DomainEvent::PlayerRemoved {
            relation: Participation::War(PlayerWar {
                war_id: 2,
                player_id: 5,
                won_trophies: 0,
            }),
        };

        assert_eq!(event.event_type(), "PlayerRemoved");
        assert_eq!(event.entity_kind(), EntityKind::PlayerWar);
        assert_eq!(event.entity_key(), EntityKey::Composite(2, 5));
    }
}

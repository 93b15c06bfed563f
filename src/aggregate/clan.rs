//! Clan Aggregate

use serde::{Deserialize, Serialize};

use crate::domain::{Clan, ClanType, DomainError, DomainEvent, EntityKind, Region};

use super::{check_description, check_name, check_non_negative, Aggregate};

/// Mutable attribute set of a clan.
///
/// Updates overwrite every field: an omitted optional field clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClanFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub total_trophies_to_enter: i64,
    #[serde(default)]
    pub total_trophies_won_on_war: i64,
    #[serde(default, rename = "type")]
    pub clan_type: ClanType,
}

impl ClanFields {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_name(self.name.as_deref())?;
        check_description(self.description.as_deref())?;
        check_non_negative("total_trophies_to_enter", self.total_trophies_to_enter)?;
        check_non_negative("total_trophies_won_on_war", self.total_trophies_won_on_war)?;
        Ok(())
    }
}

impl Clan {
    /// Build a new clan and its creation event
    pub fn create(id: i64, fields: ClanFields) -> (Self, DomainEvent) {
        let clan = Self {
            id,
            name: fields.name,
            description: fields.description,
            region: fields.region,
            total_trophies_to_enter: fields.total_trophies_to_enter,
            total_trophies_won_on_war: fields.total_trophies_won_on_war,
            clan_type: fields.clan_type,
        };
        let event = DomainEvent::ClanCreated { clan: clan.clone() };
        (clan, event)
    }

    /// Replace every mutable field and describe the change
    pub fn overwrite(mut self, fields: ClanFields) -> (Self, DomainEvent) {
        self.name = fields.name;
        self.description = fields.description;
        self.region = fields.region;
        self.total_trophies_to_enter = fields.total_trophies_to_enter;
        self.total_trophies_won_on_war = fields.total_trophies_won_on_war;
        self.clan_type = fields.clan_type;

        let event = DomainEvent::ClanUpdated { clan: self.clone() };
        (self, event)
    }

    pub fn deleted(self) -> DomainEvent {
        DomainEvent::ClanDeleted { clan: self }
    }
}

impl Aggregate for Clan {
    fn kind() -> EntityKind {
        EntityKind::Clan
    }

    fn relation_kind() -> EntityKind {
        EntityKind::PlayerClan
    }

    fn id(&self) -> i64 {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> ClanFields {
        ClanFields {
            name: Some("Hog Riders".to_string()),
            description: Some("Push every lane".to_string()),
            region: Some(Region::new("ES").unwrap()),
            total_trophies_to_enter: 4000,
            total_trophies_won_on_war: 0,
            clan_type: ClanType::InviteOnly,
        }
    }

    #[test]
    fn test_clan_create() {
        let (clan, event) = Clan::create(3, fields());
        assert_eq!(clan.id(), 3);
        assert_eq!(clan.name.as_deref(), Some("Hog Riders"));
        assert_eq!(event, DomainEvent::ClanCreated { clan });
    }

    #[test]
    fn test_clan_overwrite_clears_omitted_fields() {
        let (clan, _) = Clan::create(3, fields());

        let (clan, event) = clan.overwrite(ClanFields {
            name: Some("Hog Riders II".to_string()),
            ..ClanFields::default()
        });

        assert_eq!(clan.name.as_deref(), Some("Hog Riders II"));
        assert_eq!(clan.description, None);
        assert_eq!(clan.region, None);
        assert_eq!(clan.total_trophies_to_enter, 0);
        assert_eq!(clan.clan_type, ClanType::Open);
        assert!(matches!(event, DomainEvent::ClanUpdated { .. }));
    }

    #[test]
    fn test_clan_fields_validation() {
        assert!(fields().validate().is_ok());

        let negative = ClanFields {
            total_trophies_to_enter: -5,
            ..fields()
        };
        assert!(matches!(negative.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_clan_fields_deserialize_defaults() {
        let fields: ClanFields = serde_json::from_str(r#"{"name":"Minions","type":"closed"}"#).unwrap();
        assert_eq!(fields.clan_type, ClanType::Closed);
        assert_eq!(fields.region, None);
        assert_eq!(fields.total_trophies_won_on_war, 0);
    }
}

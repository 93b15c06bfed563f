//! Unit of Work
//!
//! Collects the changes and domain events of one command. Nothing here
//! does I/O; the store applies the changes in a single save and the
//! gate takes the events back only when that save commits.

use crate::domain::{
    Challenge, Clan, DomainEvent, EntityKey, EntityKind, PlayerChallenge, PlayerClan, PlayerWar,
    War,
};

/// A full entity row
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Clan(Clan),
    Challenge(Challenge),
    War(War),
    PlayerClan(PlayerClan),
    PlayerChallenge(PlayerChallenge),
    PlayerWar(PlayerWar),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        self.record_key().kind()
    }

    pub fn record_key(&self) -> RecordKey {
        match self {
            Record::Clan(clan) => RecordKey::Clan(clan.id),
            Record::Challenge(challenge) => RecordKey::Challenge(challenge.id),
            Record::War(war) => RecordKey::War(war.id),
            Record::PlayerClan(row) => RecordKey::PlayerClan(row.clan_id, row.player_id),
            Record::PlayerChallenge(row) => {
                RecordKey::PlayerChallenge(row.challenge_id, row.player_id)
            }
            Record::PlayerWar(row) => RecordKey::PlayerWar(row.war_id, row.player_id),
        }
    }
}

macro_rules! impl_into_record {
    ($($entity:ident),*) => {
        $(
            impl From<$entity> for Record {
                fn from(entity: $entity) -> Self {
                    Record::$entity(entity)
                }
            }
        )*
    };
}

impl_into_record!(Clan, Challenge, War, PlayerClan, PlayerChallenge, PlayerWar);

/// Typed primary key of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Clan(i64),
    Challenge(i64),
    War(i64),
    PlayerClan(i64, i64),
    PlayerChallenge(i64, i64),
    PlayerWar(i64, i64),
}

impl RecordKey {
    pub fn kind(&self) -> EntityKind {
        match self {
            RecordKey::Clan(_) => EntityKind::Clan,
            RecordKey::Challenge(_) => EntityKind::Challenge,
            RecordKey::War(_) => EntityKind::War,
            RecordKey::PlayerClan(..) => EntityKind::PlayerClan,
            RecordKey::PlayerChallenge(..) => EntityKind::PlayerChallenge,
            RecordKey::PlayerWar(..) => EntityKind::PlayerWar,
        }
    }

    pub fn entity_key(&self) -> EntityKey {
        match *self {
            RecordKey::Clan(id) | RecordKey::Challenge(id) | RecordKey::War(id) => EntityKey::Id(id),
            RecordKey::PlayerClan(a, p)
            | RecordKey::PlayerChallenge(a, p)
            | RecordKey::PlayerWar(a, p) => EntityKey::Composite(a, p),
        }
    }
}

/// A staged mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert(Record),
    /// Full overwrite of an existing row
    Update(Record),
    /// Removal of a row; aggregates take their owned relation rows with them
    Delete(RecordKey),
}

impl Change {
    pub fn kind(&self) -> EntityKind {
        match self {
            Change::Insert(record) | Change::Update(record) => record.kind(),
            Change::Delete(key) => key.kind(),
        }
    }
}

/// Changes and queued events of a single command
#[derive(Debug, Default)]
pub struct UnitOfWork {
    changes: Vec<Change>,
    events: Vec<DomainEvent>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: impl Into<Record>) {
        self.changes.push(Change::Insert(record.into()));
    }

    pub fn update(&mut self, record: impl Into<Record>) {
        self.changes.push(Change::Update(record.into()));
    }

    pub fn delete(&mut self, key: RecordKey) {
        self.changes.push(Change::Delete(key));
    }

    /// Buffer an event; it is only released after a successful save
    pub fn queue_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn events(&self) -> &[DomainEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Change>, Vec<DomainEvent>) {
        (self.changes, self.events)
    }
}

//! In-memory Entity Store
//!
//! Same contract as the PostgreSQL store: key uniqueness, relation rows
//! require their parent, one chief per clan, cascading deletes and
//! all-or-nothing saves. Used by the test suite and for embedding.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Challenge, Clan, EntityKind, PlayerChallenge, PlayerClan, PlayerWar, War};

use super::{
    CancelSignal, Change, EntityStore, Page, PageRequest, Record, RecordKey, StoreError,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    last_ids: HashMap<EntityKind, i64>,
    clans: BTreeMap<i64, Clan>,
    challenges: BTreeMap<i64, Challenge>,
    wars: BTreeMap<i64, War>,
    player_clans: BTreeMap<(i64, i64), PlayerClan>,
    player_challenges: BTreeMap<(i64, i64), PlayerChallenge>,
    player_wars: BTreeMap<(i64, i64), PlayerWar>,
}

/// Entity store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    fail_next_save: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `save_all` fail with `StoreError::Unavailable`
    /// without touching the stored state.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Number of rows of every kind, for asserting that nothing changed
    pub async fn row_count(&self) -> usize {
        let state = self.state.read().await;
        state.clans.len()
            + state.challenges.len()
            + state.wars.len()
            + state.player_clans.len()
            + state.player_challenges.len()
            + state.player_wars.len()
    }
}

impl MemoryState {
    fn apply(&mut self, change: &Change) -> Result<(), StoreError> {
        match change {
            Change::Insert(record) => self.insert(record),
            Change::Update(record) => self.update(record),
            Change::Delete(key) => self.delete(*key),
        }
    }

    fn insert(&mut self, record: &Record) -> Result<(), StoreError> {
        let duplicate = || {
            StoreError::Conflict(format!(
                "{} {} already exists",
                record.kind(),
                record.record_key().entity_key()
            ))
        };
        let orphan = |parent: EntityKind, id: i64| {
            StoreError::Conflict(format!("{} {} does not exist", parent, id))
        };

        match record {
            Record::Clan(clan) => {
                if self.clans.contains_key(&clan.id) {
                    return Err(duplicate());
                }
                self.clans.insert(clan.id, clan.clone());
            }
            Record::Challenge(challenge) => {
                if self.challenges.contains_key(&challenge.id) {
                    return Err(duplicate());
                }
                self.challenges.insert(challenge.id, challenge.clone());
            }
            Record::War(war) => {
                if self.wars.contains_key(&war.id) {
                    return Err(duplicate());
                }
                self.wars.insert(war.id, war.clone());
            }
            Record::PlayerClan(row) => {
                if !self.clans.contains_key(&row.clan_id) {
                    return Err(orphan(EntityKind::Clan, row.clan_id));
                }
                let key = (row.clan_id, row.player_id);
                if self.player_clans.contains_key(&key) {
                    return Err(duplicate());
                }
                if row.is_chief() && self.chief_of(row.clan_id).is_some() {
                    return Err(StoreError::Conflict(format!(
                        "Clan {} already has a chief",
                        row.clan_id
                    )));
                }
                self.player_clans.insert(key, row.clone());
            }
            Record::PlayerChallenge(row) => {
                if !self.challenges.contains_key(&row.challenge_id) {
                    return Err(orphan(EntityKind::Challenge, row.challenge_id));
                }
                let key = (row.challenge_id, row.player_id);
                if self.player_challenges.contains_key(&key) {
                    return Err(duplicate());
                }
                self.player_challenges.insert(key, row.clone());
            }
            Record::PlayerWar(row) => {
                if !self.wars.contains_key(&row.war_id) {
                    return Err(orphan(EntityKind::War, row.war_id));
                }
                let key = (row.war_id, row.player_id);
                if self.player_wars.contains_key(&key) {
                    return Err(duplicate());
                }
                self.player_wars.insert(key, row.clone());
            }
        }
        Ok(())
    }

    fn update(&mut self, record: &Record) -> Result<(), StoreError> {
        let replaced = match record {
            Record::Clan(clan) => replace(&mut self.clans, clan.id, clan),
            Record::Challenge(challenge) => replace(&mut self.challenges, challenge.id, challenge),
            Record::War(war) => replace(&mut self.wars, war.id, war),
            Record::PlayerClan(row) => {
                replace(&mut self.player_clans, (row.clan_id, row.player_id), row)
            }
            Record::PlayerChallenge(row) => replace(
                &mut self.player_challenges,
                (row.challenge_id, row.player_id),
                row,
            ),
            Record::PlayerWar(row) => {
                replace(&mut self.player_wars, (row.war_id, row.player_id), row)
            }
        };

        if !replaced {
            return Err(StoreError::Conflict(format!(
                "{} {} no longer exists",
                record.kind(),
                record.record_key().entity_key()
            )));
        }
        Ok(())
    }

    fn delete(&mut self, key: RecordKey) -> Result<(), StoreError> {
        let removed = match key {
            RecordKey::Clan(id) => {
                self.player_clans.retain(|(clan_id, _), _| *clan_id != id);
                self.clans.remove(&id).is_some()
            }
            RecordKey::Challenge(id) => {
                self.player_challenges
                    .retain(|(challenge_id, _), _| *challenge_id != id);
                self.challenges.remove(&id).is_some()
            }
            RecordKey::War(id) => {
                self.player_wars.retain(|(war_id, _), _| *war_id != id);
                self.wars.remove(&id).is_some()
            }
            RecordKey::PlayerClan(a, p) => self.player_clans.remove(&(a, p)).is_some(),
            RecordKey::PlayerChallenge(a, p) => self.player_challenges.remove(&(a, p)).is_some(),
            RecordKey::PlayerWar(a, p) => self.player_wars.remove(&(a, p)).is_some(),
        };

        if !removed {
            return Err(StoreError::Conflict(format!(
                "{} {} no longer exists",
                key.kind(),
                key.entity_key()
            )));
        }
        Ok(())
    }

    fn chief_of(&self, clan_id: i64) -> Option<&PlayerClan> {
        self.player_clans
            .range((clan_id, i64::MIN)..=(clan_id, i64::MAX))
            .map(|(_, row)| row)
            .find(|row| row.is_chief())
    }
}

fn replace<K: Ord, V: Clone>(map: &mut BTreeMap<K, V>, key: K, value: &V) -> bool {
    match map.get_mut(&key) {
        Some(slot) => {
            *slot = value.clone();
            true
        }
        None => false,
    }
}

fn window<T>(rows: impl ExactSizeIterator<Item = T>, page: PageRequest) -> Page<T> {
    let total_count = rows.len() as i64;
    let items = rows
        .skip(page.offset.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect();
    Page { items, total_count }
}

fn rows_of<V: Clone>(map: &BTreeMap<(i64, i64), V>, parent: i64) -> Vec<V> {
    map.range((parent, i64::MIN)..=(parent, i64::MAX))
        .map(|(_, row)| row.clone())
        .collect()
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn next_id(&self, kind: EntityKind, cancel: &CancelSignal) -> Result<i64, StoreError> {
        cancel.check()?;
        let mut state = self.state.write().await;
        let last = state.last_ids.entry(kind).or_insert(0);
        *last += 1;
        Ok(*last)
    }

    async fn find_clan(&self, id: i64, cancel: &CancelSignal) -> Result<Option<Clan>, StoreError> {
        cancel.check()?;
        Ok(self.state.read().await.clans.get(&id).cloned())
    }

    async fn find_challenge(
        &self,
        id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<Challenge>, StoreError> {
        cancel.check()?;
        Ok(self.state.read().await.challenges.get(&id).cloned())
    }

    async fn find_war(&self, id: i64, cancel: &CancelSignal) -> Result<Option<War>, StoreError> {
        cancel.check()?;
        Ok(self.state.read().await.wars.get(&id).cloned())
    }

    async fn find_player_clan(
        &self,
        clan_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerClan>, StoreError> {
        cancel.check()?;
        Ok(self
            .state
            .read()
            .await
            .player_clans
            .get(&(clan_id, player_id))
            .cloned())
    }

    async fn find_player_challenge(
        &self,
        challenge_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerChallenge>, StoreError> {
        cancel.check()?;
        Ok(self
            .state
            .read()
            .await
            .player_challenges
            .get(&(challenge_id, player_id))
            .cloned())
    }

    async fn find_player_war(
        &self,
        war_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerWar>, StoreError> {
        cancel.check()?;
        Ok(self
            .state
            .read()
            .await
            .player_wars
            .get(&(war_id, player_id))
            .cloned())
    }

    async fn find_clan_chief(
        &self,
        clan_id: i64,
        cancel: &CancelSignal,
    ) -> Result<Option<PlayerClan>, StoreError> {
        cancel.check()?;
        Ok(self.state.read().await.chief_of(clan_id).cloned())
    }

    async fn save_all(&self, changes: &[Change], cancel: &CancelSignal) -> Result<(), StoreError> {
        cancel.check()?;
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("save rejected".to_string()));
        }

        let mut state = self.state.write().await;

        // Apply to a copy so a failing change leaves the live state untouched
        let mut staged = state.clone();
        for change in changes {
            staged.apply(change)?;
        }
        cancel.check()?;

        *state = staged;
        Ok(())
    }

    async fn list_clans(&self, page: PageRequest) -> Result<Page<Clan>, StoreError> {
        let state = self.state.read().await;
        Ok(window(state.clans.values().cloned(), page))
    }

    async fn list_challenges(&self, page: PageRequest) -> Result<Page<Challenge>, StoreError> {
        let state = self.state.read().await;
        Ok(window(state.challenges.values().cloned(), page))
    }

    async fn list_wars(&self, page: PageRequest) -> Result<Page<War>, StoreError> {
        let state = self.state.read().await;
        Ok(window(state.wars.values().cloned(), page))
    }

    async fn list_clan_players(&self, clan_id: i64) -> Result<Vec<PlayerClan>, StoreError> {
        Ok(rows_of(&self.state.read().await.player_clans, clan_id))
    }

    async fn list_challenge_players(
        &self,
        challenge_id: i64,
    ) -> Result<Vec<PlayerChallenge>, StoreError> {
        Ok(rows_of(&self.state.read().await.player_challenges, challenge_id))
    }

    async fn list_war_players(&self, war_id: i64) -> Result<Vec<PlayerWar>, StoreError> {
        Ok(rows_of(&self.state.read().await.player_wars, war_id))
    }
}

//! Command Gate
//!
//! The protocol every mutating handler follows: resolve the target,
//! authorize the caller against it, stage the mutation and its events on
//! a `UnitOfWork`, then commit. Events leave the gate only after the
//! store has committed the unit of work they were queued on.

mod access;

pub use access::{AccessFacts, AccessRule};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::aggregate::Aggregate;
use crate::domain::{
    CallerContext, Challenge, Clan, DomainError, EntityKey, EntityKind, PlayerChallenge,
    PlayerClan, PlayerWar, Role, War,
};
use crate::error::{AppError, AppResult};
use crate::events::EventDispatcher;
use crate::identity::IdentityService;
use crate::store::{CancelSignal, EntityStore, UnitOfWork};

fn found<T>(row: Option<T>, kind: EntityKind, key: EntityKey) -> AppResult<T> {
    row.ok_or_else(|| AppError::Domain(DomainError::not_found(kind, key)))
}

/// Shared authorize-load-commit plumbing for the command handlers
#[derive(Clone)]
pub struct CommandGate {
    store: Arc<dyn EntityStore>,
    identity: Arc<dyn IdentityService>,
    events: Arc<dyn EventDispatcher>,
}

impl CommandGate {
    pub fn new(
        store: Arc<dyn EntityStore>,
        identity: Arc<dyn IdentityService>,
        events: Arc<dyn EventDispatcher>,
    ) -> Self {
        Self {
            store,
            identity,
            events,
        }
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Evaluate `rule` for the caller; `ForbiddenAccess` on denial.
    ///
    /// The role oracle is only consulted when the caller's own facts
    /// (player identity, membership in the scoped clan) do not already
    /// satisfy the rule.
    pub async fn authorize(
        &self,
        rule: AccessRule,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let caller_clan_role = match (rule.clan_scope(), caller.player_id) {
            (Some(clan_id), Some(player_id)) => self
                .store
                .find_player_clan(clan_id, player_id, cancel)
                .await?
                .map(|membership| membership.role),
            _ => None,
        };

        let mut facts = AccessFacts {
            caller_player_id: caller.player_id,
            caller_clan_role,
            is_administrator: false,
        };
        if rule.permits(&facts) {
            return Ok(());
        }

        facts.is_administrator = self
            .identity
            .is_in_role(caller.user_id, Role::Administrator, cancel)
            .await?;
        if rule.permits(&facts) {
            return Ok(());
        }

        warn!(
            user_id = %caller.user_id,
            player_id = ?caller.player_id,
            correlation_id = ?caller.correlation_id,
            rule = ?rule,
            "Access denied"
        );
        Err(DomainError::ForbiddenAccess.into())
    }

    // =========================================================================
    // Loading
    // =========================================================================

    pub async fn clan(&self, id: i64, cancel: &CancelSignal) -> AppResult<Clan> {
        found(self.store.find_clan(id, cancel).await?, Clan::kind(), EntityKey::Id(id))
    }

    pub async fn challenge(&self, id: i64, cancel: &CancelSignal) -> AppResult<Challenge> {
        found(
            self.store.find_challenge(id, cancel).await?,
            Challenge::kind(),
            EntityKey::Id(id),
        )
    }

    pub async fn war(&self, id: i64, cancel: &CancelSignal) -> AppResult<War> {
        found(self.store.find_war(id, cancel).await?, War::kind(), EntityKey::Id(id))
    }

    pub async fn player_clan(
        &self,
        clan_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> AppResult<PlayerClan> {
        found(
            self.store.find_player_clan(clan_id, player_id, cancel).await?,
            Clan::relation_kind(),
            EntityKey::Composite(clan_id, player_id),
        )
    }

    pub async fn player_challenge(
        &self,
        challenge_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> AppResult<PlayerChallenge> {
        found(
            self.store
                .find_player_challenge(challenge_id, player_id, cancel)
                .await?,
            Challenge::relation_kind(),
            EntityKey::Composite(challenge_id, player_id),
        )
    }

    pub async fn player_war(
        &self,
        war_id: i64,
        player_id: i64,
        cancel: &CancelSignal,
    ) -> AppResult<PlayerWar> {
        found(
            self.store.find_player_war(war_id, player_id, cancel).await?,
            War::relation_kind(),
            EntityKey::Composite(war_id, player_id),
        )
    }

    /// Reserve an identifier for a new aggregate
    pub async fn next_id<A: Aggregate>(&self, cancel: &CancelSignal) -> AppResult<i64> {
        Ok(self.store.next_id(A::kind(), cancel).await?)
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Save the unit of work, then hand its events to the dispatcher.
    ///
    /// A failed or cancelled save drops the queued events.
    pub async fn commit(&self, work: UnitOfWork, cancel: &CancelSignal) -> AppResult<()> {
        let (changes, events) = work.into_parts();

        if let Err(e) = self.store.save_all(&changes, cancel).await {
            debug!(
                changes = changes.len(),
                dropped_events = events.len(),
                retryable = e.is_retryable(),
                "Unit of work not saved: {}",
                e
            );
            return Err(e.into());
        }

        self.events.dispatch(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::WarFields;
    use crate::domain::{ClanRole, DomainEvent};
    use crate::events::EventBus;
    use crate::identity::StaticIdentity;
    use crate::store::{cancel_pair, MemoryStore};
    use chrono::Utc;
    use uuid::Uuid;

    struct Fixture {
        gate: CommandGate,
        store: Arc<MemoryStore>,
        identity: Arc<StaticIdentity>,
        bus: EventBus,
        admin: Uuid,
    }

    fn fixture() -> Fixture {
        let admin = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(StaticIdentity::new().with_administrator(admin));
        let bus = EventBus::new(16);
        let gate = CommandGate::new(store.clone(), identity.clone(), Arc::new(bus.clone()));
        Fixture {
            gate,
            store,
            identity,
            bus,
            admin,
        }
    }

    async fn seed_clan_with_chief(f: &Fixture, chief_player: i64) -> i64 {
        let never = CancelSignal::never();
        let id = f.gate.next_id::<Clan>(&never).await.unwrap();
        let (clan, _) = Clan::create(id, Default::default());
        let mut work = UnitOfWork::new();
        work.insert(clan);
        work.insert(PlayerClan {
            clan_id: id,
            player_id: chief_player,
            role: ClanRole::Chief,
        });
        f.gate.commit(work, &never).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_self_rule_skips_role_lookup() {
        let f = fixture();
        let caller = CallerContext::new(Uuid::new_v4()).with_player(4);

        f.gate
            .authorize(
                AccessRule::SelfOrAdministrator { player_id: 4 },
                &caller,
                &CancelSignal::never(),
            )
            .await
            .unwrap();
        assert_eq!(f.identity.role_lookups(), 0);
    }

    #[tokio::test]
    async fn test_administrator_rule() {
        let f = fixture();
        let never = CancelSignal::never();

        let admin = CallerContext::new(f.admin);
        f.gate
            .authorize(AccessRule::Administrator, &admin, &never)
            .await
            .unwrap();

        let stranger = CallerContext::new(Uuid::new_v4()).with_player(1);
        let err = f
            .gate
            .authorize(AccessRule::Administrator, &stranger, &never)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::ForbiddenAccess)));
    }

    #[tokio::test]
    async fn test_chief_role_is_scoped_to_its_own_clan() {
        let f = fixture();
        let never = CancelSignal::never();
        let first = seed_clan_with_chief(&f, 10).await;
        let second = seed_clan_with_chief(&f, 20).await;

        let chief_of_first = CallerContext::new(Uuid::new_v4()).with_player(10);
        f.gate
            .authorize(
                AccessRule::ChiefOrAdministrator { clan_id: first },
                &chief_of_first,
                &never,
            )
            .await
            .unwrap();

        let err = f
            .gate
            .authorize(
                AccessRule::ChiefOrAdministrator { clan_id: second },
                &chief_of_first,
                &never,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Domain(DomainError::ForbiddenAccess)));
    }

    #[tokio::test]
    async fn test_missing_entities_are_not_found() {
        let f = fixture();
        let never = CancelSignal::never();

        let err = f.gate.war(0, &never).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            DomainError::not_found(EntityKind::War, EntityKey::Id(0)).to_string()
        );

        let err = f.gate.player_challenge(3, 4, &never).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Domain(DomainError::NotFound {
                kind: EntityKind::PlayerChallenge,
                key: EntityKey::Composite(3, 4),
            })
        ));
    }

    #[tokio::test]
    async fn test_commit_dispatches_after_save() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        let never = CancelSignal::never();

        let id = f.gate.next_id::<War>(&never).await.unwrap();
        let (war, event) = War::create(id, WarFields::new(Utc::now(), 1));
        let mut work = UnitOfWork::new();
        work.insert(war);
        work.queue_event(event);

        assert!(rx.try_recv().is_err());
        f.gate.commit(work, &never).await.unwrap();

        assert!(matches!(rx.try_recv().unwrap(), DomainEvent::WarCreated { .. }));
        assert!(f.store.find_war(id, &never).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_commit_drops_events() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        let never = CancelSignal::never();

        let (war, event) = War::create(1, WarFields::new(Utc::now(), 1));
        let mut work = UnitOfWork::new();
        work.insert(war);
        work.queue_event(event);

        f.store.fail_next_save();
        assert!(f.gate.commit(work, &never).await.is_err());
        assert!(rx.try_recv().is_err());
        assert_eq!(f.store.row_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_commit_drops_events() {
        let f = fixture();
        let mut rx = f.bus.subscribe();
        let (handle, signal) = cancel_pair();

        let (war, event) = War::create(1, WarFields::new(Utc::now(), 1));
        let mut work = UnitOfWork::new();
        work.insert(war);
        work.queue_event(event);

        handle.cancel();
        let err = f.gate.commit(work, &signal).await.unwrap_err();
        assert!(matches!(err, AppError::Store(crate::store::StoreError::Cancelled)));
        assert!(rx.try_recv().is_err());
        assert_eq!(f.store.row_count().await, 0);
    }
}

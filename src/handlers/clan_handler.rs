//! Clan Handler
//!
//! Create, update and delete clans, and manage their membership.

use async_trait::async_trait;
use tracing::info;

use crate::domain::{
    CallerContext, Clan, ClanRole, DomainError, DomainEvent, Participation, PlayerClan,
};
use crate::error::AppResult;
use crate::gate::{AccessRule, CommandGate};
use crate::store::{CancelSignal, EntityStore, RecordKey, UnitOfWork};

use super::commands::{
    AddClanPlayerCommand, CreateClanCommand, DeleteClanCommand, RemoveClanPlayerCommand,
    UpdateClanCommand,
};
use super::CommandHandler;

/// Result of a successful clan creation
#[derive(Debug, Clone)]
pub struct CreateClanResult {
    pub clan_id: i64,
}

/// Handler for every clan command
#[derive(Clone)]
pub struct ClanHandler {
    gate: CommandGate,
}

impl ClanHandler {
    pub fn new(gate: CommandGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl CommandHandler<CreateClanCommand> for ClanHandler {
    type Output = CreateClanResult;

    async fn execute(
        &self,
        command: CreateClanCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<CreateClanResult> {
        command.fields.validate()?;
        self.gate
            .authorize(AccessRule::Authenticated, caller, cancel)
            .await?;

        let clan_id = self.gate.next_id::<Clan>(cancel).await?;
        let (clan, event) = Clan::create(clan_id, command.fields);

        let mut work = UnitOfWork::new();
        work.insert(clan);
        work.queue_event(event);
        self.gate.commit(work, cancel).await?;

        info!(clan_id, user_id = %caller.user_id, "Clan created");
        Ok(CreateClanResult { clan_id })
    }
}

#[async_trait]
impl CommandHandler<UpdateClanCommand> for ClanHandler {
    type Output = Clan;

    async fn execute(
        &self,
        command: UpdateClanCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<Clan> {
        command.fields.validate()?;

        let clan = self.gate.clan(command.clan_id, cancel).await?;
        self.gate
            .authorize(
                AccessRule::ChiefOrAdministrator { clan_id: clan.id },
                caller,
                cancel,
            )
            .await?;

        let (clan, event) = clan.overwrite(command.fields);

        let mut work = UnitOfWork::new();
        work.update(clan.clone());
        work.queue_event(event);
        self.gate.commit(work, cancel).await?;

        info!(clan_id = clan.id, user_id = %caller.user_id, "Clan updated");
        Ok(clan)
    }
}

#[async_trait]
impl CommandHandler<DeleteClanCommand> for ClanHandler {
    type Output = ();

    async fn execute(
        &self,
        command: DeleteClanCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let clan = self.gate.clan(command.clan_id, cancel).await?;
        self.gate
            .authorize(
                AccessRule::ChiefOrAdministrator { clan_id: clan.id },
                caller,
                cancel,
            )
            .await?;

        // Memberships go with the clan
        let mut work = UnitOfWork::new();
        work.delete(RecordKey::Clan(clan.id));
        work.queue_event(clan.deleted());
        self.gate.commit(work, cancel).await?;

        info!(clan_id = command.clan_id, user_id = %caller.user_id, "Clan deleted");
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<AddClanPlayerCommand> for ClanHandler {
    type Output = ();

    async fn execute(
        &self,
        command: AddClanPlayerCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        command.validate()?;

        let clan = self.gate.clan(command.clan_id, cancel).await?;
        self.gate
            .authorize(
                AccessRule::ChiefOrAdministrator { clan_id: clan.id },
                caller,
                cancel,
            )
            .await?;

        let store = self.gate.store();
        if command.role == ClanRole::Chief
            && store.find_clan_chief(clan.id, cancel).await?.is_some()
        {
            return Err(
                DomainError::constraint(format!("clan {} already has a chief", clan.id)).into(),
            );
        }
        if store
            .find_player_clan(clan.id, command.player_id, cancel)
            .await?
            .is_some()
        {
            return Err(DomainError::constraint(format!(
                "player {} is already a member of clan {}",
                command.player_id, clan.id
            ))
            .into());
        }

        let membership = PlayerClan {
            clan_id: clan.id,
            player_id: command.player_id,
            role: command.role,
        };

        let mut work = UnitOfWork::new();
        work.insert(membership.clone());
        work.queue_event(DomainEvent::PlayerAdded {
            relation: Participation::Clan(membership),
        });
        self.gate.commit(work, cancel).await?;

        info!(
            clan_id = clan.id,
            player_id = command.player_id,
            role = command.role.as_str(),
            user_id = %caller.user_id,
            "Player added to clan"
        );
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<RemoveClanPlayerCommand> for ClanHandler {
    type Output = ();

    async fn execute(
        &self,
        command: RemoveClanPlayerCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let clan = self.gate.clan(command.clan_id, cancel).await?;
        self.gate
            .authorize(
                AccessRule::SelfChiefOrAdministrator {
                    clan_id: clan.id,
                    player_id: command.player_id,
                },
                caller,
                cancel,
            )
            .await?;
        let membership = self
            .gate
            .player_clan(clan.id, command.player_id, cancel)
            .await?;

        let mut work = UnitOfWork::new();
        work.delete(RecordKey::PlayerClan(membership.clan_id, membership.player_id));
        work.queue_event(DomainEvent::PlayerRemoved {
            relation: Participation::Clan(membership),
        });
        self.gate.commit(work, cancel).await?;

        info!(
            clan_id = command.clan_id,
            player_id = command.player_id,
            user_id = %caller.user_id,
            "Player removed from clan"
        );
        Ok(())
    }
}

//! War Handler

use async_trait::async_trait;
use tracing::info;

use crate::domain::{CallerContext, DomainError, DomainEvent, Participation, PlayerWar, War};
use crate::error::AppResult;
use crate::gate::{AccessRule, CommandGate};
use crate::store::{CancelSignal, EntityStore, RecordKey, UnitOfWork};

use super::commands::{
    AddWarPlayerCommand, CreateWarCommand, DeleteWarCommand, RemoveWarPlayerCommand,
    UpdateWarCommand,
};
use super::CommandHandler;

#[derive(Debug, Clone)]
pub struct CreateWarResult {
    pub war_id: i64,
}

/// Handler for every war command
#[derive(Clone)]
pub struct WarHandler {
    gate: CommandGate,
}

impl WarHandler {
    pub fn new(gate: CommandGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl CommandHandler<CreateWarCommand> for WarHandler {
    type Output = CreateWarResult;

    async fn execute(
        &self,
        command: CreateWarCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<CreateWarResult> {
        command.fields.validate()?;
        self.gate
            .authorize(AccessRule::Administrator, caller, cancel)
            .await?;

        let war_id = self.gate.next_id::<War>(cancel).await?;
        let (war, event) = War::create(war_id, command.fields);

        let mut work = UnitOfWork::new();
        work.insert(war);
        work.queue_event(event);
        self.gate.commit(work, cancel).await?;

        info!(war_id, user_id = %caller.user_id, "War created");
        Ok(CreateWarResult { war_id })
    }
}

#[async_trait]
impl CommandHandler<UpdateWarCommand> for WarHandler {
    type Output = War;

    async fn execute(
        &self,
        command: UpdateWarCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<War> {
        command.fields.validate()?;

        let war = self.gate.war(command.war_id, cancel).await?;
        self.gate
            .authorize(AccessRule::Administrator, caller, cancel)
            .await?;

        let (war, event) = war.overwrite(command.fields);

        let mut work = UnitOfWork::new();
        work.update(war.clone());
        work.queue_event(event);
        self.gate.commit(work, cancel).await?;

        info!(war_id = war.id, user_id = %caller.user_id, "War updated");
        Ok(war)
    }
}

#[async_trait]
impl CommandHandler<DeleteWarCommand> for WarHandler {
    type Output = ();

    async fn execute(
        &self,
        command: DeleteWarCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let war = self.gate.war(command.war_id, cancel).await?;
        self.gate
            .authorize(AccessRule::Administrator, caller, cancel)
            .await?;

        let mut work = UnitOfWork::new();
        work.delete(RecordKey::War(war.id));
        work.queue_event(war.deleted());
        self.gate.commit(work, cancel).await?;

        info!(war_id = command.war_id, user_id = %caller.user_id, "War deleted");
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<AddWarPlayerCommand> for WarHandler {
    type Output = ();

    async fn execute(
        &self,
        command: AddWarPlayerCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        command.validate()?;

        let war = self.gate.war(command.war_id, cancel).await?;
        self.gate
            .authorize(
                AccessRule::SelfOrAdministrator {
                    player_id: command.player_id,
                },
                caller,
                cancel,
            )
            .await?;

        if self
            .gate
            .store()
            .find_player_war(war.id, command.player_id, cancel)
            .await?
            .is_some()
        {
            return Err(DomainError::constraint(format!(
                "player {} already fights in war {}",
                command.player_id, war.id
            ))
            .into());
        }

        let participation = PlayerWar {
            war_id: war.id,
            player_id: command.player_id,
            won_trophies: command.won_trophies,
        };

        let mut work = UnitOfWork::new();
        work.insert(participation.clone());
        work.queue_event(DomainEvent::PlayerAdded {
            relation: Participation::War(participation),
        });
        self.gate.commit(work, cancel).await?;

        info!(
            war_id = war.id,
            player_id = command.player_id,
            user_id = %caller.user_id,
            "Player added to war"
        );
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<RemoveWarPlayerCommand> for WarHandler {
    type Output = ();

    async fn execute(
        &self,
        command: RemoveWarPlayerCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let war = self.gate.war(command.war_id, cancel).await?;
        self.gate
            .authorize(
                AccessRule::SelfOrAdministrator {
                    player_id: command.player_id,
                },
                caller,
                cancel,
            )
            .await?;
        let participation = self
            .gate
            .player_war(war.id, command.player_id, cancel)
            .await?;

        let mut work = UnitOfWork::new();
        work.delete(RecordKey::PlayerWar(participation.war_id, participation.player_id));
        work.queue_event(DomainEvent::PlayerRemoved {
            relation: Participation::War(participation),
        });
        self.gate.commit(work, cancel).await?;

        info!(
            war_id = command.war_id,
            player_id = command.player_id,
            user_id = %caller.user_id,
            "Player removed from war"
        );
        Ok(())
    }
}

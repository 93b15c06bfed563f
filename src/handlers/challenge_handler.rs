//! Challenge Handler
//!
//! Administrators manage challenges; players enter and leave them.

use async_trait::async_trait;
use tracing::info;

use crate::domain::{
    CallerContext, Challenge, DomainError, DomainEvent, Participation, PlayerChallenge,
};
use crate::error::AppResult;
use crate::gate::{AccessRule, CommandGate};
use crate::store::{CancelSignal, EntityStore, RecordKey, UnitOfWork};

use super::commands::{
    AddChallengePlayerCommand, CreateChallengeCommand, DeleteChallengeCommand,
    RemoveChallengePlayerCommand, UpdateChallengeCommand,
};
use super::CommandHandler;

#[derive(Debug, Clone)]
pub struct CreateChallengeResult {
    pub challenge_id: i64,
}

/// Handler for every challenge command
#[derive(Clone)]
pub struct ChallengeHandler {
    gate: CommandGate,
}

impl ChallengeHandler {
    pub fn new(gate: CommandGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl CommandHandler<CreateChallengeCommand> for ChallengeHandler {
    type Output = CreateChallengeResult;

    async fn execute(
        &self,
        command: CreateChallengeCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<CreateChallengeResult> {
        command.fields.validate()?;
        self.gate
            .authorize(AccessRule::Administrator, caller, cancel)
            .await?;

        let challenge_id = self.gate.next_id::<Challenge>(cancel).await?;
        let (challenge, event) = Challenge::create(challenge_id, command.fields);

        let mut work = UnitOfWork::new();
        work.insert(challenge);
        work.queue_event(event);
        self.gate.commit(work, cancel).await?;

        info!(challenge_id, user_id = %caller.user_id, "Challenge created");
        Ok(CreateChallengeResult { challenge_id })
    }
}

#[async_trait]
impl CommandHandler<UpdateChallengeCommand> for ChallengeHandler {
    type Output = Challenge;

    async fn execute(
        &self,
        command: UpdateChallengeCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<Challenge> {
        command.fields.validate()?;

        let challenge = self.gate.challenge(command.challenge_id, cancel).await?;
        self.gate
            .authorize(AccessRule::Administrator, caller, cancel)
            .await?;

        let (challenge, event) = challenge.overwrite(command.fields);

        let mut work = UnitOfWork::new();
        work.update(challenge.clone());
        work.queue_event(event);
        self.gate.commit(work, cancel).await?;

        info!(challenge_id = challenge.id, user_id = %caller.user_id, "Challenge updated");
        Ok(challenge)
    }
}

#[async_trait]
impl CommandHandler<DeleteChallengeCommand> for ChallengeHandler {
    type Output = ();

    async fn execute(
        &self,
        command: DeleteChallengeCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let challenge = self.gate.challenge(command.challenge_id, cancel).await?;
        self.gate
            .authorize(AccessRule::Administrator, caller, cancel)
            .await?;

        let mut work = UnitOfWork::new();
        work.delete(RecordKey::Challenge(challenge.id));
        work.queue_event(challenge.deleted());
        self.gate.commit(work, cancel).await?;

        info!(challenge_id = command.challenge_id, user_id = %caller.user_id, "Challenge deleted");
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<AddChallengePlayerCommand> for ChallengeHandler {
    type Output = ();

    async fn execute(
        &self,
        command: AddChallengePlayerCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        command.validate()?;

        let challenge = self.gate.challenge(command.challenge_id, cancel).await?;
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
            .find_player_challenge(challenge.id, command.player_id, cancel)
            .await?
            .is_some()
        {
            return Err(DomainError::constraint(format!(
                "player {} already takes part in challenge {}",
                command.player_id, challenge.id
            ))
            .into());
        }

        let participation = PlayerChallenge {
            challenge_id: challenge.id,
            player_id: command.player_id,
            won_trophies: command.won_trophies,
        };

        let mut work = UnitOfWork::new();
        work.insert(participation.clone());
        work.queue_event(DomainEvent::PlayerAdded {
            relation: Participation::Challenge(participation),
        });
        self.gate.commit(work, cancel).await?;

        info!(
            challenge_id = challenge.id,
            player_id = command.player_id,
            user_id = %caller.user_id,
            "Player added to challenge"
        );
        Ok(())
    }
}

#[async_trait]
impl CommandHandler<RemoveChallengePlayerCommand> for ChallengeHandler {
    type Output = ();

    async fn execute(
        &self,
        command: RemoveChallengePlayerCommand,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<()> {
        let challenge = self.gate.challenge(command.challenge_id, cancel).await?;
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
            .player_challenge(challenge.id, command.player_id, cancel)
            .await?;

        let mut work = UnitOfWork::new();
        work.delete(RecordKey::PlayerChallenge(
            participation.challenge_id,
            participation.player_id,
        ));
        work.queue_event(DomainEvent::PlayerRemoved {
            relation: Participation::Challenge(participation),
        });
        self.gate.commit(work, cancel).await?;

        info!(
            challenge_id = command.challenge_id,
            player_id = command.player_id,
            user_id = %caller.user_id,
            "Player removed from challenge"
        );
        Ok(())
    }
}

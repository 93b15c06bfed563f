//! Command Handlers module
//!
//! One handler per aggregate. Each command runs as a single unit of work
//! through the `CommandGate`: resolve the target, authorize, mutate, commit.

mod challenge_handler;
mod clan_handler;
mod commands;
mod war_handler;


use async_trait::async_trait;

use crate::domain::CallerContext;
use crate::error::AppResult;
use crate::store::CancelSignal;

pub use challenge_handler::{ChallengeHandler, CreateChallengeResult};
pub use clan_handler::{ClanHandler, CreateClanResult};
pub use commands::*;
pub use war_handler::{CreateWarResult, WarHandler};

/// Executes command `C` on behalf of a caller
#[async_trait]
pub trait CommandHandler<C: Send + 'static>: Send + Sync {
    type Output: Send;

    async fn execute(
        &self,
        command: C,
        caller: &CallerContext,
        cancel: &CancelSignal,
    ) -> AppResult<Self::Output>;
}

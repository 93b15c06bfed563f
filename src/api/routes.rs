//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::aggregate::{ChallengeFields, ClanFields, WarFields};
use crate::domain::{CallerContext, Challenge, Clan, PlayerChallenge, PlayerClan, PlayerWar, War};
use crate::error::AppError;
use crate::events::EventDispatcher;
use crate::gate::CommandGate;
use crate::handlers::{
    AddChallengePlayerCommand, AddClanPlayerCommand, AddWarPlayerCommand, ChallengeHandler,
    ClanHandler, CommandHandler, CreateChallengeCommand, CreateClanCommand, CreateWarCommand,
    DeleteChallengeCommand, DeleteClanCommand, DeleteWarCommand, RemoveChallengePlayerCommand,
    RemoveClanPlayerCommand, RemoveWarPlayerCommand, UpdateChallengeCommand, UpdateClanCommand,
    UpdateWarCommand, WarHandler,
};
use crate::identity::IdentityService;
use crate::queries::{
    ChallengeBriefDto, ClanBriefDto, PageParams, PaginatedList, QueryService, WarBriefDto,
};
use crate::store::{CancelSignal, EntityStore};

// =========================================================================
// Application state
// =========================================================================

/// Shared collaborators of every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    pub identity: Arc<dyn IdentityService>,
    pub events: Arc<dyn EventDispatcher>,
}

impl AppState {
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

    pub fn gate(&self) -> CommandGate {
        CommandGate::new(self.store.clone(), self.identity.clone(), self.events.clone())
    }

    pub fn queries(&self) -> QueryService {
        QueryService::new(self.store.clone())
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateClanRequest {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ClanFields,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateChallengeRequest {
    pub id: i64,
    #[serde(flatten)]
    pub fields: ChallengeFields,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateWarRequest {
    pub id: i64,
    #[serde(flatten)]
    pub fields: WarFields,
}

fn check_path_id(path_id: i64, body_id: i64) -> Result<(), AppError> {
    if path_id != body_id {
        return Err(AppError::InvalidRequest(format!(
            "path id {} does not match body id {}",
            path_id, body_id
        )));
    }
    Ok(())
}

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Clans
        .route("/clans", post(create_clan).get(list_clans))
        .route(
            "/clans/player",
            post(add_clan_player).delete(remove_clan_player),
        )
        .route(
            "/clans/:id",
            get(get_clan).put(update_clan).delete(delete_clan),
        )
        .route("/clans/:id/players", get(get_clan_players))
        // Challenges
        .route("/challenges", post(create_challenge).get(list_challenges))
        .route(
            "/challenges/player",
            post(add_challenge_player).delete(remove_challenge_player),
        )
        .route(
            "/challenges/:id",
            get(get_challenge)
                .put(update_challenge)
                .delete(delete_challenge),
        )
        .route("/challenges/:id/players", get(get_challenge_players))
        // Wars
        .route("/wars", post(create_war).get(list_wars))
        .route(
            "/wars/player",
            post(add_war_player).delete(remove_war_player),
        )
        .route("/wars/:id", get(get_war).put(update_war).delete(delete_war))
        .route("/wars/:id/players", get(get_war_players))
}

// =========================================================================
// Clans
// =========================================================================

async fn create_clan(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(fields): Json<ClanFields>,
) -> Result<(StatusCode, Json<i64>), AppError> {
    let handler = ClanHandler::new(state.gate());
    let result = handler
        .execute(CreateClanCommand::new(fields), &caller, &CancelSignal::never())
        .await?;

    Ok((StatusCode::CREATED, Json(result.clan_id)))
}

async fn update_clan(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateClanRequest>,
) -> Result<StatusCode, AppError> {
    check_path_id(id, request.id)?;

    let handler = ClanHandler::new(state.gate());
    handler
        .execute(
            UpdateClanCommand::new(id, request.fields),
            &caller,
            &CancelSignal::never(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_clan(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let handler = ClanHandler::new(state.gate());
    handler
        .execute(DeleteClanCommand::new(id), &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_clan_player(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(command): Json<AddClanPlayerCommand>,
) -> Result<StatusCode, AppError> {
    let handler = ClanHandler::new(state.gate());
    handler
        .execute(command, &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn remove_clan_player(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(command): Json<RemoveClanPlayerCommand>,
) -> Result<StatusCode, AppError> {
    let handler = ClanHandler::new(state.gate());
    handler
        .execute(command, &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_clan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Clan>, AppError> {
    Ok(Json(state.queries().clan(id).await?))
}

async fn list_clans(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedList<ClanBriefDto>>, AppError> {
    Ok(Json(state.queries().clans(params).await?))
}

async fn get_clan_players(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PlayerClan>>, AppError> {
    Ok(Json(state.queries().clan_players(id).await?))
}

// =========================================================================
// Challenges
// =========================================================================

async fn create_challenge(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(fields): Json<ChallengeFields>,
) -> Result<(StatusCode, Json<i64>), AppError> {
    let handler = ChallengeHandler::new(state.gate());
    let result = handler
        .execute(
            CreateChallengeCommand::new(fields),
            &caller,
            &CancelSignal::never(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(result.challenge_id)))
}

async fn update_challenge(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateChallengeRequest>,
) -> Result<StatusCode, AppError> {
    check_path_id(id, request.id)?;

    let handler = ChallengeHandler::new(state.gate());
    handler
        .execute(
            UpdateChallengeCommand::new(id, request.fields),
            &caller,
            &CancelSignal::never(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_challenge(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let handler = ChallengeHandler::new(state.gate());
    handler
        .execute(DeleteChallengeCommand::new(id), &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_challenge_player(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(command): Json<AddChallengePlayerCommand>,
) -> Result<StatusCode, AppError> {
    let handler = ChallengeHandler::new(state.gate());
    handler
        .execute(command, &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn remove_challenge_player(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(command): Json<RemoveChallengePlayerCommand>,
) -> Result<StatusCode, AppError> {
    let handler = ChallengeHandler::new(state.gate());
    handler
        .execute(command, &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_challenge(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Challenge>, AppError> {
    Ok(Json(state.queries().challenge(id).await?))
}

async fn list_challenges(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedList<ChallengeBriefDto>>, AppError> {
    Ok(Json(state.queries().challenges(params).await?))
}

async fn get_challenge_players(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PlayerChallenge>>, AppError> {
    Ok(Json(state.queries().challenge_players(id).await?))
}

// =========================================================================
// Wars
// =========================================================================

async fn create_war(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(fields): Json<WarFields>,
) -> Result<(StatusCode, Json<i64>), AppError> {
    let handler = WarHandler::new(state.gate());
    let result = handler
        .execute(CreateWarCommand::new(fields), &caller, &CancelSignal::never())
        .await?;

    Ok((StatusCode::CREATED, Json(result.war_id)))
}

async fn update_war(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateWarRequest>,
) -> Result<StatusCode, AppError> {
    check_path_id(id, request.id)?;

    let handler = WarHandler::new(state.gate());
    handler
        .execute(
            UpdateWarCommand::new(id, request.fields),
            &caller,
            &CancelSignal::never(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn delete_war(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let handler = WarHandler::new(state.gate());
    handler
        .execute(DeleteWarCommand::new(id), &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_war_player(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(command): Json<AddWarPlayerCommand>,
) -> Result<StatusCode, AppError> {
    let handler = WarHandler::new(state.gate());
    handler
        .execute(command, &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn remove_war_player(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerContext>,
    Json(command): Json<RemoveWarPlayerCommand>,
) -> Result<StatusCode, AppError> {
    let handler = WarHandler::new(state.gate());
    handler
        .execute(command, &caller, &CancelSignal::never())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn get_war(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<War>, AppError> {
    Ok(Json(state.queries().war(id).await?))
}

async fn list_wars(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PaginatedList<WarBriefDto>>, AppError> {
    Ok(Json(state.queries().wars(params).await?))
}

async fn get_war_players(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<PlayerWar>>, AppError> {
    Ok(Json(state.queries().war_players(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_flattens_fields() {
        let request: UpdateWarRequest = serde_json::from_str(
            r#"{"id": 3, "begin_day": "2024-03-01T12:00:00Z", "duration_secs": 2}"#,
        )
        .unwrap();
        assert_eq!(request.id, 3);
        assert_eq!(request.fields.duration_secs, 2);

        let request: UpdateClanRequest =
            serde_json::from_str(r#"{"id": 1, "name": "Vikings", "type": "closed"}"#).unwrap();
        assert_eq!(request.fields.name.as_deref(), Some("Vikings"));
        assert_eq!(request.fields.total_trophies_to_enter, 0);
    }

    #[test]
    fn test_check_path_id() {
        assert!(check_path_id(1, 1).is_ok());
        assert!(matches!(
            check_path_id(1, 2),
            Err(AppError::InvalidRequest(_))
        ));
    }
}

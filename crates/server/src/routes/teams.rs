use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use db::{
    models::{
        team::{CreateTeam, Team, UpdateTeam},
        user::User,
    },
    types::RoleName,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::auth::AuthUser, middleware::load_team_middleware,
};

#[derive(Debug, Deserialize, TS)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

pub async fn get_teams(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Team>>>, ApiError> {
    let teams = Team::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(teams)))
}

pub async fn get_team(
    Extension(team): Extension<Team>,
) -> Result<ResponseJson<ApiResponse<Team>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(team)))
}

pub async fn create_team(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateTeam>,
) -> Result<ResponseJson<ApiResponse<Team>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Team name is required".to_string()));
    }

    let team = Team::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(team)))
}

pub async fn update_team(
    Extension(auth): Extension<AuthUser>,
    Extension(existing_team): Extension<Team>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateTeam>,
) -> Result<ResponseJson<ApiResponse<Team>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    let name = payload.name.unwrap_or(existing_team.name);
    let description = match payload.description {
        Some(s) if s.trim().is_empty() => None,
        Some(s) => Some(s),
        None => existing_team.description,
    };

    let team = Team::update(&deployment.db().pool, existing_team.id, name, description).await?;
    Ok(ResponseJson(ApiResponse::success(team)))
}

pub async fn delete_team(
    Extension(auth): Extension<AuthUser>,
    Extension(team): Extension<Team>,
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<()>>), ApiError> {
    auth.require_role(RoleName::Manager)?;

    Team::delete(&deployment.db().pool, team.id).await?;
    Ok((StatusCode::ACCEPTED, ResponseJson(ApiResponse::success(()))))
}

pub async fn get_members(
    Extension(team): Extension<Team>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let members = Team::members(&deployment.db().pool, team.id).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub async fn add_member(
    Extension(auth): Extension<AuthUser>,
    Extension(team): Extension<Team>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    Team::add_member(&deployment.db().pool, team.id, payload.user_id).await?;
    let members = Team::members(&deployment.db().pool, team.id).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

// Two path params, so this one skips the team-loader middleware.
pub async fn remove_member(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    Team::remove_member(&deployment.db().pool, team_id, user_id).await?;
    let members = Team::members(&deployment.db().pool, team_id).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let team_id_router = Router::new()
        .route("/", get(get_team))
        .route("/", put(update_team))
        .route("/", delete(delete_team))
        .route("/members", get(get_members).post(add_member))
        .layer(from_fn_with_state(deployment.clone(), load_team_middleware));

    let inner = Router::new()
        .route("/", get(get_teams).post(create_team))
        .nest(
            "/{team_id}",
            team_id_router.route("/members/{user_id}", delete(remove_member)),
        );

    Router::new().nest("/teams", inner)
}

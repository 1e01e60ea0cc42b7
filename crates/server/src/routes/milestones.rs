use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    models::milestone::{CreateMilestone, Milestone},
    types::RoleName,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::auth::AuthUser, middleware::load_milestone_middleware,
};

pub async fn get_project_milestones(
    State(deployment): State<DeploymentImpl>,
    Path(project_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Vec<Milestone>>>, ApiError> {
    let milestones = Milestone::find_by_project_id(&deployment.db().pool, project_id).await?;
    Ok(ResponseJson(ApiResponse::success(milestones)))
}

pub async fn get_milestone(
    Extension(milestone): Extension<Milestone>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(milestone)))
}

pub async fn create_milestone(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateMilestone>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Milestone name is required".to_string(),
        ));
    }

    let milestone = Milestone::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(milestone)))
}

pub async fn close_milestone(
    Extension(auth): Extension<AuthUser>,
    Extension(milestone): Extension<Milestone>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    let closed = Milestone::close(&deployment.db().pool, milestone.id).await?;
    Ok(ResponseJson(ApiResponse::success(closed)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let milestone_id_router = Router::new()
        .route("/", get(get_milestone))
        .route("/close", post(close_milestone))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_milestone_middleware,
        ));

    let inner = Router::new()
        .route("/", post(create_milestone))
        .route("/project/{project_id}", get(get_project_milestones))
        .nest("/{milestone_id}", milestone_id_router);

    Router::new().nest("/milestones", inner)
}

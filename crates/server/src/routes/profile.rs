use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::user_profile::{UpdateUserProfile, UserProfile};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, http::auth::AuthUser};

pub async fn get_my_profile(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    let profile = UserProfile::find_by_user_id(&deployment.db().pool, auth.id())
        .await?
        .ok_or(ApiError::NotFound("Profile not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub async fn update_my_profile(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateUserProfile>,
) -> Result<ResponseJson<ApiResponse<UserProfile>>, ApiError> {
    if UserProfile::find_by_user_id(&deployment.db().pool, auth.id())
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("Profile not found".to_string()));
    }

    let profile = UserProfile::update(&deployment.db().pool, auth.id(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(profile)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/profile/me", get(get_my_profile))
        .route("/profile/me", put(update_my_profile))
}

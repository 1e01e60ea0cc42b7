use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::post,
};
use db::models::user_request::UserRequest;
use services::services::auth::{LoginRequest, LoginResponse, RegisterRequest};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn register(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<RegisterRequest>,
) -> Result<ResponseJson<ApiResponse<UserRequest>>, ApiError> {
    let request = deployment
        .auth()
        .register(&deployment.db().pool, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn login(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let (secret, token_expiry_hours) = {
        let config = deployment.config().read().await;
        (config.jwt_secret.clone(), config.token_expiry_hours)
    };

    let response = deployment
        .auth()
        .login(&deployment.db().pool, &secret, token_expiry_hours, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

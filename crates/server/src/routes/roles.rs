use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::models::role::Role;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_roles(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Role>>>, ApiError> {
    let roles = Role::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(roles)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/roles", get(get_roles))
}

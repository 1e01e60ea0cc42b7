use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::{
    models::{
        user::{User, UserWithRoles},
        user_request::UserRequest,
    },
    types::RoleName,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, http::auth::AuthUser};

#[derive(Debug, Deserialize, TS)]
pub struct ApproveUserRequest {
    pub role_id: Uuid,
}

#[derive(Debug, Deserialize, TS)]
pub struct RejectUserRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct ChangeRoleRequest {
    pub role_id: Uuid,
}

pub async fn list_user_requests(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<UserRequest>>>, ApiError> {
    auth.require_role(RoleName::Admin)?;

    let requests = UserRequest::find_pending(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(requests)))
}

pub async fn approve_user(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ApproveUserRequest>,
) -> Result<ResponseJson<ApiResponse<UserWithRoles>>, ApiError> {
    auth.require_role(RoleName::Admin)?;

    let user = deployment
        .auth()
        .approve_request(&deployment.db().pool, request_id, payload.role_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn reject_user(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<RejectUserRequest>,
) -> Result<ResponseJson<ApiResponse<UserRequest>>, ApiError> {
    auth.require_role(RoleName::Admin)?;

    let request = deployment
        .auth()
        .reject_request(&deployment.db().pool, request_id, payload.comment)
        .await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn list_users(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    auth.require_role(RoleName::Admin)?;

    let users = User::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn change_user_role(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<ResponseJson<ApiResponse<UserWithRoles>>, ApiError> {
    auth.require_role(RoleName::Admin)?;

    let user = deployment
        .auth()
        .change_role(&deployment.db().pool, user_id, payload.role_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/management/user-requests", get(list_user_requests))
        .route("/management/approve-user/{request_id}", put(approve_user))
        .route("/management/reject-user/{request_id}", put(reject_user))
        .route("/management/users", get(list_users))
        .route("/management/users/{user_id}/role", put(change_user_role))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use db::types::RoleName;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support::{
        json_request, response_data, response_json, seed_user_with_role, setup_deployment,
    };

    async fn register(app: &axum::Router, email: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": email,
                    "password": "hunter2!",
                    "first_name": "New",
                    "last_name": "Hire",
                })),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        response_data(&body)
    }

    async fn role_id_by_name(app: &axum::Router, token: &str, name: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/roles", Some(token), None))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        response_data(&body)
            .as_array()
            .unwrap()
            .iter()
            .find(|role| role["name"] == name)
            .expect("role seeded")["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn approved_request_creates_a_working_account() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_admin, admin_token) =
            seed_user_with_role(&deployment, "admin@example.com", RoleName::Admin).await;

        let request = register(&app, "hire@example.com").await;
        assert_eq!(request["status"], "pending");
        let request_id = request["id"].as_str().unwrap();

        // The request shows up in the pending queue.
        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/management/user-requests",
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        let (_status, body) = response_json(response).await;
        assert_eq!(response_data(&body).as_array().unwrap().len(), 1);

        let role_id = role_id_by_name(&app, &admin_token, "employee").await;
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/management/approve-user/{request_id}"),
                Some(&admin_token),
                Some(json!({"role_id": role_id})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let approved = response_data(&body);
        assert_eq!(approved["email"], "hire@example.com");
        assert_eq!(approved["roles"], json!(["employee"]));

        // Exactly one user exists besides the seeded admin.
        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/management/users",
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        let (_status, body) = response_json(response).await;
        assert_eq!(response_data(&body).as_array().unwrap().len(), 2);

        // The queue is drained and re-approval conflicts.
        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/management/user-requests",
                Some(&admin_token),
                None,
            ))
            .await
            .unwrap();
        let (_status, body) = response_json(response).await;
        assert!(response_data(&body).as_array().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/management/approve-user/{request_id}"),
                Some(&admin_token),
                Some(json!({"role_id": role_id_by_name(&app, &admin_token, "employee").await})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        // The new account can log in.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({"email": "hire@example.com", "password": "hunter2!"})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let login = response_data(&body);
        assert!(login["token"].as_str().is_some());
        assert_eq!(login["user"]["roles"], json!(["employee"]));
    }

    #[tokio::test]
    async fn rejection_requires_a_comment() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_admin, admin_token) =
            seed_user_with_role(&deployment, "admin@example.com", RoleName::Admin).await;

        let request = register(&app, "maybe@example.com").await;
        let request_id = request["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/management/reject-user/{request_id}"),
                Some(&admin_token),
                Some(json!({"comment": "   "})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/management/reject-user/{request_id}"),
                Some(&admin_token),
                Some(json!({"comment": "References missing"})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let rejected = response_data(&body);
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["review_comment"], "References missing");
        assert!(!rejected["reviewed_at"].is_null());
    }

    #[tokio::test]
    async fn management_endpoints_require_the_admin_role() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_employee, token) =
            seed_user_with_role(&deployment, "employee@example.com", RoleName::Employee).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/management/user-requests",
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());

        register(&app, "dup@example.com").await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({
                    "email": "dup@example.com",
                    "password": "hunter2!",
                    "first_name": "New",
                    "last_name": "Hire",
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}

use axum::{
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use chrono::Duration;
use db::{
    models::{
        role::Role,
        user::{CreateUser, User},
        user_role,
    },
    types::RoleName,
};
use test_support::TestEnvGuard;
use utils_jwt::{Claims, sign_token};
use uuid::Uuid;

use crate::DeploymentImpl;

pub async fn setup_deployment() -> (TestEnvGuard, DeploymentImpl) {
    let temp_root = std::env::temp_dir().join(format!("pm-test-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&temp_root).unwrap();

    let db_path = temp_root.join("db.sqlite");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
    let env_guard = TestEnvGuard::new(&temp_root, db_url);

    let deployment = DeploymentImpl::new().await.unwrap();

    (env_guard, deployment)
}

pub async fn mint_token(deployment: &DeploymentImpl, user_id: Uuid, roles: &[RoleName]) -> String {
    let secret = deployment.config().read().await.jwt_secret.clone();
    let claims = Claims::new(
        user_id,
        roles.iter().map(|role| role.to_string()).collect(),
        Duration::hours(1),
    );
    sign_token(&claims, &secret).unwrap()
}

pub async fn seed_user_with_role(
    deployment: &DeploymentImpl,
    email: &str,
    role: RoleName,
) -> (User, String) {
    let pool = &deployment.db().pool;
    let user = User::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "seeded".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .unwrap();

    let role_row = Role::find_by_name(pool, role).await.unwrap().unwrap();
    user_role::assign(pool, user.id, role_row.id).await.unwrap();

    let token = mint_token(deployment, user.id, &[role]).await;
    (user, token)
}

pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn response_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Unwraps the `data` field of a successful ApiResponse envelope.
pub fn response_data(body: &serde_json::Value) -> serde_json::Value {
    assert_eq!(
        body.get("success").and_then(|v| v.as_bool()),
        Some(true),
        "expected success envelope, got: {body}"
    );
    body.get("data").cloned().unwrap_or(serde_json::Value::Null)
}

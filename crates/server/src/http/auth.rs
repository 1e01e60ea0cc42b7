use axum::{
    Json,
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::types::RoleName;
use utils::response::ApiResponse;
use utils_jwt::{Claims, verify_token};
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// Verified identity riding the request as an extension. Everything in it
/// comes from the token signature; there is no parallel user-id header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.claims.sub
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.claims.has_role(&role.to_string())
    }

    pub fn require_role(&self, role: RoleName) -> Result<(), ApiError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "This action requires the {role} role"
            )))
        }
    }
}

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn unauthorized(path: &str, method: &axum::http::Method, reason: &'static str) -> Response {
    tracing::warn!(path = %path, method = %method, reason, "Unauthorized API request");
    let response = ApiResponse::<()>::error("Unauthorized");
    (axum::http::StatusCode::UNAUTHORIZED, Json(response)).into_response()
}

pub async fn require_auth(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let secret = {
        let config = deployment.config().read().await;
        config.jwt_secret.clone()
    };

    let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    else {
        return unauthorized(req.uri().path(), req.method(), "missing_token");
    };

    let claims = match verify_token(token, &secret) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!("Token rejected: {}", err);
            return unauthorized(req.uri().path(), req.method(), "invalid_token");
        }
    };

    req.extensions_mut().insert(AuthUser { claims });
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn bearer_parsing_accepts_case_insensitive_prefix() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("  Bearer   abc  "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("Bearer"), None);
    }

    #[test]
    fn role_checks_use_token_claims() {
        let claims = Claims::new(
            Uuid::new_v4(),
            vec!["manager".to_string()],
            Duration::hours(1),
        );
        let user = AuthUser { claims };
        assert!(user.has_role(RoleName::Manager));
        assert!(user.require_role(RoleName::Manager).is_ok());
        assert!(matches!(
            user.require_role(RoleName::Admin),
            Err(ApiError::Forbidden(_))
        ));
    }
}

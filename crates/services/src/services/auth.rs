use chrono::Duration;
use db::{
    DbErr, DbPool, TransactionTrait,
    models::{
        role::Role,
        user::{CreateUser, User, UserWithRoles},
        user_profile::UserProfile,
        user_request::{CreateUserRequest, UserRequest},
        user_role,
    },
    types::RequestStatus,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utils_jwt::{Claims, JwtError, sign_token};
use uuid::Uuid;

use super::password::{self, PasswordError};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email is already registered")]
    EmailTaken,
    #[error("User request not found")]
    RequestNotFound,
    #[error("User request has already been reviewed")]
    RequestAlreadyReviewed,
    #[error("Role not found")]
    RoleNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Deserialize, TS)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Deserialize, TS)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, TS)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserWithRoles,
}

#[derive(Clone, Default)]
pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        Self
    }

    /// Registration only files a request; an admin turns it into a user.
    pub async fn register(
        &self,
        pool: &DbPool,
        payload: RegisterRequest,
    ) -> Result<UserRequest, AuthServiceError> {
        let email = payload.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthServiceError::ValidationError(
                "A valid email address is required".to_string(),
            ));
        }
        if payload.password.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "Password must not be empty".to_string(),
            ));
        }

        if User::find_by_email(pool, &email).await?.is_some()
            || UserRequest::pending_exists_by_email(pool, &email).await?
        {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = password::hash_password(&payload.password)?;
        let request = UserRequest::create(
            pool,
            &CreateUserRequest {
                email,
                password_hash,
                first_name: payload.first_name.trim().to_string(),
                last_name: payload.last_name.trim().to_string(),
            },
            Uuid::new_v4(),
        )
        .await?;

        tracing::info!(request_id = %request.id, "Filed registration request");
        Ok(request)
    }

    pub async fn login(
        &self,
        pool: &DbPool,
        secret: &str,
        token_expiry_hours: i64,
        payload: LoginRequest,
    ) -> Result<LoginResponse, AuthServiceError> {
        let email = payload.email.trim().to_lowercase();

        // Unknown email and wrong password are indistinguishable to the
        // caller.
        let credentials = User::credentials_by_email(pool, &email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !password::verify_password(&payload.password, &credentials.password_hash)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let roles = User::roles(pool, credentials.user.id).await?;
        let role_names: Vec<String> = roles.iter().map(|role| role.to_string()).collect();

        let claims = Claims::new(
            credentials.user.id,
            role_names,
            Duration::hours(token_expiry_hours),
        );
        let token = sign_token(&claims, secret)?;

        Ok(LoginResponse {
            token,
            user: UserWithRoles {
                user: credentials.user,
                roles,
            },
        })
    }

    /// Approval creates the user, its role link, and an empty profile in
    /// one transaction, then marks the request reviewed.
    pub async fn approve_request(
        &self,
        pool: &DbPool,
        request_id: Uuid,
        role_id: Uuid,
    ) -> Result<UserWithRoles, AuthServiceError> {
        let request = UserRequest::find_by_id(pool, request_id)
            .await?
            .ok_or(AuthServiceError::RequestNotFound)?;
        if request.status != RequestStatus::Pending {
            return Err(AuthServiceError::RequestAlreadyReviewed);
        }

        let role = Role::find_by_id(pool, role_id)
            .await?
            .ok_or(AuthServiceError::RoleNotFound)?;

        let credentials = UserRequest::credentials(pool, request_id)
            .await?
            .ok_or(AuthServiceError::RequestNotFound)?;

        if User::find_by_email(pool, &credentials.email).await?.is_some() {
            return Err(AuthServiceError::EmailTaken);
        }

        let user_id = Uuid::new_v4();
        let tx = pool.begin().await?;
        let user = User::create(
            &tx,
            &CreateUser {
                email: credentials.email,
                password_hash: credentials.password_hash,
                first_name: credentials.first_name,
                last_name: credentials.last_name,
            },
            user_id,
        )
        .await?;
        user_role::assign(&tx, user.id, role.id).await?;
        UserProfile::create_empty(&tx, user.id).await?;
        UserRequest::mark_reviewed(&tx, request_id, RequestStatus::Approved, None).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, role = %role.name, "Approved registration request");
        Ok(UserWithRoles {
            user,
            roles: vec![role.name],
        })
    }

    pub async fn reject_request(
        &self,
        pool: &DbPool,
        request_id: Uuid,
        comment: String,
    ) -> Result<UserRequest, AuthServiceError> {
        let comment = comment.trim().to_string();
        if comment.is_empty() {
            return Err(AuthServiceError::ValidationError(
                "A rejection comment is required".to_string(),
            ));
        }

        let request = UserRequest::find_by_id(pool, request_id)
            .await?
            .ok_or(AuthServiceError::RequestNotFound)?;
        if request.status != RequestStatus::Pending {
            return Err(AuthServiceError::RequestAlreadyReviewed);
        }

        Ok(UserRequest::mark_reviewed(
            pool,
            request_id,
            RequestStatus::Rejected,
            Some(comment),
        )
        .await?)
    }

    pub async fn change_role(
        &self,
        pool: &DbPool,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<UserWithRoles, AuthServiceError> {
        if User::find_by_id(pool, user_id).await?.is_none() {
            return Err(AuthServiceError::UserNotFound);
        }
        if Role::find_by_id(pool, role_id).await?.is_none() {
            return Err(AuthServiceError::RoleNotFound);
        }

        user_role::replace_for_user(pool, user_id, role_id).await?;
        User::with_roles(pool, user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use db::models::role::Role;
    use db::types::RoleName;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> DbPool {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        Role::ensure_defaults(&db).await.unwrap();
        db
    }

    fn register_payload(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "hunter2!".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn approval_creates_user_role_and_profile() {
        let db = setup_db().await;
        let auth = AuthService::new();

        let request = auth
            .register(&db, register_payload("ada@example.com"))
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let role = Role::find_by_name(&db, RoleName::Employee)
            .await
            .unwrap()
            .unwrap();
        let approved = auth.approve_request(&db, request.id, role.id).await.unwrap();
        assert_eq!(approved.roles, vec![RoleName::Employee]);
        assert_eq!(approved.user.email, "ada@example.com");

        let users = User::find_all(&db).await.unwrap();
        assert_eq!(users.len(), 1);

        let profile = UserProfile::find_by_user_id(&db, approved.user.id)
            .await
            .unwrap()
            .expect("profile created");
        assert!(profile.phone.is_none());
        assert!(profile.address.is_none());
        assert!(profile.bio.is_none());

        let reviewed = UserRequest::find_by_id(&db, request.id).await.unwrap().unwrap();
        assert_eq!(reviewed.status, RequestStatus::Approved);
        assert!(reviewed.reviewed_at.is_some());

        // A second approval of the same request is rejected.
        assert!(matches!(
            auth.approve_request(&db, request.id, role.id).await,
            Err(AuthServiceError::RequestAlreadyReviewed)
        ));
    }

    #[tokio::test]
    async fn login_returns_token_with_roles() {
        let db = setup_db().await;
        let auth = AuthService::new();

        let request = auth
            .register(&db, register_payload("qa@example.com"))
            .await
            .unwrap();
        let role = Role::find_by_name(&db, RoleName::Qa).await.unwrap().unwrap();
        auth.approve_request(&db, request.id, role.id).await.unwrap();

        let response = auth
            .login(
                &db,
                "secret",
                24,
                LoginRequest {
                    email: "qa@example.com".to_string(),
                    password: "hunter2!".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(response.user.roles, vec![RoleName::Qa]);

        let claims = utils_jwt::verify_token(&response.token, "secret").unwrap();
        assert_eq!(claims.sub, response.user.user.id);
        assert!(claims.has_role("qa"));
    }

    #[tokio::test]
    async fn login_with_bad_credentials_is_rejected() {
        let db = setup_db().await;
        let auth = AuthService::new();

        let request = auth
            .register(&db, register_payload("dev@example.com"))
            .await
            .unwrap();
        let role = Role::find_by_name(&db, RoleName::Employee)
            .await
            .unwrap()
            .unwrap();
        auth.approve_request(&db, request.id, role.id).await.unwrap();

        let wrong_password = auth
            .login(
                &db,
                "secret",
                24,
                LoginRequest {
                    email: "dev@example.com".to_string(),
                    password: "nope".to_string(),
                },
            )
            .await;
        assert!(matches!(
            wrong_password,
            Err(AuthServiceError::InvalidCredentials)
        ));

        let unknown_email = auth
            .login(
                &db,
                "secret",
                24,
                LoginRequest {
                    email: "ghost@example.com".to_string(),
                    password: "hunter2!".to_string(),
                },
            )
            .await;
        assert!(matches!(
            unknown_email,
            Err(AuthServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let db = setup_db().await;
        let auth = AuthService::new();

        auth.register(&db, register_payload("dup@example.com"))
            .await
            .unwrap();
        assert!(matches!(
            auth.register(&db, register_payload("dup@example.com")).await,
            Err(AuthServiceError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn rejection_requires_a_comment() {
        let db = setup_db().await;
        let auth = AuthService::new();

        let request = auth
            .register(&db, register_payload("no@example.com"))
            .await
            .unwrap();

        assert!(matches!(
            auth.reject_request(&db, request.id, "  ".to_string()).await,
            Err(AuthServiceError::ValidationError(_))
        ));

        let rejected = auth
            .reject_request(&db, request.id, "Incomplete application".to_string())
            .await
            .unwrap();
        assert_eq!(rejected.status, RequestStatus::Rejected);
        assert_eq!(
            rejected.review_comment.as_deref(),
            Some("Incomplete application")
        );
        assert!(rejected.reviewed_at.is_some());
    }
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{project_team::ProjectTeamError, team::TeamError},
};
use services::services::{
    auth::AuthServiceError, performance::PerformanceError, resume::ResumeServiceError,
    submission::SubmissionError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthServiceError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Performance(#[from] PerformanceError),
    #[error(transparent)]
    Resume(#[from] ResumeServiceError),
    #[error(transparent)]
    ProjectTeam(#[from] ProjectTeamError),
    #[error(transparent)]
    Team(#[from] TeamError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Auth(err) => match err {
                AuthServiceError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "AuthError"),
                AuthServiceError::EmailTaken | AuthServiceError::RequestAlreadyReviewed => {
                    (StatusCode::CONFLICT, "AuthError")
                }
                AuthServiceError::RequestNotFound
                | AuthServiceError::RoleNotFound
                | AuthServiceError::UserNotFound => (StatusCode::NOT_FOUND, "AuthError"),
                AuthServiceError::ValidationError(_) => (StatusCode::BAD_REQUEST, "AuthError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "AuthError"),
            },
            ApiError::Submission(err) => match err {
                SubmissionError::TaskNotFound | SubmissionError::SubmissionNotFound => {
                    (StatusCode::NOT_FOUND, "SubmissionError")
                }
                SubmissionError::NotAssignee => (StatusCode::FORBIDDEN, "SubmissionError"),
                SubmissionError::InvalidPayload(_) | SubmissionError::CommentRequired => {
                    (StatusCode::BAD_REQUEST, "SubmissionError")
                }
                SubmissionError::TooLarge { .. } => {
                    (StatusCode::PAYLOAD_TOO_LARGE, "SubmissionError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "SubmissionError"),
            },
            ApiError::Performance(err) => match err {
                PerformanceError::ProjectNotFound => (StatusCode::NOT_FOUND, "PerformanceError"),
                PerformanceError::NoTeamAssigned => (StatusCode::BAD_REQUEST, "PerformanceError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "PerformanceError"),
            },
            ApiError::Resume(err) => match err {
                ResumeServiceError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "ResumeError"),
                _ => (StatusCode::BAD_GATEWAY, "ResumeError"),
            },
            ApiError::ProjectTeam(err) => match err {
                ProjectTeamError::ProjectNotFound | ProjectTeamError::TeamNotFound => {
                    (StatusCode::NOT_FOUND, "ProjectTeamError")
                }
                ProjectTeamError::AlreadyAssigned => (StatusCode::CONFLICT, "ProjectTeamError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ProjectTeamError"),
            },
            ApiError::Team(err) => match err {
                TeamError::NotFound => (StatusCode::NOT_FOUND, "TeamError"),
                TeamError::AlreadyMember => (StatusCode::CONFLICT, "TeamError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "TeamError"),
            },
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "ForbiddenError"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ConflictError"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };

        // Unexpected failures get a generic body; the detail only goes to
        // the log.
        let error_message = if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
            "Internal server error".to_string()
        } else {
            match &self {
                ApiError::Unauthorized => "Unauthorized. Please sign in again.".to_string(),
                ApiError::Forbidden(msg)
                | ApiError::NotFound(msg)
                | ApiError::BadRequest(msg)
                | ApiError::Conflict(msg) => msg.clone(),
                other => other.to_string(),
            }
        };

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

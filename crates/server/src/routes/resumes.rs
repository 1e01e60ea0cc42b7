use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::resume::{Resume, SaveResume};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, http::auth::AuthUser};

#[derive(Debug, Deserialize, TS)]
pub struct ParseResumeRequest {
    pub filename: String,
    pub file_base64: String,
}

#[derive(Debug, Serialize, TS)]
pub struct ParseResumeResponse {
    pub parsed: serde_json::Value,
}

/// Proxies to the external parser; the parser itself stays opaque.
pub async fn parse_resume(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<ParseResumeRequest>,
) -> Result<ResponseJson<ApiResponse<ParseResumeResponse>>, ApiError> {
    if payload.filename.trim().is_empty() || payload.file_base64.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "filename and file_base64 are required".to_string(),
        ));
    }

    let (parser_url, timeout_secs) = {
        let config = deployment.config().read().await;
        (
            config.resume_parser_url.clone(),
            config.resume_parser_timeout_secs,
        )
    };

    let parsed = deployment
        .resumes()
        .parse(
            &parser_url,
            timeout_secs,
            &payload.filename,
            &payload.file_base64,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(ParseResumeResponse {
        parsed,
    })))
}

pub async fn save_resume(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<SaveResume>,
) -> Result<ResponseJson<ApiResponse<Resume>>, ApiError> {
    if payload.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("file_name is required".to_string()));
    }

    let resume =
        Resume::upsert_for_user(&deployment.db().pool, auth.id(), &payload).await?;
    Ok(ResponseJson(ApiResponse::success(resume)))
}

pub async fn get_my_resume(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Resume>>, ApiError> {
    let resume = Resume::find_by_user_id(&deployment.db().pool, auth.id())
        .await?
        .ok_or(ApiError::NotFound("Resume not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(resume)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/resumes/parse", post(parse_resume))
        .route("/resumes", post(save_resume))
        .route("/resumes/me", get(get_my_resume))
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

    #[tokio::test]
    async fn saved_resume_is_returned_and_replaced_on_resave() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_employee, token) =
            seed_user_with_role(&deployment, "employee@example.com", RoleName::Employee).await;

        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/resumes/me", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/resumes",
                Some(&token),
                Some(json!({
                    "file_name": "cv.pdf",
                    "parsed": {"name": "Test User", "skills": ["rust"]},
                })),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response_data(&body)["file_name"], "cv.pdf");

        // Saving again replaces rather than duplicating.
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/resumes",
                Some(&token),
                Some(json!({"file_name": "cv-v2.pdf", "parsed": null})),
            ))
            .await
            .unwrap();
        let (status, _body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request("GET", "/api/resumes/me", Some(&token), None))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let resume = response_data(&body);
        assert_eq!(resume["file_name"], "cv-v2.pdf");
        assert!(resume["parsed"].is_null());
    }
}

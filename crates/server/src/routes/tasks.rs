use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::{
    models::{
        task::{CreateTask, Task, TaskStatus, UpdateTask},
        task_submission::TaskSubmission,
    },
    types::RoleName,
};
use serde::Deserialize;
use services::services::submission::{ReviewDecision, SubmissionWithFile, SubmitTaskRequest};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::auth::AuthUser, middleware::load_task_middleware,
};

#[derive(Debug, Deserialize, TS)]
pub struct ReviewRequest {
    pub comment: Option<String>,
}

pub async fn get_assigned_to_me(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_assignee(&deployment.db().pool, auth.id()).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_pending_review(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    auth.require_role(RoleName::Qa)?;

    let tasks = Task::find_by_status(&deployment.db().pool, TaskStatus::Submitted).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn create_task(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Task title is required".to_string()));
    }

    tracing::debug!(
        "Creating task '{}' in project {}",
        payload.title,
        payload.project_id
    );

    let task = Task::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(auth): Extension<AuthUser>,
    Extension(existing_task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    // Use existing values if not provided in update
    let title = payload.title.unwrap_or(existing_task.title);
    let description = match payload.description {
        Some(s) if s.trim().is_empty() => None, // Empty string = clear description
        Some(s) => Some(s),                     // Non-empty string = update description
        None => existing_task.description,      // Field omitted = keep existing
    };
    let status = payload.status.unwrap_or(existing_task.status);
    let assigned_employee_id = payload
        .assigned_employee_id
        .unwrap_or(existing_task.assigned_employee_id);

    let task = Task::update(
        &deployment.db().pool,
        existing_task.id,
        title,
        description,
        status,
        assigned_employee_id,
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    Extension(auth): Extension<AuthUser>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<()>>), ApiError> {
    auth.require_role(RoleName::Manager)?;

    Task::delete(&deployment.db().pool, task.id).await?;
    Ok((StatusCode::ACCEPTED, ResponseJson(ApiResponse::success(()))))
}

pub async fn submit_task(
    Extension(auth): Extension<AuthUser>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<SubmitTaskRequest>,
) -> Result<ResponseJson<ApiResponse<TaskSubmission>>, ApiError> {
    let max_upload_size_bytes = {
        let config = deployment.config().read().await;
        config.max_upload_size_bytes
    };

    let submission = deployment
        .submissions()
        .submit(
            &deployment.db().pool,
            task.id,
            auth.id(),
            payload,
            max_upload_size_bytes,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(submission)))
}

pub async fn get_submission(
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<SubmissionWithFile>>, ApiError> {
    let submission = deployment
        .submissions()
        .fetch(&deployment.db().pool, task.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(submission)))
}

pub async fn approve_task(
    Extension(auth): Extension<AuthUser>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<ReviewRequest>,
) -> Result<ResponseJson<ApiResponse<TaskSubmission>>, ApiError> {
    auth.require_role(RoleName::Qa)?;

    let submission = deployment
        .submissions()
        .review(
            &deployment.db().pool,
            task.id,
            ReviewDecision::Approve,
            payload.comment,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(submission)))
}

pub async fn reject_task(
    Extension(auth): Extension<AuthUser>,
    Extension(task): Extension<Task>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<ReviewRequest>,
) -> Result<ResponseJson<ApiResponse<TaskSubmission>>, ApiError> {
    auth.require_role(RoleName::Qa)?;

    let submission = deployment
        .submissions()
        .review(
            &deployment.db().pool,
            task.id,
            ReviewDecision::Reject,
            payload.comment,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(submission)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let task_id_router = Router::new()
        .route("/", get(get_task))
        .route("/", put(update_task))
        .route("/", delete(delete_task))
        .route("/submit", post(submit_task))
        .route("/submission", get(get_submission))
        .route("/approve", post(approve_task))
        .route("/reject", post(reject_task))
        .layer(from_fn_with_state(deployment.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", post(create_task))
        .route("/assigned-to-me", get(get_assigned_to_me))
        .route("/pending-review", get(get_pending_review))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode};
    use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
    use db::types::RoleName;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support::{
        json_request, response_data, response_json, seed_user_with_role, setup_deployment,
    };

    struct Scenario {
        app: Router,
        manager_token: String,
        employee_token: String,
        qa_token: String,
        employee_id: String,
        project_id: String,
    }

    async fn setup_scenario() -> (test_support::TestEnvGuard, Scenario) {
        let (env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());

        let (_manager, manager_token) =
            seed_user_with_role(&deployment, "manager@example.com", RoleName::Manager).await;
        let (employee, employee_token) =
            seed_user_with_role(&deployment, "employee@example.com", RoleName::Employee).await;
        let (_qa, qa_token) =
            seed_user_with_role(&deployment, "qa@example.com", RoleName::Qa).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/projects",
                Some(&manager_token),
                Some(json!({"name": "Apollo", "description": "launch"})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let project_id = response_data(&body)["id"].as_str().unwrap().to_string();

        (
            env_guard,
            Scenario {
                app,
                manager_token,
                employee_token,
                qa_token,
                employee_id: employee.id.to_string(),
                project_id,
            },
        )
    }

    async fn create_task(scenario: &Scenario, title: &str) -> String {
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/tasks",
                Some(&scenario.manager_token),
                Some(json!({
                    "project_id": scenario.project_id,
                    "assigned_employee_id": scenario.employee_id,
                    "title": title,
                    "description": "do the thing",
                })),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let task = response_data(&body);
        assert_eq!(task["status"], "pending");
        task["id"].as_str().unwrap().to_string()
    }

    async fn fetch_task(scenario: &Scenario, task_id: &str) -> serde_json::Value {
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "GET",
                &format!("/api/tasks/{task_id}"),
                Some(&scenario.manager_token),
                None,
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        response_data(&body)
    }

    async fn submit_task(
        scenario: &Scenario,
        task_id: &str,
        content: &[u8],
        comment: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/tasks/{task_id}/submit"),
                Some(&scenario.employee_token),
                Some(json!({
                    "file_name": "deliverable.pdf",
                    "file_base64": BASE64.encode(content),
                    "comment": comment,
                })),
            ))
            .await
            .unwrap();
        response_json(response).await
    }

    #[tokio::test]
    async fn submit_and_approve_flow_finishes_the_task() {
        let (_env_guard, scenario) = setup_scenario().await;
        let task_id = create_task(&scenario, "Ship the report").await;

        let content = b"final report bytes";
        let (status, body) = submit_task(&scenario, &task_id, content, "please review").await;
        assert_eq!(status, StatusCode::OK);
        let submission = response_data(&body);
        assert_eq!(submission["status"], "submitted");
        assert_eq!(submission["comment"], "please review");
        assert!(submission["file_path"].as_str().is_some());

        assert_eq!(fetch_task(&scenario, &task_id).await["status"], "submitted");

        // The uploaded bytes round-trip through the fetch endpoint.
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "GET",
                &format!("/api/tasks/{task_id}/submission"),
                Some(&scenario.qa_token),
                None,
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let fetched = response_data(&body);
        let decoded = BASE64
            .decode(fetched["file_base64"].as_str().unwrap())
            .unwrap();
        assert_eq!(decoded, content);

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/tasks/{task_id}/approve"),
                Some(&scenario.qa_token),
                Some(json!({"comment": "looks good"})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let approved = response_data(&body);
        assert_eq!(approved["status"], "approved");
        assert_eq!(approved["qa_comment"], "looks good");
        assert!(!approved["reviewed_at"].is_null());

        assert_eq!(fetch_task(&scenario, &task_id).await["status"], "done");
    }

    #[tokio::test]
    async fn reject_returns_the_task_to_in_progress() {
        let (_env_guard, scenario) = setup_scenario().await;
        let task_id = create_task(&scenario, "Needs rework").await;
        submit_task(&scenario, &task_id, b"v1", "first try").await;

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/tasks/{task_id}/reject"),
                Some(&scenario.qa_token),
                Some(json!({"comment": "missing tests"})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let rejected = response_data(&body);
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["qa_comment"], "missing tests");
        assert!(!rejected["reviewed_at"].is_null());

        assert_eq!(fetch_task(&scenario, &task_id).await["status"], "inprogress");
    }

    #[tokio::test]
    async fn approving_without_a_submission_is_not_found() {
        let (_env_guard, scenario) = setup_scenario().await;
        let task_id = create_task(&scenario, "Untouched").await;

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/tasks/{task_id}/approve"),
                Some(&scenario.qa_token),
                Some(json!({"comment": null})),
            ))
            .await
            .unwrap();
        let (status, _body) = response_json(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn role_checks_guard_the_workflow() {
        let (_env_guard, scenario) = setup_scenario().await;
        let task_id = create_task(&scenario, "Guarded").await;

        // An employee cannot create tasks.
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/tasks",
                Some(&scenario.employee_token),
                Some(json!({
                    "project_id": scenario.project_id,
                    "assigned_employee_id": scenario.employee_id,
                    "title": "nope",
                    "description": null,
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // The QA reviewer is not the assignee, so they cannot submit.
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/tasks/{task_id}/submit"),
                Some(&scenario.qa_token),
                Some(json!({"file_name": null, "file_base64": null, "comment": "hi"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        submit_task(&scenario, &task_id, b"v1", "ready").await;

        // The employee cannot approve their own work.
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/tasks/{task_id}/approve"),
                Some(&scenario.employee_token),
                Some(json!({"comment": null})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn pending_review_lists_submitted_tasks_for_qa() {
        let (_env_guard, scenario) = setup_scenario().await;
        let submitted_id = create_task(&scenario, "In review").await;
        create_task(&scenario, "Still pending").await;
        submit_task(&scenario, &submitted_id, b"v1", "ready").await;

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/tasks/pending-review",
                Some(&scenario.qa_token),
                None,
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let tasks = response_data(&body);
        let tasks = tasks.as_array().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0]["id"], submitted_id.as_str());
    }

    #[tokio::test]
    async fn update_merges_omitted_fields() {
        let (_env_guard, scenario) = setup_scenario().await;
        let task_id = create_task(&scenario, "Original title").await;

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/tasks/{task_id}"),
                Some(&scenario.manager_token),
                Some(json!({"status": "inprogress"})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        let updated = response_data(&body);
        assert_eq!(updated["title"], "Original title");
        assert_eq!(updated["description"], "do the thing");
        assert_eq!(updated["status"], "inprogress");

        // An empty description string clears the field.
        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/tasks/{task_id}"),
                Some(&scenario.manager_token),
                Some(json!({"description": ""})),
            ))
            .await
            .unwrap();
        let (_status, body) = response_json(response).await;
        assert!(response_data(&body)["description"].is_null());
    }

    #[tokio::test]
    async fn assigned_to_me_only_lists_own_tasks() {
        let (_env_guard, scenario) = setup_scenario().await;
        create_task(&scenario, "Mine").await;

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/tasks/assigned-to-me",
                Some(&scenario.employee_token),
                None,
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response_data(&body).as_array().unwrap().len(), 1);

        let response = scenario
            .app
            .clone()
            .oneshot(json_request(
                "GET",
                "/api/tasks/assigned-to-me",
                Some(&scenario.qa_token),
                None,
            ))
            .await
            .unwrap();
        let (_status, body) = response_json(response).await;
        assert!(response_data(&body).as_array().unwrap().is_empty());
    }
}

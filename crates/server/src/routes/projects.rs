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
        employee_performance::{EmployeePerformance, EmployeePerformanceSummary},
        project::{CreateProject, Project, UpdateProject},
        project_team::ProjectTeam,
        task::Task,
    },
    types::RoleName,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, http::auth::AuthUser, middleware::load_project_middleware,
};

#[derive(Debug, Deserialize, TS)]
pub struct AssignTeamRequest {
    pub team_id: Uuid,
}

pub async fn get_projects(
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Project>>>, ApiError> {
    let projects = Project::find_all(&deployment.db().pool).await?;
    Ok(ResponseJson(ApiResponse::success(projects)))
}

pub async fn get_project(
    Extension(project): Extension<Project>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn create_project(
    Extension(auth): Extension<AuthUser>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }

    tracing::debug!("Creating project '{}'", payload.name);
    let project = Project::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn update_project(
    Extension(auth): Extension<AuthUser>,
    Extension(existing_project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    // Use existing values if not provided in update
    let name = payload.name.unwrap_or(existing_project.name);
    let description = match payload.description {
        Some(s) if s.trim().is_empty() => None,
        Some(s) => Some(s),
        None => existing_project.description,
    };

    let project =
        Project::update(&deployment.db().pool, existing_project.id, name, description).await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    Extension(auth): Extension<AuthUser>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<()>>), ApiError> {
    auth.require_role(RoleName::Manager)?;

    Project::delete(&deployment.db().pool, project.id).await?;
    Ok((StatusCode::ACCEPTED, ResponseJson(ApiResponse::success(()))))
}

pub async fn get_project_tasks(
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let tasks = Task::find_by_project_id(&deployment.db().pool, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn assign_team(
    Extension(auth): Extension<AuthUser>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<AssignTeamRequest>,
) -> Result<ResponseJson<ApiResponse<ProjectTeam>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    let assignment =
        ProjectTeam::assign(&deployment.db().pool, project.id, payload.team_id).await?;
    Ok(ResponseJson(ApiResponse::success(assignment)))
}

pub async fn get_performance(
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<EmployeePerformanceSummary>>>, ApiError> {
    let rows = EmployeePerformance::find_by_project_id(&deployment.db().pool, project.id).await?;
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub async fn recalculate_performance(
    Extension(auth): Extension<AuthUser>,
    Extension(project): Extension<Project>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<EmployeePerformanceSummary>>>, ApiError> {
    auth.require_role(RoleName::Manager)?;

    let rows = deployment
        .performance()
        .recalculate(&deployment.db().pool, project.id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(rows)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let project_id_router = Router::new()
        .route("/", get(get_project))
        .route("/", put(update_project))
        .route("/", delete(delete_project))
        .route("/tasks", get(get_project_tasks))
        .route("/assign-team", post(assign_team))
        .route("/performance", get(get_performance))
        .route("/recalculate-performance", post(recalculate_performance))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_project_middleware,
        ));

    let inner = Router::new()
        .route("/", get(get_projects).post(create_project))
        .nest("/{project_id}", project_id_router);

    Router::new().nest("/projects", inner)
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

    async fn create_named(
        app: &axum::Router,
        token: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(json_request("POST", uri, Some(token), Some(body)))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        response_data(&body)
    }

    #[tokio::test]
    async fn second_team_assignment_conflicts() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_manager, token) =
            seed_user_with_role(&deployment, "manager@example.com", RoleName::Manager).await;

        let project = create_named(&app, &token, "/api/projects", json!({"name": "Apollo"})).await;
        let first = create_named(&app, &token, "/api/teams", json!({"name": "Alpha"})).await;
        let second = create_named(&app, &token, "/api/teams", json!({"name": "Beta"})).await;
        let project_id = project["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/projects/{project_id}/assign-team"),
                Some(&token),
                Some(json!({"team_id": first["id"]})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/projects/{project_id}/assign-team"),
                Some(&token),
                Some(json!({"team_id": second["id"]})),
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.get("success").and_then(|v| v.as_bool()), Some(false));
    }

    #[tokio::test]
    async fn recalculate_performance_requires_a_team() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_manager, token) =
            seed_user_with_role(&deployment, "manager@example.com", RoleName::Manager).await;

        let project = create_named(&app, &token, "/api/projects", json!({"name": "Orphan"})).await;
        let project_id = project["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/projects/{project_id}/recalculate-performance"),
                Some(&token),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn performance_rollup_counts_done_tasks() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_manager, manager_token) =
            seed_user_with_role(&deployment, "manager@example.com", RoleName::Manager).await;
        let (employee, _employee_token) =
            seed_user_with_role(&deployment, "employee@example.com", RoleName::Employee).await;

        let project =
            create_named(&app, &manager_token, "/api/projects", json!({"name": "Apollo"})).await;
        let team = create_named(&app, &manager_token, "/api/teams", json!({"name": "Crew"})).await;
        let project_id = project["id"].as_str().unwrap();
        let team_id = team["id"].as_str().unwrap();

        create_named(
            &app,
            &manager_token,
            &format!("/api/teams/{team_id}/members"),
            json!({"user_id": employee.id}),
        )
        .await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/projects/{project_id}/assign-team"),
                Some(&manager_token),
                Some(json!({"team_id": team_id})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Two tasks, one finished by hand.
        let task = create_named(
            &app,
            &manager_token,
            "/api/tasks",
            json!({
                "project_id": project_id,
                "assigned_employee_id": employee.id,
                "title": "one",
            }),
        )
        .await;
        create_named(
            &app,
            &manager_token,
            "/api/tasks",
            json!({
                "project_id": project_id,
                "assigned_employee_id": employee.id,
                "title": "two",
            }),
        )
        .await;
        let task_id = task["id"].as_str().unwrap();
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/tasks/{task_id}"),
                Some(&manager_token),
                Some(json!({"status": "done"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let rows = create_named(
            &app,
            &manager_token,
            &format!("/api/projects/{project_id}/recalculate-performance"),
            serde_json::Value::Null,
        )
        .await;
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["tasks_assigned"], 2);
        assert_eq!(rows[0]["tasks_completed"], 1);
        assert_eq!(rows[0]["approval_rate"], 50.0);
        assert_eq!(rows[0]["employee"]["email"], "employee@example.com");

        // The stored rollup is served by the read endpoint too.
        let response = app
            .clone()
            .oneshot(json_request(
                "GET",
                &format!("/api/projects/{project_id}/performance"),
                Some(&manager_token),
                None,
            ))
            .await
            .unwrap();
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response_data(&body).as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mutations_require_the_manager_role() {
        let (_env_guard, deployment) = setup_deployment().await;
        let app = crate::http::router(deployment.clone());
        let (_employee, token) =
            seed_user_with_role(&deployment, "employee@example.com", RoleName::Employee).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/projects",
                Some(&token),
                Some(json!({"name": "Denied"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

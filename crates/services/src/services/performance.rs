use db::{
    DbErr, DbPool, TransactionTrait,
    models::{
        employee_performance::{EmployeePerformance, EmployeePerformanceSummary},
        ids,
        project::Project,
        project_team::ProjectTeam,
        task::{Task, TaskStatus},
        team::Team,
    },
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Project not found")]
    ProjectNotFound,
    #[error("No team is assigned to this project")]
    NoTeamAssigned,
}

#[derive(Clone, Default)]
pub struct PerformanceService;

impl PerformanceService {
    pub fn new() -> Self {
        Self
    }

    /// Recomputes the full rollup for a project from its task rows: one
    /// row per current team member, stale rows removed. Idempotent.
    pub async fn recalculate(
        &self,
        pool: &DbPool,
        project_id: Uuid,
    ) -> Result<Vec<EmployeePerformanceSummary>, PerformanceError> {
        if Project::find_by_id(pool, project_id).await?.is_none() {
            return Err(PerformanceError::ProjectNotFound);
        }

        let assignment = ProjectTeam::find_by_project_id(pool, project_id)
            .await?
            .ok_or(PerformanceError::NoTeamAssigned)?;
        let members = Team::members(pool, assignment.team_id).await?;

        let project_row_id = ids::project_id_by_uuid(pool, project_id)
            .await?
            .ok_or(PerformanceError::ProjectNotFound)?;

        let tx = pool.begin().await?;
        let mut member_ids = Vec::with_capacity(members.len());
        for member in &members {
            let employee_row_id = ids::user_id_by_uuid(&tx, member.id)
                .await?
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

            let tasks_assigned =
                Task::count_for_assignee_in_project(&tx, employee_row_id, project_row_id, None)
                    .await?;
            let tasks_completed = Task::count_for_assignee_in_project(
                &tx,
                employee_row_id,
                project_row_id,
                Some(TaskStatus::Done),
            )
            .await?;

            let approval_rate = if tasks_assigned == 0 {
                0.0
            } else {
                (tasks_completed as f64 / tasks_assigned as f64) * 100.0
            };

            EmployeePerformance::upsert(
                &tx,
                member.id,
                project_id,
                tasks_assigned as i32,
                tasks_completed as i32,
                approval_rate,
            )
            .await?;
            member_ids.push(member.id);
        }

        EmployeePerformance::delete_for_project_except(&tx, project_id, &member_ids).await?;
        tx.commit().await?;

        tracing::info!(
            project_id = %project_id,
            members = members.len(),
            "Recalculated employee performance"
        );

        Ok(EmployeePerformance::find_by_project_id(pool, project_id).await?)
    }
}

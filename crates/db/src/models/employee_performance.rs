use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{employee_performance, user},
    models::{ids, user::User},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct EmployeePerformance {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub project_id: Uuid,
    pub tasks_assigned: i32,
    pub tasks_completed: i32,
    pub approval_rate: f64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct EmployeePerformanceSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub performance: EmployeePerformance,
    pub employee: User,
}

impl EmployeePerformance {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: employee_performance::Model,
    ) -> Result<Self, DbErr> {
        let employee_uuid = ids::user_uuid_by_id(db, model.employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            employee_id: employee_uuid,
            project_id: project_uuid,
            tasks_assigned: model.tasks_assigned,
            tasks_completed: model.tasks_completed,
            approval_rate: model.approval_rate,
            generated_at: model.generated_at.into(),
        })
    }

    /// One row per (employee, project); recomputation overwrites in place.
    pub async fn upsert<C: ConnectionTrait>(
        db: &C,
        employee_id: Uuid,
        project_id: Uuid,
        tasks_assigned: i32,
        tasks_completed: i32,
        approval_rate: f64,
    ) -> Result<Self, DbErr> {
        let employee_row_id = ids::user_id_by_uuid(db, employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let existing = employee_performance::Entity::find()
            .filter(employee_performance::Column::EmployeeId.eq(employee_row_id))
            .filter(employee_performance::Column::ProjectId.eq(project_row_id))
            .one(db)
            .await?;

        let updated = match existing {
            Some(record) => {
                let mut active: employee_performance::ActiveModel = record.into();
                active.tasks_assigned = Set(tasks_assigned);
                active.tasks_completed = Set(tasks_completed);
                active.approval_rate = Set(approval_rate);
                active.generated_at = Set(Utc::now().into());
                active.update(db).await?
            }
            None => {
                let active = employee_performance::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    employee_id: Set(employee_row_id),
                    project_id: Set(project_row_id),
                    tasks_assigned: Set(tasks_assigned),
                    tasks_completed: Set(tasks_completed),
                    approval_rate: Set(approval_rate),
                    generated_at: Set(Utc::now().into()),
                    ..Default::default()
                };
                active.insert(db).await?
            }
        };

        Self::from_model(db, updated).await
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<EmployeePerformanceSummary>, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let models = employee_performance::Entity::find()
            .filter(employee_performance::Column::ProjectId.eq(project_row_id))
            .order_by_asc(employee_performance::Column::EmployeeId)
            .all(db)
            .await?;

        let mut summaries = Vec::with_capacity(models.len());
        for model in models {
            let employee = user::Entity::find_by_id(model.employee_id)
                .one(db)
                .await?
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
            summaries.push(EmployeePerformanceSummary {
                performance: Self::from_model(db, model).await?,
                employee: User::from_model(employee),
            });
        }
        Ok(summaries)
    }

    /// Removes rollup rows for employees no longer on the project team so
    /// a recompute always mirrors the current membership.
    pub async fn delete_for_project_except<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        keep_employee_ids: &[Uuid],
    ) -> Result<u64, DbErr> {
        let project_row_id = match ids::project_id_by_uuid(db, project_id).await? {
            Some(id) => id,
            None => return Ok(0),
        };

        let mut keep_row_ids = Vec::with_capacity(keep_employee_ids.len());
        for employee_id in keep_employee_ids {
            if let Some(row_id) = ids::user_id_by_uuid(db, *employee_id).await? {
                keep_row_ids.push(row_id);
            }
        }

        let mut delete = employee_performance::Entity::delete_many()
            .filter(employee_performance::Column::ProjectId.eq(project_row_id));
        if !keep_row_ids.is_empty() {
            delete = delete.filter(employee_performance::Column::EmployeeId.is_not_in(keep_row_ids));
        }

        let result = delete.exec(db).await?;
        Ok(result.rows_affected)
    }
}

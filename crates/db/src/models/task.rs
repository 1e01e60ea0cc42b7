use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{milestone, task},
    models::ids,
};
pub use crate::types::TaskStatus;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub assigned_employee_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub project_id: Uuid,
    pub milestone_id: Option<Uuid>,
    pub assigned_employee_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_employee_id: Option<Uuid>,
}

impl Task {
    async fn from_model<C: ConnectionTrait>(db: &C, model: task::Model) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let milestone_id = match model.milestone_id {
            Some(id) => ids::milestone_uuid_by_id(db, id)
                .await?
                .ok_or(DbErr::RecordNotFound("Milestone not found".to_string()))
                .map(Some)?,
            None => None,
        };
        let assigned_employee_id = ids::user_uuid_by_id(db, model.assigned_employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            project_id: project_uuid,
            milestone_id,
            assigned_employee_id,
            title: model.title,
            description: model.description,
            status: model.status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;

        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let models = task::Entity::find()
            .filter(task::Column::ProjectId.eq(project_row_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn find_by_assignee<C: ConnectionTrait>(
        db: &C,
        employee_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let user_row_id = match ids::user_id_by_uuid(db, employee_id).await? {
            Some(id) => id,
            None => return Ok(Vec::new()),
        };

        let models = task::Entity::find()
            .filter(task::Column::AssignedEmployeeId.eq(user_row_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(db)
            .await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn find_by_status<C: ConnectionTrait>(
        db: &C,
        status: TaskStatus,
    ) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .filter(task::Column::Status.eq(status))
            .order_by_desc(task::Column::UpdatedAt)
            .all(db)
            .await?;

        let mut tasks = Vec::with_capacity(models.len());
        for model in models {
            tasks.push(Self::from_model(db, model).await?);
        }
        Ok(tasks)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTask,
        task_id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, data.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let assigned_employee_row_id = ids::user_id_by_uuid(db, data.assigned_employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let milestone_row_id = match data.milestone_id {
            Some(id) => {
                let row_id = ids::milestone_id_by_uuid(db, id)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Milestone not found".to_string()))?;
                if let Some(record) = milestone::Entity::find_by_id(row_id).one(db).await?
                    && record.project_id != project_row_id
                {
                    return Err(DbErr::Custom(
                        "Milestone belongs to a different project".to_string(),
                    ));
                }
                Some(row_id)
            }
            None => None,
        };

        let now = Utc::now();
        let active = task::ActiveModel {
            uuid: Set(task_id),
            project_id: Set(project_row_id),
            milestone_id: Set(milestone_row_id),
            assigned_employee_id: Set(assigned_employee_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(TaskStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        assigned_employee_id: Uuid,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let assigned_employee_row_id = ids::user_id_by_uuid(db, assigned_employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        active.title = Set(title);
        active.description = Set(description);
        active.status = Set(status);
        active.assigned_employee_id = Set(assigned_employee_row_id);
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }

    pub async fn update_status<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<(), DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        active.status = Set(status);
        active.updated_at = Set(Utc::now().into());
        active.update(db).await?;
        Ok(())
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = task::Entity::delete_many()
            .filter(task::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_for_assignee_in_project<C: ConnectionTrait>(
        db: &C,
        employee_row_id: i64,
        project_row_id: i64,
        status: Option<TaskStatus>,
    ) -> Result<u64, DbErr> {
        let mut query = task::Entity::find()
            .filter(task::Column::AssignedEmployeeId.eq(employee_row_id))
            .filter(task::Column::ProjectId.eq(project_row_id));
        if let Some(status) = status {
            query = query.filter(task::Column::Status.eq(status));
        }
        query.count(db).await
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use crate::models::{
        project::{CreateProject, Project},
        user::{CreateUser, User},
    };

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_project_and_employee(db: &sea_orm::DatabaseConnection) -> (Project, User) {
        let project = Project::create(
            db,
            &CreateProject {
                name: "Apollo".to_string(),
                description: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let employee = User::create(
            db,
            &CreateUser {
                email: "emp@example.com".to_string(),
                password_hash: "hash".to_string(),
                first_name: "Em".to_string(),
                last_name: "Ployee".to_string(),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        (project, employee)
    }

    #[tokio::test]
    async fn created_tasks_start_pending() {
        let db = setup_db().await;
        let (project, employee) = seed_project_and_employee(&db).await;

        let task = Task::create(
            &db,
            &CreateTask {
                project_id: project.id,
                milestone_id: None,
                assigned_employee_id: employee.id,
                title: "Write docs".to_string(),
                description: Some("for the API".to_string()),
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.assigned_employee_id, employee.id);

        let listed = Task::find_by_assignee(&db, employee.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn status_updates_are_visible_in_status_queries() {
        let db = setup_db().await;
        let (project, employee) = seed_project_and_employee(&db).await;

        let task = Task::create(
            &db,
            &CreateTask {
                project_id: project.id,
                milestone_id: None,
                assigned_employee_id: employee.id,
                title: "Ship it".to_string(),
                description: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        Task::update_status(&db, task.id, TaskStatus::Submitted)
            .await
            .unwrap();

        let in_review = Task::find_by_status(&db, TaskStatus::Submitted).await.unwrap();
        assert_eq!(in_review.len(), 1);
        assert_eq!(in_review[0].id, task.id);
        assert!(Task::find_by_status(&db, TaskStatus::Pending)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn milestone_must_belong_to_the_task_project() {
        let db = setup_db().await;
        let (project, employee) = seed_project_and_employee(&db).await;
        let other = Project::create(
            &db,
            &CreateProject {
                name: "Gemini".to_string(),
                description: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();
        let milestone = crate::models::milestone::Milestone::create(
            &db,
            &crate::models::milestone::CreateMilestone {
                project_id: other.id,
                name: "M1".to_string(),
                description: None,
                budget: None,
                deadline: None,
            },
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let result = Task::create(
            &db,
            &CreateTask {
                project_id: project.id,
                milestone_id: Some(milestone.id),
                assigned_employee_id: employee.id,
                title: "Misfiled".to_string(),
                description: None,
            },
            Uuid::new_v4(),
        )
        .await;

        assert!(matches!(result, Err(DbErr::Custom(_))));
    }
}

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::task_submission,
    models::ids,
};
pub use crate::types::SubmissionStatus;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct TaskSubmission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub employee_id: Uuid,
    pub file_path: Option<String>,
    pub comment: Option<String>,
    pub status: SubmissionStatus,
    pub qa_comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTaskSubmission {
    pub task_id: Uuid,
    pub employee_id: Uuid,
    pub file_path: Option<String>,
    pub comment: Option<String>,
}

impl TaskSubmission {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: task_submission::Model,
    ) -> Result<Self, DbErr> {
        let task_uuid = ids::task_uuid_by_id(db, model.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        let employee_uuid = ids::user_uuid_by_id(db, model.employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        Ok(Self {
            id: model.uuid,
            task_id: task_uuid,
            employee_id: employee_uuid,
            file_path: model.file_path,
            comment: model.comment,
            status: model.status,
            qa_comment: model.qa_comment,
            reviewed_at: model.reviewed_at.map(Into::into),
            submitted_at: model.submitted_at.into(),
        })
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTaskSubmission,
        submission_id: Uuid,
    ) -> Result<Self, DbErr> {
        let task_row_id = ids::task_id_by_uuid(db, data.task_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;
        let employee_row_id = ids::user_id_by_uuid(db, data.employee_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let active = task_submission::ActiveModel {
            uuid: Set(submission_id),
            task_id: Set(task_row_id),
            employee_id: Set(employee_row_id),
            file_path: Set(data.file_path.clone()),
            comment: Set(data.comment.clone()),
            status: Set(SubmissionStatus::Submitted),
            qa_comment: Set(None),
            reviewed_at: Set(None),
            submitted_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    /// Latest submission for a task, regardless of review state. Used by
    /// the fetch endpoint so a rejected row stays visible as history.
    pub async fn latest_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let task_row_id = match ids::task_id_by_uuid(db, task_id).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let record = task_submission::Entity::find()
            .filter(task_submission::Column::TaskId.eq(task_row_id))
            .order_by_desc(task_submission::Column::Id)
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Latest unreviewed submission; this is what approve/reject operate on.
    pub async fn latest_submitted_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let task_row_id = match ids::task_id_by_uuid(db, task_id).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let record = task_submission::Entity::find()
            .filter(task_submission::Column::TaskId.eq(task_row_id))
            .filter(task_submission::Column::Status.eq(SubmissionStatus::Submitted))
            .order_by_desc(task_submission::Column::Id)
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn count_by_task_id<C: ConnectionTrait>(
        db: &C,
        task_id: Uuid,
    ) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;

        let task_row_id = match ids::task_id_by_uuid(db, task_id).await? {
            Some(id) => id,
            None => return Ok(0),
        };
        task_submission::Entity::find()
            .filter(task_submission::Column::TaskId.eq(task_row_id))
            .count(db)
            .await
    }

    pub async fn review<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        status: SubmissionStatus,
        qa_comment: Option<String>,
    ) -> Result<Self, DbErr> {
        let record = task_submission::Entity::find()
            .filter(task_submission::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Submission not found".to_string()))?;

        let mut active: task_submission::ActiveModel = record.into();
        active.status = Set(status);
        active.qa_comment = Set(qa_comment);
        active.reviewed_at = Set(Some(Utc::now().into()));

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }
}

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::milestone, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed: bool,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateMilestone {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub budget: Option<f64>,
    pub deadline: Option<DateTime<Utc>>,
}

impl Milestone {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: milestone::Model,
    ) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            project_id: project_uuid,
            name: model.name,
            description: model.description,
            budget: model.budget,
            deadline: model.deadline.map(Into::into),
            completed: model.completed,
            closed_at: model.closed_at.map(Into::into),
            created_at: model.created_at.into(),
        })
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = milestone::Entity::find()
            .filter(milestone::Column::Uuid.eq(id))
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

        let models = milestone::Entity::find()
            .filter(milestone::Column::ProjectId.eq(project_row_id))
            .order_by_asc(milestone::Column::CreatedAt)
            .all(db)
            .await?;

        let mut milestones = Vec::with_capacity(models.len());
        for model in models {
            milestones.push(Self::from_model(db, model).await?);
        }
        Ok(milestones)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateMilestone,
        milestone_id: Uuid,
    ) -> Result<Self, DbErr> {
        let project_row_id = ids::project_id_by_uuid(db, data.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;

        let active = milestone::ActiveModel {
            uuid: Set(milestone_id),
            project_id: Set(project_row_id),
            name: Set(data.name.clone()),
            description: Set(data.description.clone()),
            budget: Set(data.budget),
            deadline: Set(data.deadline.map(Into::into)),
            completed: Set(false),
            closed_at: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    /// Closing an already-closed milestone is a no-op returning the
    /// current row.
    pub async fn close<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Self, DbErr> {
        let record = milestone::Entity::find()
            .filter(milestone::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Milestone not found".to_string()))?;

        if record.completed {
            return Self::from_model(db, record).await;
        }

        let mut active: milestone::ActiveModel = record.into();
        active.completed = Set(true);
        active.closed_at = Set(Some(Utc::now().into()));

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }
}

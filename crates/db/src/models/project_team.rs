use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::project_team,
    models::ids,
};

#[derive(Debug, Error)]
pub enum ProjectTeamError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Team not found")]
    TeamNotFound,
    #[error("A team is already assigned to this project")]
    AlreadyAssigned,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ProjectTeam {
    pub project_id: Uuid,
    pub team_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ProjectTeam {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: project_team::Model,
    ) -> Result<Self, DbErr> {
        let project_uuid = ids::project_uuid_by_id(db, model.project_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Project not found".to_string()))?;
        let team_uuid = ids::team_uuid_by_id(db, model.team_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Team not found".to_string()))?;
        Ok(Self {
            project_id: project_uuid,
            team_id: team_uuid,
            created_at: model.created_at.into(),
        })
    }

    pub async fn find_by_project_id<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let project_row_id = match ids::project_id_by_uuid(db, project_id).await? {
            Some(row_id) => row_id,
            None => return Ok(None),
        };

        let record = project_team::Entity::find()
            .filter(project_team::Column::ProjectId.eq(project_row_id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Pre-checks for an existing assignment, then inserts. Concurrent
    /// assigns race to the unique index on project_id; the loser's
    /// constraint violation also maps to `AlreadyAssigned`.
    pub async fn assign<C: ConnectionTrait>(
        db: &C,
        project_id: Uuid,
        team_id: Uuid,
    ) -> Result<Self, ProjectTeamError> {
        let project_row_id = ids::project_id_by_uuid(db, project_id)
            .await?
            .ok_or(ProjectTeamError::ProjectNotFound)?;
        let team_row_id = ids::team_id_by_uuid(db, team_id)
            .await?
            .ok_or(ProjectTeamError::TeamNotFound)?;

        let existing = project_team::Entity::find()
            .filter(project_team::Column::ProjectId.eq(project_row_id))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ProjectTeamError::AlreadyAssigned);
        }

        let active = project_team::ActiveModel {
            project_id: Set(project_row_id),
            team_id: Set(team_row_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match active.insert(db).await {
            Ok(model) => Ok(Self::from_model(db, model).await?),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(ProjectTeamError::AlreadyAssigned)
            }
            Err(err) => Err(err.into()),
        }
    }
}

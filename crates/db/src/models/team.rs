use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{team, team_employee, user},
    models::{ids, user::User},
};

#[derive(Debug, Error)]
pub enum TeamError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Team not found")]
    NotFound,
    #[error("User is already a member of this team")]
    AlreadyMember,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTeam {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateTeam {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Team {
    fn from_model(model: team::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            description: model.description,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = team::Entity::find()
            .order_by_desc(team::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = team::Entity::find()
            .filter(team::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateTeam,
        team_id: Uuid,
    ) -> Result<Self, DbErr> {
        let active = team::ActiveModel {
            uuid: Set(team_id),
            name: Set(data.name.clone()),
            description: Set(data.description.clone()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        name: String,
        description: Option<String>,
    ) -> Result<Self, DbErr> {
        let record = team::Entity::find()
            .filter(team::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Team not found".to_string()))?;

        let mut active: team::ActiveModel = record.into();
        active.name = Set(name);
        active.description = Set(description);

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = team::Entity::delete_many()
            .filter(team::Column::Uuid.eq(id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn add_member<C: ConnectionTrait>(
        db: &C,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), TeamError> {
        let team_row_id = ids::team_id_by_uuid(db, team_id)
            .await?
            .ok_or(TeamError::NotFound)?;
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let active = team_employee::ActiveModel {
            team_id: Set(team_row_id),
            user_id: Set(user_row_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        match active.insert(db).await {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(TeamError::AlreadyMember)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn remove_member<C: ConnectionTrait>(
        db: &C,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<u64, TeamError> {
        let team_row_id = ids::team_id_by_uuid(db, team_id)
            .await?
            .ok_or(TeamError::NotFound)?;
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let result = team_employee::Entity::delete_many()
            .filter(team_employee::Column::TeamId.eq(team_row_id))
            .filter(team_employee::Column::UserId.eq(user_row_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn members<C: ConnectionTrait>(db: &C, team_id: Uuid) -> Result<Vec<User>, DbErr> {
        let team_row_id = ids::team_id_by_uuid(db, team_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Team not found".to_string()))?;

        let links = team_employee::Entity::find()
            .filter(team_employee::Column::TeamId.eq(team_row_id))
            .order_by_asc(team_employee::Column::CreatedAt)
            .all(db)
            .await?;

        let mut members = Vec::with_capacity(links.len());
        for link in links {
            if let Some(model) = user::Entity::find_by_id(link.user_id).one(db).await? {
                members.push(User::from_model(model));
            }
        }
        Ok(members)
    }
}

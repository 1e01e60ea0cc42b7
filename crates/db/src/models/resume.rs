use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::resume, models::ids};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub parsed: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct SaveResume {
    pub file_name: String,
    pub parsed: Option<serde_json::Value>,
}

impl Resume {
    async fn from_model<C: ConnectionTrait>(db: &C, model: resume::Model) -> Result<Self, DbErr> {
        let user_uuid = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let parsed = match model.parsed {
            Some(raw) => Some(
                serde_json::from_str(&raw).map_err(|err| DbErr::Custom(err.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            id: model.uuid,
            user_id: user_uuid,
            file_name: model.file_name,
            parsed,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    pub async fn find_by_user_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let user_row_id = match ids::user_id_by_uuid(db, user_id).await? {
            Some(id) => id,
            None => return Ok(None),
        };

        let record = resume::Entity::find()
            .filter(resume::Column::UserId.eq(user_row_id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// One resume per user; saving again replaces it.
    pub async fn upsert_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &SaveResume,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let parsed = match &data.parsed {
            Some(value) => Some(
                serde_json::to_string(value).map_err(|err| DbErr::Custom(err.to_string()))?,
            ),
            None => None,
        };

        let existing = resume::Entity::find()
            .filter(resume::Column::UserId.eq(user_row_id))
            .one(db)
            .await?;

        let model = match existing {
            Some(record) => {
                let mut active: resume::ActiveModel = record.into();
                active.file_name = Set(data.file_name.clone());
                active.parsed = Set(parsed);
                active.updated_at = Set(Utc::now().into());
                active.update(db).await?
            }
            None => {
                let now = Utc::now();
                let active = resume::ActiveModel {
                    uuid: Set(Uuid::new_v4()),
                    user_id: Set(user_row_id),
                    file_name: Set(data.file_name.clone()),
                    parsed: Set(parsed),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                    ..Default::default()
                };
                active.insert(db).await?
            }
        };

        Self::from_model(db, model).await
    }
}

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::user_profile,
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateUserProfile {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
}

impl UserProfile {
    async fn from_model<C: ConnectionTrait>(
        db: &C,
        model: user_profile::Model,
    ) -> Result<Self, DbErr> {
        let user_uuid = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        Ok(Self {
            id: model.uuid,
            user_id: user_uuid,
            phone: model.phone,
            address: model.address,
            bio: model.bio,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    /// Approval creates a profile with every field blank; the user fills
    /// it in later.
    pub async fn create_empty<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let now = Utc::now();
        let active = user_profile::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_row_id),
            phone: Set(None),
            address: Set(None),
            bio: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::from_model(db, model).await
    }

    pub async fn find_by_user_id<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        let user_row_id = match ids::user_id_by_uuid(db, user_id).await? {
            Some(row_id) => row_id,
            None => return Ok(None),
        };

        let record = user_profile::Entity::find()
            .filter(user_profile::Column::UserId.eq(user_row_id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        data: &UpdateUserProfile,
    ) -> Result<Self, DbErr> {
        let user_row_id = ids::user_id_by_uuid(db, user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

        let record = user_profile::Entity::find()
            .filter(user_profile::Column::UserId.eq(user_row_id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Profile not found".to_string()))?;

        let mut active: user_profile::ActiveModel = record.into();
        active.phone = Set(data.phone.clone());
        active.address = Set(data.address.clone());
        active.bio = Set(data.bio.clone());
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(db).await?;
        Self::from_model(db, updated).await
    }
}

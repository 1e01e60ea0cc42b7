use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::user_request, types::RequestStatus};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UserRequest {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: RequestStatus,
    pub review_comment: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// Credential fields copied into the user row at approval time; kept off
/// the serialized DTO.
#[derive(Debug, Clone)]
pub struct RequestCredentials {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserRequest {
    fn from_model(model: user_request::Model) -> Self {
        Self {
            id: model.uuid,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            status: model.status,
            review_comment: model.review_comment,
            reviewed_at: model.reviewed_at.map(Into::into),
            created_at: model.created_at.into(),
        }
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateUserRequest,
        request_id: Uuid,
    ) -> Result<Self, DbErr> {
        let active = user_request::ActiveModel {
            uuid: Set(request_id),
            email: Set(data.email.clone()),
            password_hash: Set(data.password_hash.clone()),
            first_name: Set(data.first_name.clone()),
            last_name: Set(data.last_name.clone()),
            status: Set(RequestStatus::Pending),
            review_comment: Set(None),
            reviewed_at: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user_request::Entity::find()
            .filter(user_request::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_pending<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = user_request::Entity::find()
            .filter(user_request::Column::Status.eq(RequestStatus::Pending))
            .order_by_asc(user_request::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn pending_exists_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<bool, DbErr> {
        let record = user_request::Entity::find()
            .filter(user_request::Column::Email.eq(email))
            .filter(user_request::Column::Status.eq(RequestStatus::Pending))
            .one(db)
            .await?;
        Ok(record.is_some())
    }

    pub async fn credentials<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<RequestCredentials>, DbErr> {
        let record = user_request::Entity::find()
            .filter(user_request::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(|model| RequestCredentials {
            email: model.email,
            password_hash: model.password_hash,
            first_name: model.first_name,
            last_name: model.last_name,
        }))
    }

    pub async fn mark_reviewed<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        status: RequestStatus,
        review_comment: Option<String>,
    ) -> Result<Self, DbErr> {
        let record = user_request::Entity::find()
            .filter(user_request::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("User request not found".to_string()))?;

        let mut active: user_request::ActiveModel = record.into();
        active.status = Set(status);
        active.review_comment = Set(review_comment);
        active.reviewed_at = Set(Some(Utc::now().into()));

        let updated = active.update(db).await?;
        Ok(Self::from_model(updated))
    }
}

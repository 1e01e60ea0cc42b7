use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use sea_orm::Iterable;
use ts_rs::TS;
use uuid::Uuid;

use crate::{entities::role, types::RoleName};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Role {
    pub id: Uuid,
    pub name: RoleName,
    pub created_at: DateTime<Utc>,
}

impl Role {
    fn from_model(model: role::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            created_at: model.created_at.into(),
        }
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        let records = role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = role::Entity::find()
            .filter(role::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_name<C: ConnectionTrait>(
        db: &C,
        name: RoleName,
    ) -> Result<Option<Self>, DbErr> {
        let record = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    /// Inserts any missing role rows. Safe to run on every startup.
    pub async fn ensure_defaults<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
        for name in RoleName::iter() {
            let exists = role::Entity::find()
                .filter(role::Column::Name.eq(name))
                .one(db)
                .await?
                .is_some();
            if exists {
                continue;
            }
            let active = role::ActiveModel {
                uuid: Set(Uuid::new_v4()),
                name: Set(name),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };
            active.insert(db).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    #[tokio::test]
    async fn ensure_defaults_is_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();

        Role::ensure_defaults(&db).await.unwrap();
        Role::ensure_defaults(&db).await.unwrap();

        let roles = Role::find_all(&db).await.unwrap();
        assert_eq!(roles.len(), 4);
        assert!(roles.iter().any(|r| r.name == RoleName::Admin));
        assert!(roles.iter().any(|r| r.name == RoleName::Qa));
    }
}

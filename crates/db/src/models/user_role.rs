use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    entities::{role, user_role},
    models::ids,
    types::RoleName,
};

pub async fn roles_for_user<C: ConnectionTrait>(
    db: &C,
    user_row_id: i64,
) -> Result<Vec<RoleName>, DbErr> {
    let links = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_row_id))
        .all(db)
        .await?;

    let mut names = Vec::with_capacity(links.len());
    for link in links {
        if let Some(role) = role::Entity::find_by_id(link.role_id).one(db).await? {
            names.push(role.name);
        }
    }
    Ok(names)
}

/// Links a user to a role; a duplicate pair surfaces the unique-index
/// violation to the caller.
pub async fn assign<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<(), DbErr> {
    let user_row_id = ids::user_id_by_uuid(db, user_id)
        .await?
        .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
    let role_row_id = ids::role_id_by_uuid(db, role_id)
        .await?
        .ok_or(DbErr::RecordNotFound("Role not found".to_string()))?;

    let active = user_role::ActiveModel {
        user_id: Set(user_row_id),
        role_id: Set(role_row_id),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };
    active.insert(db).await?;
    Ok(())
}

/// Drops every existing assignment for the user and links the given role.
pub async fn replace_for_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    role_id: Uuid,
) -> Result<(), DbErr> {
    let user_row_id = ids::user_id_by_uuid(db, user_id)
        .await?
        .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;

    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_row_id))
        .exec(db)
        .await?;

    assign(db, user_id, role_id).await
}

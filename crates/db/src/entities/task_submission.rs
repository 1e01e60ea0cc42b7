use sea_orm::entity::prelude::*;

use crate::types::SubmissionStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "task_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub task_id: i64,
    pub employee_id: i64,
    pub file_path: Option<String>,
    pub comment: Option<String>,
    pub status: SubmissionStatus,
    pub qa_comment: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub submitted_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

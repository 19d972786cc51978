//! SeaORM Entity for student_access table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    #[sea_orm(string_value = "preview")]
    Preview,
    #[sea_orm(string_value = "view")]
    View,
    #[sea_orm(string_value = "download")]
    Download,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_access")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub note_id: i32,
    pub access_type: AccessType,
    pub granted_at: DateTime,
    /// None means the grant never expires.
    pub expires_at: Option<DateTime>,
    pub is_active: bool,
    pub last_accessed: Option<DateTime>,
    pub access_count: i32,
}

impl Model {
    /// Active and not past its expiry.
    pub fn has_valid_access(&self, now: DateTime) -> bool {
        self.is_active && self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::notes::Entity",
        from = "Column::NoteId",
        to = "super::notes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Note,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Note.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

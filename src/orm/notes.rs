//! SeaORM Entity for notes table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    #[sea_orm(string_value = "lecture")]
    Lecture,
    #[sea_orm(string_value = "assignment")]
    Assignment,
    #[sea_orm(string_value = "exam")]
    Exam,
    #[sea_orm(string_value = "reference")]
    Reference,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Default for NoteType {
    fn default() -> Self {
        NoteType::Lecture
    }
}

impl NoteType {
    /// Parse the wire/database value, e.g. `"exam"`.
    pub fn parse(value: &str) -> Option<Self> {
        Self::try_from_value(&value.to_string()).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Lecture => "lecture",
            NoteType::Assignment => "assignment",
            NoteType::Exam => "exam",
            NoteType::Reference => "reference",
            NoteType::Other => "other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub semester_id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Storage key of the attachment.
    pub file: String,
    pub note_type: NoteType,
    pub uploaded_at: DateTime,
    /// Bytes, computed from the attachment when the note is saved.
    pub file_size: Option<i64>,
    pub preview_file: Option<String>,
    pub has_preview: bool,
    pub preview_generated_at: Option<DateTime>,
    pub is_premium: bool,
    pub view_count: i32,
    pub download_count: i32,
}

impl Model {
    /// Size in megabytes rounded to two places. None when unknown or zero.
    pub fn file_size_mb(&self) -> Option<f64> {
        self.file_size
            .filter(|&bytes| bytes > 0)
            .map(|bytes| (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0)
    }

    /// Lower-cased extension of the stored file, dot included.
    pub fn file_extension(&self) -> Option<String> {
        let name = self.file.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(format!(".{}", ext.to_lowercase()))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::semesters::Entity",
        from = "Column::SemesterId",
        to = "super::semesters::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Semester,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::student_access::Entity")]
    StudentAccess,
}

impl Related<super::semesters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Semester.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::student_access::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAccess.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! SeaORM Entity for courses table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(20))")]
#[serde(rename_all = "snake_case")]
pub enum CourseType {
    #[sea_orm(string_value = "bachelor")]
    Bachelor,
    #[sea_orm(string_value = "diploma")]
    Diploma,
    #[sea_orm(string_value = "certificate")]
    Certificate,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub faculty_id: i32,
    pub name: String,
    /// Upper-cased on write; unique within the faculty.
    pub code: String,
    pub course_type: CourseType,
    pub duration_years: i32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::faculties::Entity",
        from = "Column::FacultyId",
        to = "super::faculties::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Faculty,
    #[sea_orm(has_many = "super::academic_years::Entity")]
    AcademicYears,
}

impl Related<super::faculties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faculty.def()
    }
}

impl Related<super::academic_years::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicYears.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

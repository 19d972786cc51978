//! SeaORM Entity for academic_years table
//!
//! Rows are written through `crate::catalog::retention`, which keeps the
//! single-current-year flag and the per-course retention limit.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "academic_years")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub course_id: i32,
    pub year: i32,
    pub is_current: bool,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::year_levels::Entity")]
    YearLevels,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::year_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::YearLevels.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

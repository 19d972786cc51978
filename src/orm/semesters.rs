//! SeaORM Entity for semesters table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "semesters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub year_level_id: i32,
    /// 1 or 2.
    pub semester_number: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::year_levels::Entity",
        from = "Column::YearLevelId",
        to = "super::year_levels::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    YearLevel,
    #[sea_orm(has_many = "super::notes::Entity")]
    Notes,
}

impl Related<super::year_levels::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::YearLevel.def()
    }
}

impl Related<super::notes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

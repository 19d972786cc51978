//! SeaORM Entity for students table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub full_name: String,
    pub email: String,
    /// Free text, not a reference to `courses`.
    pub course: String,
    pub year: i32,
    pub is_logged_in: bool,
    /// UUID v4, generated on insert.
    pub login_token: String,
    /// Whole UGX.
    pub total_spent: i64,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
    #[sea_orm(has_many = "super::student_access::Entity")]
    StudentAccess,
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

//! SeaORM Entity for site_settings table
//!
//! Holds at most one row; see `crate::content`.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "site_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub site_name: String,
    pub site_logo: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub welcome_message: Option<String>,
    pub background_image: Option<String>,
    pub background_image2: Option<String>,
    pub contact_email: String,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub telegram_url: Option<String>,
    pub whatsapp_number: String,
    pub facebook_url: Option<String>,
    /// Whole UGX.
    pub view_price: i64,
    /// Whole UGX.
    pub download_price: i64,
    pub enable_payments: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

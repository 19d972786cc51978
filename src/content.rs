//! Site content: the SiteSettings and AboutUs singletons and the ordered
//! how-it-works steps.

use crate::error::ServiceError;
use crate::orm::{about_us, how_it_works, site_settings};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use validator::Validate;

fn default_view_price() -> i64 {
    500
}

fn default_download_price() -> i64 {
    1000
}

#[derive(Debug, Deserialize, Validate)]
pub struct SiteSettingsInput {
    #[validate(length(min = 1, max = 100, message = "Ensure this field has 1 to 100 characters."))]
    pub site_name: String,
    pub site_logo: Option<String>,
    #[validate(length(max = 1000, message = "Ensure this field has no more than 1000 characters."))]
    #[serde(alias = "welcomemsg")]
    pub welcome_message: Option<String>,
    #[serde(alias = "backgroundimage")]
    pub background_image: Option<String>,
    #[serde(alias = "backgroundimage2")]
    pub background_image2: Option<String>,
    #[validate(email)]
    pub contact_email: String,
    #[validate(url)]
    pub instagram_url: Option<String>,
    #[validate(url)]
    pub twitter_url: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(url)]
    pub telegram_url: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Ensure this field has 1 to 20 characters."))]
    pub whatsapp_number: String,
    #[validate(url)]
    pub facebook_url: Option<String>,
    #[serde(default = "default_view_price")]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub view_price: i64,
    #[serde(default = "default_download_price")]
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub download_price: i64,
    #[serde(default)]
    pub enable_payments: bool,
}

impl SiteSettingsInput {
    fn apply(self, model: &mut site_settings::ActiveModel) {
        model.site_name = Set(self.site_name);
        model.site_logo = Set(blank_to_none(self.site_logo));
        model.welcome_message = Set(blank_to_none(self.welcome_message));
        model.background_image = Set(blank_to_none(self.background_image));
        model.background_image2 = Set(blank_to_none(self.background_image2));
        model.contact_email = Set(self.contact_email);
        model.instagram_url = Set(blank_to_none(self.instagram_url));
        model.twitter_url = Set(blank_to_none(self.twitter_url));
        model.linkedin_url = Set(blank_to_none(self.linkedin_url));
        model.telegram_url = Set(blank_to_none(self.telegram_url));
        model.whatsapp_number = Set(self.whatsapp_number);
        model.facebook_url = Set(blank_to_none(self.facebook_url));
        model.view_price = Set(self.view_price);
        model.download_price = Set(self.download_price);
        model.enable_payments = Set(self.enable_payments);
        model.updated_at = Set(Utc::now().naive_utc());
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AboutUsInput {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub title: String,
    #[validate(length(max = 255, message = "Ensure this field has no more than 255 characters."))]
    pub subtitle: Option<String>,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: String,
    pub mission: Option<String>,
    pub vision: Option<String>,
    pub history: Option<String>,
    pub image: Option<String>,
    /// Comma separated names.
    pub team_members: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
}

impl AboutUsInput {
    fn apply(self, model: &mut about_us::ActiveModel) {
        model.title = Set(self.title);
        model.subtitle = Set(blank_to_none(self.subtitle));
        model.description = Set(self.description);
        model.mission = Set(blank_to_none(self.mission));
        model.vision = Set(blank_to_none(self.vision));
        model.history = Set(blank_to_none(self.history));
        model.image = Set(blank_to_none(self.image));
        model.team_members = Set(blank_to_none(self.team_members));
        model.website = Set(blank_to_none(self.website));
        model.updated_at = Set(Utc::now().naive_utc());
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct HowItWorksInput {
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub step_number: i32,
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters."))]
    pub step_title: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub description: String,
    pub image: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// The settings row, if configured.
pub async fn get_site_settings<C>(db: &C) -> Result<Option<site_settings::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(site_settings::Entity::find()
        .order_by_asc(site_settings::Column::Id)
        .one(db)
        .await?)
}

/// Insert the settings row. Fails when one already exists.
pub async fn insert_site_settings<C>(
    db: &C,
    input: SiteSettingsInput,
) -> Result<site_settings::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    if get_site_settings(db).await?.is_some() {
        return Err(ServiceError::non_field(
            "Only one SiteSettings instance is allowed.",
        ));
    }

    let mut model = site_settings::ActiveModel {
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    input.apply(&mut model);
    Ok(model.insert(db).await?)
}

/// Write the settings row, creating it when absent. Returns the row and
/// whether it was created.
pub async fn upsert_site_settings<C>(
    db: &C,
    input: SiteSettingsInput,
) -> Result<(site_settings::Model, bool), ServiceError>
where
    C: ConnectionTrait,
{
    match get_site_settings(db).await? {
        None => Ok((insert_site_settings(db, input).await?, true)),
        Some(existing) => {
            input.validate()?;
            let mut model: site_settings::ActiveModel = existing.into();
            input.apply(&mut model);
            Ok((model.update(db).await?, false))
        }
    }
}

pub async fn get_about_us<C>(db: &C) -> Result<Option<about_us::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(about_us::Entity::find()
        .order_by_asc(about_us::Column::Id)
        .one(db)
        .await?)
}

pub async fn insert_about_us<C>(db: &C, input: AboutUsInput) -> Result<about_us::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    if get_about_us(db).await?.is_some() {
        return Err(ServiceError::non_field("Only one AboutUs instance is allowed."));
    }

    let mut model = about_us::ActiveModel {
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    input.apply(&mut model);
    Ok(model.insert(db).await?)
}

pub async fn upsert_about_us<C>(
    db: &C,
    input: AboutUsInput,
) -> Result<(about_us::Model, bool), ServiceError>
where
    C: ConnectionTrait,
{
    match get_about_us(db).await? {
        None => Ok((insert_about_us(db, input).await?, true)),
        Some(existing) => {
            input.validate()?;
            let mut model: about_us::ActiveModel = existing.into();
            input.apply(&mut model);
            Ok((model.update(db).await?, false))
        }
    }
}

pub async fn list_steps<C>(db: &C) -> Result<Vec<how_it_works::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(how_it_works::Entity::find()
        .order_by_asc(how_it_works::Column::StepNumber)
        .all(db)
        .await?)
}

pub async fn create_step<C>(
    db: &C,
    input: HowItWorksInput,
) -> Result<how_it_works::Model, ServiceError>
where
    C: ConnectionTrait,
{
    input.validate()?;
    let taken = how_it_works::Entity::find()
        .filter(how_it_works::Column::StepNumber.eq(input.step_number))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(ServiceError::field(
            "step_number",
            format!("Step {} already exists.", input.step_number),
        ));
    }

    let now = Utc::now().naive_utc();
    let step = how_it_works::ActiveModel {
        step_number: Set(input.step_number),
        step_title: Set(input.step_title),
        description: Set(input.description),
        image: Set(blank_to_none(input.image)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(step)
}

pub async fn delete_step<C>(db: &C, step_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let result = how_it_works::Entity::delete_by_id(step_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(ServiceError::not_found("Step not found."));
    }
    Ok(())
}

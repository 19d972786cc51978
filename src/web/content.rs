//! Site settings, about page and how-it-works steps.

use crate::content;
use crate::error::ServiceError;
use crate::storage::StorageBackend;
use crate::web::views::{AboutUsView, HowItWorksView, SiteSettingsView, Urls};
use actix_web::{get, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_site_settings)
        .service(view_about_us)
        .service(view_how_it_works);
}

#[get("/api/site-settings/")]
async fn view_site_settings(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
) -> Result<HttpResponse, ServiceError> {
    let settings = content::get_site_settings(db.get_ref())
        .await?
        .ok_or_else(|| ServiceError::not_found("Site settings not configured."))?;
    let urls = Urls::from_request(&req);
    Ok(HttpResponse::Ok().json(SiteSettingsView::new(settings, &urls, storage.get_ref())))
}

#[get("/api/about-us/")]
async fn view_about_us(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
) -> Result<HttpResponse, ServiceError> {
    let about = content::get_about_us(db.get_ref())
        .await?
        .ok_or_else(|| ServiceError::not_found("AboutUs information not configured."))?;
    let urls = Urls::from_request(&req);
    Ok(HttpResponse::Ok().json(AboutUsView::new(about, &urls, storage.get_ref())))
}

#[get("/api/how-it-works/")]
async fn view_how_it_works(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    storage: web::Data<dyn StorageBackend>,
) -> Result<HttpResponse, ServiceError> {
    let urls = Urls::from_request(&req);
    let steps: Vec<HowItWorksView> = content::list_steps(db.get_ref())
        .await?
        .into_iter()
        .map(|step| HowItWorksView::new(step, &urls, storage.get_ref()))
        .collect();
    Ok(HttpResponse::Ok().json(steps))
}

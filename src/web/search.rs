use crate::access::ListingAccess;
use crate::app_config::AppConfig;
use crate::error::ServiceError;
use crate::search::{self, SearchQuery};
use crate::web::views::{SearchResult, Urls};
use actix_web::{get, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(search_notes);
}

#[get("/api/search/")]
async fn search_notes(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ServiceError> {
    let db = db.get_ref();
    let hits = search::search_notes(db, &query, config.limits.search_results).await?;
    let access = ListingAccess::load(
        db,
        &config.access,
        None,
        hits.iter().map(|h| h.note.id).collect(),
    )
    .await?;
    let urls = Urls::from_request(&req);

    let results: Vec<SearchResult> = hits
        .iter()
        .map(|hit| SearchResult::new(hit, &access, &urls))
        .collect();
    Ok(HttpResponse::Ok().json(results))
}

pub mod admin;
pub mod catalog;
pub mod content;
pub mod error;
pub mod media;
pub mod notes;
pub mod search;
pub mod stats;
pub mod students;
pub mod views;

use actix_web::web;

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.app_data(error::json_config())
        .app_data(error::query_config())
        .app_data(error::path_config());

    stats::configure(conf);
    students::configure(conf);
    content::configure(conf);
    catalog::configure(conf);
    notes::configure(conf);
    search::configure(conf);
    admin::configure(conf);

    conf.default_service(web::route().to(error::not_found));
}

//! Shared integration test support.
#![allow(dead_code)]

pub mod database;
pub mod fixtures;

/// Build the full application around a [`database::TestContext`].
macro_rules! test_app {
    ($ctx:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($ctx.db.clone()))
                .app_data(actix_web::web::Data::new($ctx.config.clone()))
                .app_data(actix_web::web::Data::from($ctx.storage.clone()))
                .configure(paperflow::web::configure),
        )
    };
}

use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use env_logger::Env;
use paperflow::app_config;
use paperflow::db::{get_db_pool, init_db};
use paperflow::storage::{self, StorageBackend};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();
    app_config::init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set.")?;
    init_db(database_url)
        .await
        .context("Failed to initialize the database")?;

    let config = app_config::get_config();
    let storage: Arc<dyn StorageBackend> = storage::from_config(&config.storage)
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;
    let bind_address = config.site.bind_address.clone();
    log::info!("Listening on {}", bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        let app = App::new()
            .app_data(Data::new(get_db_pool().clone()))
            .app_data(Data::new(config.clone()))
            .app_data(Data::from(storage.clone()))
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin")),
            )
            .wrap(Logger::new("%a %r %s %Dms"));

        match paperflow::web::media::media_service(&config.storage) {
            Some(media) => app.service(media).configure(paperflow::web::configure),
            None => app.configure(paperflow::web::configure),
        }
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

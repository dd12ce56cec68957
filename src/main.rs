use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;

use podium_chat::server;
use podium_chat::settings::load_settings;
use podium_chat::{Catalog, ChatEngine, ChatService, ConversationStore, InMemoryStore};

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings().context("Failed to load settings")?;

    let catalog = match &settings.data.catalog_file {
        Some(path) => {
            Catalog::load(path).with_context(|| format!("Failed to load catalog '{}'", path))?
        }
        None => Catalog::builtin().context("Built-in catalog is invalid")?,
    };
    log::info!(
        "Loaded catalog v{} with {} services",
        catalog.version,
        catalog.service_names().len()
    );

    let engine = Arc::new(ChatEngine::new(Arc::new(catalog), settings.engine_options()));
    let store: Arc<dyn ConversationStore> = Arc::new(InMemoryStore::new());
    let service = web::Data::new(ChatService::new(engine, store, settings.service_options()));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let static_dir = settings.server.static_dir.clone();

    log::info!("Starting server at http://{}:{}", host, port);
    HttpServer::new(move || {
        let mut app = App::new()
            .app_data(service.clone())
            .configure(server::configure);
        if let Some(dir) = &static_dir {
            app = app.service(actix_files::Files::new("/static", dir));
        }
        app
    })
    .bind((host, port))?
    .run()
    .await?;
    Ok(())
}

// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod errors;
mod handlers;
mod models;
mod pipeline;
mod services;
#[cfg(test)]
mod testing;

use crate::config::Config;
use crate::pipeline::{BatchIntakeOrchestrator, SessionRegistry, StyleCatalog, VariantOrchestrator, variants};
use crate::services::{
    EntryStore, GeminiService, ImageEnhancer, ImageProcessor, ProductAnalyzer, RedisEntryStore,
    SettingsStore, settings_store,
};

const REMINDER_PERIOD: Duration = Duration::from_secs(10);
const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<dyn ProductAnalyzer>,
    store: Arc<dyn EntryStore>,
    intake: Arc<BatchIntakeOrchestrator>,
    variants: Arc<VariantOrchestrator>,
    sessions: Arc<SessionRegistry>,
    settings: Arc<SettingsStore>,
    image_processor: Arc<ImageProcessor>,
    export_dir: PathBuf,
}

impl AppState {
    pub fn new(
        analyzer: Arc<dyn ProductAnalyzer>,
        enhancer: Arc<dyn ImageEnhancer>,
        store: Arc<dyn EntryStore>,
        settings: SettingsStore,
        config: &Config,
    ) -> Self {
        let intake = BatchIntakeOrchestrator::new(
            analyzer.clone(),
            store.clone(),
            config.max_batch_images,
        );
        let variants = VariantOrchestrator::new(
            analyzer.clone(),
            enhancer,
            Arc::new(StyleCatalog::builtin()),
            config.download_delay,
        );

        Self {
            analyzer,
            store,
            intake: Arc::new(intake),
            variants: Arc::new(variants),
            sessions: Arc::new(SessionRegistry::new(config.session_ttl)),
            settings: Arc::new(settings),
            image_processor: Arc::new(ImageProcessor::new()),
            export_dir: config.export_dir.clone(),
        }
    }

    #[cfg(test)]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting ShelfScan service...");
    let config = Config::from_env()?;

    // Initialize services
    let store = Arc::new(RedisEntryStore::new(&config.redis_url).await?);
    let gemini = Arc::new(GeminiService::new(
        config.gemini_api_key.clone(),
        config.analysis_model.clone(),
        config.enhance_model.clone(),
    ));

    let app_state = AppState::new(
        gemini.clone(),
        gemini,
        store,
        SettingsStore::new(&config.settings_path),
        &config,
    );

    actix_web::rt::spawn(settings_store::run_reminder_ticker(
        app_state.settings.clone(),
        REMINDER_PERIOD,
    ));
    actix_web::rt::spawn(variants::run_session_sweeper(
        app_state.sessions.clone(),
        SESSION_SWEEP_PERIOD,
    ));

    info!("Starting HTTP server on {}", config.bind_addr);

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        let app = App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure);

        match &static_dir {
            Some(dir) => app.service(actix_files::Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .bind(&config.bind_addr)?
    .run()
    .await?;

    Ok(())
}

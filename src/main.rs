use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use site_scout::config::{LoggingSettings, Settings};
use site_scout::routes::{self, analysis::AppState};
use site_scout::services::{AnalysisOrchestrator, InMemoryCatalog};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Settings are read first so the [logging] section can shape the subscriber
    let loaded = Settings::load();
    let logging = loaded
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .with_overrides(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok());
    init_logging(&logging);

    info!("Starting Site Scout analysis service...");

    let settings = loaded.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    let catalog = match &settings.catalog.seed_path {
        Some(path) => InMemoryCatalog::from_json_file(path).map_err(|e| {
            error!("Failed to load catalog from {}: {}", path, e);
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?,
        None => {
            warn!("No catalog seed configured; every reference lookup will fail");
            InMemoryCatalog::default()
        }
    };
    let catalog = Arc::new(catalog);

    let orchestrator = AnalysisOrchestrator::new(
        catalog.clone(),
        catalog,
        settings.runs.capacity,
        settings.runs.ttl_secs,
    );

    let defaults = settings.analysis.template();
    info!("Orchestrator initialized with default weights: {:?}", defaults.weights);

    let app_state = AppState {
        orchestrator,
        defaults,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(routes::handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(routes::handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

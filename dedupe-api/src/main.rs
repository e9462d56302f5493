use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

use dedupe_api::config::ApiConfig;
use dedupe_api::database::contacts as contacts_db;
use dedupe_api::handlers::{self, DedupeAppState};
use dedupe_api::helpers;

#[get("/health")]
async fn health(data: web::Data<DedupeAppState>) -> impl Responder {
    match data.db.lock().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected",
            "contacts": data.cache.len()
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Alternate config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("dedupe-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let (config, config_path) = match args.config {
        Some(path) => ApiConfig::load_from(path),
        None => ApiConfig::load(),
    }
    .expect("Failed to load config");
    tracing::info!("Loaded config from {:?}", config_path);

    let (db, db_path) = helpers::database::initialize_database(config.database_path())
        .expect("Failed to initialize database");
    tracing::info!("Database initialized at: {:?}", db_path);

    let contacts = contacts_db::list_contacts(db.async_connection.clone())
        .await
        .expect("Failed to load contacts");
    tracing::info!("Loaded {} contacts", contacts.len());

    let state = DedupeAppState::new(
        db.async_connection.clone(),
        contacts,
        config.ledger_scope(),
    );
    let summary = state.queue.scan();
    tracing::info!("Initial scan found {} duplicate groups", summary.total_groups());

    let (host, port) = config.server_address();
    tracing::info!("Server will listen on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(state.clone()))
            .service(health)
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

// Turnera Streaming Server
//
// Binary entrypoint: wires the change source, dispatcher and session manager
// together and serves the streaming API.

mod config;
mod logging;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use config::ServerConfig;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use turnera_api::{routes, StreamSettings};
use turnera_core::dispatch::EVENT_CHANNEL_CAPACITY;
use turnera_core::{
    NotificationDispatcher, PgChangeSource, SnapshotBuilder, SourceConfig, StreamSessionManager,
    TicketDirectory,
};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration (fallback to defaults when config file missing)
    let config = match ServerConfig::from_file("config.toml") {
        Ok(cfg) => cfg,
        Err(_) => {
            eprintln!("Warning: config.toml not found, using defaults");
            ServerConfig::default()
        }
    };

    // Logging before any other side effects
    logging::init_logging(
        &config.logging.level,
        &config.logging.file_path,
        config.logging.log_to_console,
    )?;

    info!("Starting Turnera Streaming Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded: host={}, port={}",
        config.server.host, config.server.port
    );

    // Change source adapter. The pool connects lazily: an unreachable store
    // leaves the server in degraded mode (no live updates, empty lookups)
    // rather than failing startup; only a malformed URL is fatal.
    let source = PgChangeSource::connect(&SourceConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        channel: config.database.channel.clone(),
    })?;
    info!(
        "Change source configured on channel '{}'",
        config.database.channel
    );

    // Dispatcher and session manager
    let dispatcher = NotificationDispatcher::new();
    let directory: Arc<dyn TicketDirectory> = source.clone();
    let snapshots = SnapshotBuilder::new(directory.clone());
    let manager = StreamSessionManager::new(directory, snapshots, source.status());
    dispatcher.register(manager.clone());

    // Listener task and dispatch task, joined by a bounded channel
    let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    source.start(events_tx);
    tokio::spawn(dispatcher.clone().run(events_rx));

    let stream_settings = StreamSettings {
        keep_alive: Duration::from_secs(config.stream.keep_alive_seconds),
    };

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server on {}", bind_addr);
    info!("Endpoints: GET /v1/api/stream, GET /v1/api/queues/{{id}}/state");

    let manager_data = web::Data::new(manager.clone());
    let workers = if config.server.workers == 0 {
        num_cpus::get()
    } else {
        config.server.workers
    };

    HttpServer::new(move || {
        // Configure CORS for web browser clients
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(manager_data.clone())
            .app_data(web::Data::new(stream_settings.clone()))
            .configure(routes::configure_routes)
    })
    .bind(&bind_addr)?
    .workers(workers)
    .run()
    .await?;

    source.stop();
    if manager.session_count() > 0 {
        warn!(
            "Shutting down with {} open watch session(s)",
            manager.session_count()
        );
    }
    info!("Server shutdown complete");
    Ok(())
}

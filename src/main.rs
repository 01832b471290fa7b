use axum::http::HeaderValue;
use hedwig::config::Config;
use hedwig::registry::{DocumentRegistry, FileStore};
use hedwig::repo::{BroadcastNetwork, DocRepo, FsStorage};
use hedwig::routes::AppState;
use hedwig::session::{SessionController, ShareLinks};
use std::panic;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Configuration is read first so that its log level can seed the filter
    let loaded = Config::load();
    let log_level = loaded
        .as_ref()
        .map(|config| config.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("hedwig={},tower_http=debug,axum::rejection=trace,info", log_level).into()
        }))
        .init();

    info!("Starting editor service...");

    let config = loaded.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    let public_url = Url::parse(&config.public_url)
        .unwrap_or_else(|e| panic!("Invalid PUBLIC_URL '{}': {}", config.public_url, e));
    let links = ShareLinks::new(public_url.as_str())
        .unwrap_or_else(|e| panic!("Invalid PUBLIC_URL '{}': {}", config.public_url, e));

    // Composition root: the repo and session controller live for the whole process.
    let network = BroadcastNetwork::new(config.network_capacity);
    let repo = DocRepo::new(
        Arc::new(FsStorage::new(config.snapshot_dir())),
        Some(network),
        config.doc_cache_capacity,
    );
    let registry = Arc::new(DocumentRegistry::new(Arc::new(FileStore::new(&config.data_dir))));
    let session = Arc::new(SessionController::new(
        repo.clone(),
        registry,
        links,
        config.load_timeout(),
    ));

    let app = hedwig::build_app(AppState {
        session: session.clone(),
        public_url,
    })
    .layer(cors_layer(&config));

    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("Server running on http://{}", config.server_address());
    info!("Swagger UI available at http://{}/swagger", config.server_address());
    info!("Documents stored in {}", config.data_dir.display());

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
    }

    session.close();
    repo.shutdown().await;
    info!("Editor service stopped");
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origin_list()
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        if !config.is_development() {
            warn!("No CORS_ORIGINS configured, allowing any origin");
        }
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

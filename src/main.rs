use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;

use slidesmith::admission::concurrency::ConcurrencyLimiter;
use slidesmith::cache::DeckCache;
use slidesmith::config::AppConfig;
use slidesmith::generator::deck::DeckBuilder;
use slidesmith::generator::openai::OpenAiGenerator;
use slidesmith::generator::placeholder::PlaceholderGenerator;
use slidesmith::generator::{ContentGenerator, SharedGenerator};
use slidesmith::routes::{self, AppState};
use slidesmith::storage;
use slidesmith::storage::store::PresentationStore;

#[derive(Parser)]
#[command(name = "slidesmith", about = "Self-hosted slide deck generation service")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slidesmith=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(Some(&cli.config))?;

    if let Err(msg) = config.validate() {
        eprintln!("Configuration error: {msg}");
        return Err(msg.into());
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        db = %config.database.path.display(),
        "starting slidesmith"
    );

    // Setup SQLite pool
    let pool = storage::sqlite::create_pool(&config.database)?;
    storage::sqlite::init_pool(&pool).await?;
    tracing::info!("database initialized");

    let cache = Arc::new(DeckCache::new(config.cache.clone()));

    // Bind the OpenAI generator at startup when a key is configured,
    // otherwise run on the deterministic placeholder.
    let generator: Arc<dyn ContentGenerator> = if config.generation.openai_api_key.is_empty() {
        Arc::new(PlaceholderGenerator)
    } else {
        Arc::new(OpenAiGenerator::new(
            config.generation.openai_api_key.clone(),
            config.generation.clone(),
        ))
    };
    let shared_generator = SharedGenerator::new(generator);
    tracing::info!(generator = %shared_generator.kind(), "content generator bound");

    let state = Arc::new(AppState {
        cache: cache.clone(),
        store: PresentationStore::new(pool.clone(), cache.clone()),
        deck: DeckBuilder::new(shared_generator, cache),
        concurrency: Arc::new(ConcurrencyLimiter::new(config.concurrency.clone())),
        config,
    });

    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );
    let app = routes::router(state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }

    tracing::info!("shutting down...");
}

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stylist_generation::config::GeneratorConfig;
use stylist_storage::StorageConfig;
use stylist_worker::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stylist_worker=debug,stylist_generation=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    let generator_config = GeneratorConfig::from_env();
    let storage_config = StorageConfig::from_env();
    tracing::info!(
        mode = ?generator_config.mode,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = stylist_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    stylist_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    stylist_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    // --- Storage + generator ---
    let storage = stylist_storage::build_storage(&storage_config)
        .await
        .expect("Failed to initialise storage");
    let generator = stylist_generation::build_generator(&generator_config, storage)
        .await
        .expect("Failed to initialise generator");

    // --- Run until signalled ---
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    stylist_worker::run(pool, generator.as_ref(), config.poll_interval, cancel).await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), finishing current job");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, finishing current job");
        }
    }
}

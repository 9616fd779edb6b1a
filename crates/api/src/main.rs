use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vitrine_api::config::ServerConfig;
use vitrine_api::router::build_app_router;
use vitrine_api::state::AppState;
use vitrine_cloud::{CloudConfig, HttpDeviceCloud};
use vitrine_collector::{CollectionScheduler, RegistryTargets};
use vitrine_events::{AlertMailer, EmailConfig, EmailDelivery, EventBus};
use vitrine_pipeline::IngestionPipeline;

/// Headroom over the HTTP client timeout so the client reports its own error.
const FETCH_TIMEOUT_MARGIN_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;

    let pool = vitrine_db::create_pool(&database_url).await?;
    tracing::info!("Database connection pool created");

    vitrine_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    vitrine_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- Event bus and alert mailer ---
    let event_bus = Arc::new(EventBus::default());

    let mailer_cancel = CancellationToken::new();
    let mailer_handle = match EmailConfig::from_env() {
        Some(email_config) => {
            let fallback = email_config.fallback_recipient.clone();
            let mailer = AlertMailer::new(
                pool.clone(),
                Arc::new(EmailDelivery::new(email_config)),
                fallback,
            );
            Some(tokio::spawn(
                mailer.run(event_bus.subscribe(), mailer_cancel.clone()),
            ))
        }
        None => {
            tracing::info!("SMTP_HOST not set, alert emails disabled");
            None
        }
    };

    // --- Ingestion and collection ---
    let pipeline = IngestionPipeline::new(
        pool.clone(),
        Arc::clone(&event_bus),
        Duration::from_secs(config.store_timeout_secs),
    );

    let cloud_config = CloudConfig::from_env();
    let fetch_timeout = Duration::from_secs(cloud_config.timeout_secs + FETCH_TIMEOUT_MARGIN_SECS);
    tracing::info!(base_url = %cloud_config.base_url, "Device cloud client configured");
    let cloud = HttpDeviceCloud::new(cloud_config)?;

    let scheduler = CollectionScheduler::new(
        Arc::new(RegistryTargets::new(pool.clone())),
        Arc::new(cloud),
        Arc::new(pipeline.clone()),
        fetch_timeout,
    );

    // --- App state and router ---
    let state = AppState {
        pool,
        device_policy: config.device_status_policy(),
        pipeline,
        scheduler: scheduler.clone(),
    };

    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    if tokio::time::timeout(Duration::from_secs(10), scheduler.shutdown())
        .await
        .is_err()
    {
        tracing::warn!("Collection run did not stop within 10s");
    }

    mailer_cancel.cancel();
    if let Some(handle) = mailer_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

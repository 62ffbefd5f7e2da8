//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, DiskFileStore, PaystackAdapter},
    config::Config,
    error::ApiError,
    web::{auth::hash_password, router, state::AppState},
};
use consultancy_core::{ports::DatabaseService, ReservationService, SystemClock};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    if let Some(admin) = &config.bootstrap_admin {
        let hashed = hash_password(&admin.password)?;
        db_adapter
            .upsert_admin(&admin.email.trim().to_lowercase(), &hashed)
            .await?;
        info!("Bootstrap admin {} is ready", admin.email);
    }

    // --- 3. Initialize Service Adapters ---
    let files = Arc::new(DiskFileStore::new(
        config.uploads_dir.clone(),
        config.uploads_url_prefix.clone(),
    ));
    files.ensure_root().await?;

    if config.paystack_secret_key.is_none() {
        info!("PAYSTACK_SECRET_KEY is not set; payment initialization will fail");
    }
    let payments = Arc::new(PaystackAdapter::new(
        config.paystack_base_url.clone(),
        config.paystack_secret_key.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        db_adapter,
        payments,
        files,
        Arc::new(SystemClock),
    ));

    // --- 5. Background expiry of unpaid bookings ---
    let shutdown = CancellationToken::new();
    if config.pending_expiry_minutes.is_some() {
        tokio::spawn(expiry_sweep(
            app_state.reservations.clone(),
            Duration::from_secs(config.expiry_sweep_interval_secs.max(1)),
            shutdown.clone(),
        ));
    }

    // --- 6. Start the Server ---
    let app = router(app_state);
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn expiry_sweep(reservations: ReservationService, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = reservations.expire_stale_bookings().await {
                    error!("Expiry sweep failed: {}", e);
                }
            }
        }
    }
}

async fn shutdown_signal(token: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
    token.cancel();
}

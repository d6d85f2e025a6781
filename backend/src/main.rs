//! Backend entry-point: loads settings, migrates the database and serves the
//! payroll REST API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use payroll::domain::IdempotencyGuard;
use payroll::domain::idempotency::IdempotencyConfig;
use payroll::inbound::http::health::HealthState;
use payroll::outbound::persistence::{
    DbPool, DieselIdempotencyRepository, PoolConfig, run_pending_migrations,
};
use server::{ServerConfig, ServerSettings, create_server};

fn other_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("{context}: {err}"))
}

/// Apply migrations off the async runtime, then open the pool.
async fn connect(database_url: String, max_size: u32) -> std::io::Result<DbPool> {
    let migration_url = database_url.clone();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&migration_url))
        .await
        .map_err(|err| other_error("migration task failed", err))?
        .map_err(|err| other_error("database migration failed", err))?;
    info!(applied, "database migrations applied");

    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(max_size))
        .await
        .map_err(|err| other_error("database pool setup failed", err))?;

    let guard = IdempotencyGuard::new(
        Arc::new(DieselIdempotencyRepository::new(pool.clone())),
        Arc::new(DefaultClock),
        IdempotencyConfig::from_env(),
    );
    match guard.purge_expired().await {
        Ok(purged) => info!(purged, "expired idempotency records removed"),
        Err(err) => warn!(error = %err, "idempotency cleanup failed"),
    }
    Ok(pool)
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        ServerSettings::load().map_err(|err| other_error("failed to load settings", err))?;
    let bind_addr = settings
        .bind_addr()
        .map_err(|err| other_error("invalid settings", err))?;
    let renderer = settings
        .build_renderer()
        .map_err(|err| other_error("invalid settings", err))?;
    if settings.renderer_url.is_none() {
        warn!("PAYROLL_RENDERER_URL unset; payslips use placeholder file references");
    }

    let database_url = settings
        .database_url(cfg!(debug_assertions))
        .map_err(|err| other_error("invalid settings", err))?;
    let mut config = ServerConfig::new(bind_addr).with_renderer(renderer);
    match database_url {
        Some(database_url) => {
            let pool = connect(database_url.to_owned(), settings.pool_max_size()).await?;
            config = config.with_db_pool(pool);
        }
        None => warn!("PAYROLL_DATABASE_URL unset; serving fixture data"),
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting payroll server");
    create_server(health_state, config)?.await
}

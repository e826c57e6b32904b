use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::DatabaseConfig;

/// Opens the shared connection pool.
///
/// A request waits up to `acquire_timeout` for a free connection before failing with a store
/// error.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .min_connections(config.pool_size)
        .max_connections(config.pool_size + config.max_overflow)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.recycle)
        .max_lifetime(config.recycle)
        .test_before_acquire(config.pre_ping)
        .sqlx_logging(false);

    tracing::info!(
        pool_size = config.pool_size,
        max_overflow = config.max_overflow,
        "connecting to database"
    );
    Database::connect(options).await
}

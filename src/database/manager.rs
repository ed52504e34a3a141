use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Pool exhaustion or an unreachable server, as opposed to a failed statement
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)
                | DatabaseError::Sqlx(sqlx::Error::PoolClosed)
                | DatabaseError::Sqlx(sqlx::Error::Io(_))
        )
    }
}

/// Owned handle to the connection pool, created once at startup and passed to
/// every service that needs storage.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let pool = Self::pool_options(config).connect(&config.url).await?;
        info!("Connected database pool (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Pool that opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if config.url.is_empty() {
            return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
        }
        let pool = Self::pool_options(config).connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn empty_url_is_reported() {
        let config = AppConfig::development();
        assert!(matches!(
            Database::connect_lazy(&config.database),
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut).is_unavailable());
        assert!(!DatabaseError::Sqlx(sqlx::Error::RowNotFound).is_unavailable());
    }

    /// Postgres names a column-level CHECK `<table>_<column>_check`; a table
    /// constraint with that same name aborts the migration.
    #[test]
    fn named_constraints_do_not_shadow_generated_names() {
        let schema = include_str!("../../migrations/0001_init.sql");
        let mut generated = Vec::new();
        let mut named = Vec::new();
        let mut table = String::new();

        for line in schema.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("CREATE TABLE ") {
                table = rest.split_whitespace().next().unwrap_or_default().to_string();
            } else if let Some(rest) = line.strip_prefix("CONSTRAINT ") {
                named.push(rest.split_whitespace().next().unwrap_or_default().to_string());
            } else if line.contains(" CHECK (") && !table.is_empty() {
                let column = line.split_whitespace().next().unwrap_or_default();
                generated.push(format!("{}_{}_check", table, column));
            }
        }

        assert!(generated.contains(&"payments_amount_check".to_string()));
        for name in &named {
            assert!(!generated.contains(name), "constraint {} collides with a generated name", name);
        }
    }
}

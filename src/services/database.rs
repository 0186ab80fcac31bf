use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Pool, Postgres};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::StoreResult;

/// Schema for the `files` table and its filename index.
const FILES_SCHEMA: &str = include_str!("files_schema.sql");

/// Splits the embedded schema into individual statements, dropping
/// comment-only fragments. Postgres refuses several statements in one
/// prepared query.
fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Database connection wrapper for PostgreSQL
///
/// Owns the connection pool shared by every request. Cloning is cheap and
/// all clones refer to the same pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    /// Connect to PostgreSQL and make sure the schema exists.
    ///
    /// # Parameters
    /// - `config`: connection URL and pool size
    ///
    /// # Returns
    /// - `Ok(Database)`: pool is connected and the `files` table exists
    /// - `Err(StoreError)`: connection or schema creation failed
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let opts = PgConnectOptions::from_str(&config.url)?.application_name("filedrop");

        info!(
            host = opts.get_host(),
            port = opts.get_port(),
            database = opts.get_database().unwrap_or("<default>"),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(opts)
            .await?;

        let database = Self { pool };
        if let Err(e) = database.ensure_schema().await {
            database.close().await;
            return Err(e);
        }

        info!("PostgreSQL connection established successfully");
        Ok(database)
    }

    /// Idempotently creates the `files` table and its index.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in schema_statements(FILES_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Waits for checked-out connections to return, then closes them along
    /// with the statements cached on each. Safe to call more than once.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            info!("PostgreSQL pool closed");
        }
    }
}

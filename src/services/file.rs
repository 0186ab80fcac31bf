use async_trait::async_trait;
use sqlx::Executor;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::file::{NewFile, StoredFile};
use crate::services::database::Database;

/// Identifier assigned to a row of the `files` table.
pub type FileId = i32;

const INSERT_FILE_SQL: &str = r#"
    INSERT INTO files (filename, mime_type, size, content)
    VALUES ($1, $2, $3, $4)
    RETURNING id
"#;

/// Write side of file persistence.
///
/// Implementations hold no per-request state; one instance is shared by all
/// concurrent requests.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Writes one file in a single statement and returns its new id.
    async fn insert(&self, file: &NewFile) -> StoreResult<FileId>;

    /// Releases the underlying resources. Inserts fail with
    /// [`StoreError::Closed`] afterwards.
    async fn close(&self);
}

/// PostgreSQL-backed file store.
#[derive(Clone)]
pub struct PostgresFileStore {
    db: Database,
}

impl PostgresFileStore {
    /// Connects, ensures the schema and prepares the insert statement.
    /// Any failure here means the server must not start.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let db = Database::connect(config).await?;
        let store = Self { db };
        if let Err(e) = store.prepare().await {
            store.db.close().await;
            return Err(e);
        }
        Ok(store)
    }

    /// Prepares the insert on one pooled connection so a broken statement
    /// surfaces at startup. The driver caches it per connection from here on.
    async fn prepare(&self) -> StoreResult<()> {
        let mut conn = self.db.pool().acquire().await?;
        (&mut *conn).prepare(INSERT_FILE_SQL).await?;
        info!("Insert statement prepared");
        Ok(())
    }

    pub async fn get(&self, id: FileId) -> StoreResult<Option<StoredFile>> {
        let file = sqlx::query_as::<_, StoredFile>(
            "SELECT id, filename, mime_type, size, content, created_at FROM files WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(file)
    }

    pub async fn count(&self) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM files")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl FileStore for PostgresFileStore {
    async fn insert(&self, file: &NewFile) -> StoreResult<FileId> {
        if self.db.is_closed() {
            return Err(StoreError::Closed);
        }

        let id = sqlx::query_scalar::<_, FileId>(INSERT_FILE_SQL)
            .bind(&file.filename)
            .bind(&file.mime_type)
            .bind(file.size())
            .bind(&file.content)
            .persistent(true)
            .fetch_one(self.db.pool())
            .await?;

        debug!(id, filename = %file.filename, size = file.size(), "File row inserted");
        Ok(id)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

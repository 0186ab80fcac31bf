#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use tokio::sync::Mutex;

use filedrop::{
    config::AppConfig,
    create_router,
    error::{StoreError, StoreResult},
    models::file::NewFile,
    services::file::{FileId, FileStore},
    AppState,
};

pub const SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "filedrop-test-boundary";

/// Row as recorded by [`MemoryFileStore`].
#[derive(Debug, Clone)]
pub struct RecordedFile {
    pub id: FileId,
    pub file: NewFile,
}

/// In-process stand-in for the Postgres store.
#[derive(Default)]
pub struct MemoryFileStore {
    rows: Mutex<Vec<RecordedFile>>,
    next_id: AtomicI32,
    closed: AtomicBool,
}

impl MemoryFileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn rows(&self) -> Vec<RecordedFile> {
        self.rows.lock().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.rows.lock().await.len()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn insert(&self, file: &NewFile) -> StoreResult<FileId> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().await.push(RecordedFile {
            id,
            file: file.clone(),
        });
        Ok(id)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Store whose every insert fails the way a lost connection would.
pub struct FailingFileStore;

#[async_trait]
impl FileStore for FailingFileStore {
    async fn insert(&self, _file: &NewFile) -> StoreResult<FileId> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn close(&self) {}
}

/// Store that panics on its first insert and behaves like
/// [`MemoryFileStore`] afterwards.
#[derive(Default)]
pub struct PanicOnceFileStore {
    panicked: AtomicBool,
    inner: MemoryFileStore,
}

impl PanicOnceFileStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn count(&self) -> usize {
        self.inner.count().await
    }
}

#[async_trait]
impl FileStore for PanicOnceFileStore {
    async fn insert(&self, file: &NewFile) -> StoreResult<FileId> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            let empty: Vec<u8> = Vec::new();
            let _ = empty[file.content.len()];
        }
        self.inner.insert(file).await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.secret = SECRET.to_string();
    config
}

pub fn setup_router(store: Arc<dyn FileStore>) -> Router {
    setup_router_with_config(store, test_config())
}

pub fn setup_router_with_config(store: Arc<dyn FileStore>, config: AppConfig) -> Router {
    create_router(AppState::new(store, Arc::new(config)))
}

/// Builds a `multipart/form-data` body by hand.
#[derive(Default)]
pub struct MultipartBuilder {
    body: Vec<u8>,
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(
        mut self,
        name: &str,
        filename: &str,
        content_type: Option<&str>,
        content: &[u8],
    ) -> Self {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        if let Some(content_type) = content_type {
            self.body
                .extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        self.body.extend_from_slice(b"\r\n");
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

pub fn upload_request(method: Method, body: Vec<u8>, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/add")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn hello_upload() -> Vec<u8> {
    MultipartBuilder::new()
        .file("file", "a.txt", Some("text/plain"), b"hello")
        .build()
}

//! Remote document and blob stores the session container talks to.
//!
//! Both are trait objects so the process can run against Postgres + S3 or
//! against the in-memory pair without the container knowing which.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::config::{AppConfig, BackendKind};

pub mod memory;
pub mod postgres;
pub mod s3;

pub use memory::{InMemoryBlobStore, InMemoryDocumentStore};
pub use postgres::PgDocumentStore;
pub use s3::S3BlobStore;

/// Schema-less field set of a stored document.
pub type Fields = Map<String, Value>;

/// A document as returned by the store, with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Handle to an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobRef {
    pub path: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents of `collection` whose `field` equals `value`, in
    /// store-defined order.
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> anyhow::Result<Vec<Document>>;

    /// Insert a new document and return its id.
    async fn insert(&self, collection: &str, fields: Fields) -> anyhow::Result<String>;

    /// Shallow-merge `patch` into an existing document.
    async fn update(&self, collection: &str, id: &str, patch: Fields) -> anyhow::Result<()>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, path: &str, body: Bytes, content_type: &str)
        -> anyhow::Result<BlobRef>;
    async fn public_url(&self, blob: &BlobRef) -> anyhow::Result<String>;
}

/// Process-wide backend handle, built once at start and injected.
#[derive(Clone)]
pub struct Backend {
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backend {
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { documents, blobs }
    }

    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        match config.backend {
            BackendKind::Memory => {
                tracing::warn!("using in-memory backend; data is lost on exit");
                Ok(Self::in_memory())
            }
            BackendKind::Remote => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL not configured")?;
                let storage = config
                    .storage
                    .as_ref()
                    .context("object storage not configured")?;

                let documents = PgDocumentStore::connect(url).await?;
                documents.migrate().await?;
                let blobs = S3BlobStore::new(storage).await?;

                Ok(Self::new(Arc::new(documents), Arc::new(blobs)))
            }
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::default()),
            Arc::new(InMemoryBlobStore::default()),
        )
    }
}

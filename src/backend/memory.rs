use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BlobRef, BlobStore, Document, DocumentStore, Fields};

/// Insertion-ordered in-process document store.
///
/// Counts every call that reaches it and can be told to fail reads or
/// writes, which is what the container tests lean on.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    rows: RwLock<Vec<(String, Document)>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    queries: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
}

impl InMemoryDocumentStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn query_calls(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.rows
            .read()
            .await
            .iter()
            .filter(|(c, _)| c == collection)
            .count()
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        self.rows
            .read()
            .await
            .iter()
            .find(|(c, d)| c == collection && d.id == id)
            .map(|(_, d)| d.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> anyhow::Result<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("document store unavailable");
        }
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|(c, d)| c == collection && d.fields.get(field) == Some(value))
            .map(|(_, d)| d.clone())
            .collect())
    }

    async fn insert(&self, collection: &str, fields: Fields) -> anyhow::Result<String> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("document store unavailable");
        }
        let id = Uuid::new_v4().simple().to_string();
        self.rows.write().await.push((
            collection.to_string(),
            Document {
                id: id.clone(),
                fields,
            },
        ));
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> anyhow::Result<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("document store unavailable");
        }
        let mut rows = self.rows.write().await;
        let (_, doc) = rows
            .iter_mut()
            .find(|(c, d)| c == collection && d.id == id)
            .ok_or_else(|| anyhow::anyhow!("document {collection}/{id} not found"))?;
        doc.fields.extend(patch);
        Ok(())
    }
}

/// In-process blob store; URLs point at a fake host.
pub struct InMemoryBlobStore {
    base_url: String,
    objects: RwLock<Vec<(String, Bytes, String)>>,
    fail_uploads: AtomicBool,
    fail_urls: AtomicBool,
    uploads: AtomicUsize,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::with_base_url("https://blobs.local")
    }
}

impl InMemoryBlobStore {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(Vec::new()),
            fail_uploads: AtomicBool::new(false),
            fail_urls: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
        }
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_urls(&self, fail: bool) {
        self.fail_urls.store(fail, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub async fn paths(&self) -> Vec<String> {
        self.objects
            .read()
            .await
            .iter()
            .map(|(p, _, _)| p.clone())
            .collect()
    }

    pub async fn object(&self, path: &str) -> Option<(Bytes, String)> {
        self.objects
            .read()
            .await
            .iter()
            .find(|(p, _, _)| p == path)
            .map(|(_, b, ct)| (b.clone(), ct.clone()))
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(
        &self,
        path: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<BlobRef> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            anyhow::bail!("blob store unavailable");
        }
        let mut objects = self.objects.write().await;
        objects.retain(|(p, _, _)| p != path);
        objects.push((path.to_string(), body, content_type.to_string()));
        Ok(BlobRef {
            path: path.to_string(),
        })
    }

    async fn public_url(&self, blob: &BlobRef) -> anyhow::Result<String> {
        if self.fail_urls.load(Ordering::SeqCst) {
            anyhow::bail!("url resolution failed");
        }
        Ok(format!("{}/{}", self.base_url, blob.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Fields {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn find_matches_exact_value_only() {
        let store = InMemoryDocumentStore::default();
        store
            .insert("users", fields(json!({"email": "a@x.com"})))
            .await
            .unwrap();
        store
            .insert("users", fields(json!({"email": "A@x.com"})))
            .await
            .unwrap();
        store
            .insert("other", fields(json!({"email": "a@x.com"})))
            .await
            .unwrap();

        let hits = store
            .find_by_field("users", "email", &json!("a@x.com"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(store.count("users").await, 2);
    }

    #[tokio::test]
    async fn update_merges_and_rejects_unknown_ids() {
        let store = InMemoryDocumentStore::default();
        let id = store
            .insert("users", fields(json!({"name": "Ana", "age": 22})))
            .await
            .unwrap();
        store
            .update("users", &id, fields(json!({"age": 23})))
            .await
            .unwrap();

        let doc = store.get("users", &id).await.unwrap();
        assert_eq!(doc.fields["name"], json!("Ana"));
        assert_eq!(doc.fields["age"], json!(23));

        assert!(store
            .update("users", "missing", fields(json!({"age": 1})))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn injected_failures_still_count_calls() {
        let store = InMemoryDocumentStore::default();
        store.fail_writes(true);
        assert!(store.insert("users", Fields::new()).await.is_err());
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.count("users").await, 0);
    }

    #[tokio::test]
    async fn blob_upload_then_url() {
        let blobs = InMemoryBlobStore::with_base_url("https://cdn.test");
        let r = blobs
            .upload("profile_images/u_1.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        let url = blobs.public_url(&r).await.unwrap();
        assert_eq!(url, "https://cdn.test/profile_images/u_1.png");
        let (body, ct) = blobs.object("profile_images/u_1.png").await.unwrap();
        assert_eq!(&body[..], b"png");
        assert_eq!(ct, "image/png");
    }
}

use anyhow::Context;
use async_trait::async_trait;
use aws_config::{defaults, BehaviorVersion};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use super::{BlobRef, BlobStore};
use crate::config::StorageConfig;

/// Blob store on S3 or MinIO.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    /// Prefix of every stored object URL, without trailing slash.
    url_base: String,
}

impl S3BlobStore {
    pub async fn new(cfg: &StorageConfig) -> anyhow::Result<Self> {
        let shared = defaults(BehaviorVersion::latest())
            .region(Region::new(cfg.region.clone()))
            .credentials_provider(Credentials::new(
                &cfg.access_key,
                &cfg.secret_key,
                None,
                None,
                "static",
            ))
            .endpoint_url(&cfg.endpoint)
            .load()
            .await;

        let conf = S3ConfigBuilder::from(&shared)
            .endpoint_url(&cfg.endpoint)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(conf),
            bucket: cfg.bucket.clone(),
            url_base: object_url_base(cfg),
        })
    }
}

/// Base for object URLs: the public base when configured, otherwise the
/// path-style `{endpoint}/{bucket}` the client itself writes to. Neither
/// expires, since the URL is stored on the profile.
fn object_url_base(cfg: &StorageConfig) -> String {
    match &cfg.public_base_url {
        Some(base) => base.trim_end_matches('/').to_string(),
        None => format!(
            "{}/{}",
            cfg.endpoint.trim_end_matches('/'),
            cfg.bucket.trim_matches('/')
        ),
    }
}

fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        path: &str,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<BlobRef> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .context("s3 put_object")?;
        Ok(BlobRef {
            path: path.to_string(),
        })
    }

    async fn public_url(&self, blob: &BlobRef) -> anyhow::Result<String> {
        Ok(join_public_url(&self.url_base, &blob.path))
    }
}

use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use serde::Deserialize;

/// Which backend pair the process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Remote,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// When set, objects are addressed as `{public_base_url}/{key}`;
    /// otherwise as `{endpoint}/{bucket}/{key}`.
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub users_collection: String,
    pub image_prefix: String,
    pub splash_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            users_collection: "users".into(),
            image_prefix: "profile_images".into(),
            splash_delay: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub storage: Option<StorageConfig>,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().with_context(|| format!("APP_PORT={v}"))?,
            Err(_) => 8080,
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        let backend = match std::env::var("BACKEND") {
            Ok(v) => match v.to_ascii_lowercase().as_str() {
                "remote" => BackendKind::Remote,
                "memory" => BackendKind::Memory,
                other => anyhow::bail!("unknown BACKEND value: {other}"),
            },
            Err(_) if database_url.is_some() => BackendKind::Remote,
            Err(_) => BackendKind::Memory,
        };

        let storage = match std::env::var("MINIO_ENDPOINT") {
            Ok(endpoint) => Some(StorageConfig {
                endpoint,
                bucket: std::env::var("MINIO_BUCKET").context("MINIO_BUCKET")?,
                access_key: std::env::var("MINIO_ACCESS_KEY").context("MINIO_ACCESS_KEY")?,
                secret_key: std::env::var("MINIO_SECRET_KEY").context("MINIO_SECRET_KEY")?,
                region: std::env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".into()),
                public_base_url: std::env::var("PUBLIC_BASE_URL").ok(),
            }),
            Err(_) => None,
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            users_collection: std::env::var("USERS_COLLECTION")
                .unwrap_or(defaults.users_collection),
            image_prefix: std::env::var("IMAGE_PREFIX").unwrap_or(defaults.image_prefix),
            splash_delay: std::env::var("SPLASH_DELAY_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.splash_delay),
        };

        if backend == BackendKind::Remote {
            anyhow::ensure!(database_url.is_some(), "BACKEND=remote requires DATABASE_URL");
            anyhow::ensure!(storage.is_some(), "BACKEND=remote requires MINIO_ENDPOINT");
        }

        Ok(Self {
            host,
            port,
            backend,
            database_url,
            storage,
            session,
        })
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    /// Config for an in-process run with the given splash delay.
    pub fn in_memory(splash_delay: Duration) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            backend: BackendKind::Memory,
            database_url: None,
            storage: None,
            session: SessionConfig {
                splash_delay,
                ..SessionConfig::default()
            },
        }
    }
}

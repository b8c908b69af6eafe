use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::client::{ClientOptions, Protocol};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub chunk_size: usize,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub protocol: Protocol,
    pub base_url: String,
    pub upload_path: Option<String>,
    pub list_path: Option<String>,
    pub lookup_path: Option<String>,
    pub download_path: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Resolve the protocol preset and apply any per-path overrides.
    ///
    /// An override set to the empty string disables that endpoint, which is
    /// how a listing or lookup path is removed from a preset that has one.
    pub fn options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::preset(self.protocol, &self.base_url)
            .with_context(|| format!("invalid base URL: {}", self.base_url))?;

        if let Some(path) = &self.upload_path {
            options.upload_path = path.clone();
        }
        if let Some(path) = &self.list_path {
            options.list_path = non_empty(path);
        }
        if let Some(path) = &self.lookup_path {
            options.lookup_path = non_empty(path);
        }
        if let Some(path) = &self.download_path {
            options.download_path = path.clone();
        }
        options.timeout_secs = self.timeout_secs;

        Ok(options)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8080,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            store: StoreConfig {
                data_dir: PathBuf::from("./data"),
                chunk_size: 1024 * 1024,
                max_upload_bytes: 100 * 1024 * 1024,
            },
            client: ClientConfig {
                protocol: Protocol::Hash,
                base_url: "http://127.0.0.1:8080".to_string(),
                upload_path: None,
                list_path: None,
                lookup_path: None,
                download_path: None,
                timeout_secs: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            server: ServerConfig {
                port: env::var("DSTORE_PORT")
                    .unwrap_or_else(|_| defaults.server.port.to_string())
                    .parse()
                    .context("DSTORE_PORT must be a port number")?,
                host: env::var("DSTORE_HOST").unwrap_or(defaults.server.host),
                cors_allowed_origins: env::var("DSTORE_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            store: StoreConfig {
                data_dir: env::var("DSTORE_DATA_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.store.data_dir),
                chunk_size: env::var("DSTORE_CHUNK_SIZE")
                    .unwrap_or_else(|_| defaults.store.chunk_size.to_string())
                    .parse()
                    .context("DSTORE_CHUNK_SIZE must be a byte count")?,
                max_upload_bytes: env::var("DSTORE_MAX_UPLOAD_BYTES")
                    .unwrap_or_else(|_| defaults.store.max_upload_bytes.to_string())
                    .parse()
                    .context("DSTORE_MAX_UPLOAD_BYTES must be a byte count")?,
            },
            client: ClientConfig {
                protocol: env::var("DSTORE_PROTOCOL")
                    .unwrap_or_else(|_| "hash".to_string())
                    .parse()?,
                base_url: env::var("DSTORE_BASE_URL").unwrap_or(defaults.client.base_url),
                upload_path: env::var("DSTORE_UPLOAD_PATH").ok(),
                list_path: env::var("DSTORE_LIST_PATH").ok(),
                lookup_path: env::var("DSTORE_LOOKUP_PATH").ok(),
                download_path: env::var("DSTORE_DOWNLOAD_PATH").ok(),
                timeout_secs: env::var("DSTORE_TIMEOUT_SECS")
                    .ok()
                    .map(|s| s.parse())
                    .transpose()
                    .context("DSTORE_TIMEOUT_SECS must be a number of seconds")?,
            },
        })
    }
}

fn non_empty(path: &str) -> Option<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_preset_paths() {
        let mut config = Config::default().client;
        config.protocol = Protocol::Hash;
        config.lookup_path = Some("/api/search".to_string());
        config.list_path = Some("".to_string());

        let options = config.options().unwrap();
        assert_eq!(options.upload_path, "/api/upload");
        assert_eq!(options.lookup_path.as_deref(), Some("/api/search"));
        assert_eq!(options.list_path, None);
    }

    #[test]
    fn test_cid_preset_without_overrides() {
        let mut config = Config::default().client;
        config.protocol = Protocol::Cid;
        config.base_url = "http://localhost:5000".to_string();

        let options = config.options().unwrap();
        assert_eq!(options.base_url.as_str(), "http://localhost:5000/");
        assert_eq!(options.upload_path, "/upload");
        assert_eq!(options.download_path, "/download");
        assert!(options.list_path.is_none());
        assert!(options.lookup_path.is_none());
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let mut config = Config::default().client;
        config.base_url = "not a url".to_string();
        assert!(config.options().is_err());
    }
}

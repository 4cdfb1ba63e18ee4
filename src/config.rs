//! Configuration for campus-lostfound
//!
//! Built once at startup and handed to the server and services.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::LostFoundError;

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("campus-lostfound")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the SQLite database and config file
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Origin allowed to call the API from a browser
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Maximum image references accepted per reported item
    #[serde(default = "default_max_images")]
    pub max_images_per_item: usize,

    /// Page size used when a listing request omits `limit`
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Upper bound for `limit` on listing requests
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Header names carrying the caller identity
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// Header names injected by the fronting gateway after it authenticates a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_user_id_header")]
    pub user_id_header: String,

    #[serde(default = "default_role_header")]
    pub role_header: String,

    #[serde(default = "default_name_header")]
    pub name_header: String,

    #[serde(default = "default_email_header")]
    pub email_header: String,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    4000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_max_images() -> usize {
    5
}

fn default_page_size() -> u32 {
    100
}

fn default_max_page_size() -> u32 {
    500
}

fn default_user_id_header() -> String {
    "x-user-id".to_string()
}

fn default_role_header() -> String {
    "x-user-role".to_string()
}

fn default_name_header() -> String {
    "x-user-name".to_string()
}

fn default_email_header() -> String {
    "x-user-email".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user_id_header: default_user_id_header(),
            role_header: default_role_header(),
            name_header: default_name_header(),
            email_header: default_email_header(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            cors_origin: default_cors_origin(),
            max_images_per_item: default_max_images(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            identity: IdentityConfig::default(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LostFoundError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| LostFoundError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LostFoundError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| LostFoundError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), LostFoundError> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(LostFoundError::Config("page sizes must be positive".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(LostFoundError::Config(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        self.bind_addr()?;
        Ok(())
    }

    /// Socket address for the HTTP listener
    pub fn bind_addr(&self) -> Result<SocketAddr, LostFoundError> {
        format!("{}:{}", self.bind_address, self.http_port)
            .parse()
            .map_err(|e| {
                LostFoundError::Config(format!(
                    "invalid bind address {}:{}: {}",
                    self.bind_address, self.http_port, e
                ))
            })
    }

    /// Get SQLite database path
    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join("lostfound.db")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}

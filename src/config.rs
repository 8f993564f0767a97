//! Config module - Manages Feenox sync configuration (feenox.toml).
//!
//! Configuration file contains:
//! - Credentials, session cache, database and resource locations
//! - Remote endpoint URLs
//! - Document types to download on each run

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default credentials file name looked up inside a credentials directory.
pub const CREDENTIALS_FILE_NAME: &str = "feenox.json";

/// Remote endpoint URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Identity endpoint (client credentials exchange)
    #[serde(default = "default_login_url")]
    pub login: String,
    /// Toll group listing
    #[serde(default = "default_toll_groups_url")]
    pub toll_groups: String,
    /// Invoice toll search (genre D)
    #[serde(default = "default_invoice_tolls_url")]
    pub invoice_tolls: String,
    /// Daily toll search (genre P)
    #[serde(default = "default_daily_tolls_url")]
    pub daily_tolls: String,
    /// Document search, type and category are appended to the path
    #[serde(default = "default_documents_url")]
    pub documents: String,
    /// Document download, id is appended to the path
    #[serde(default = "default_download_document_url")]
    pub download_document: String,
}

fn default_login_url() -> String {
    "https://lumesia.onelogin.com/oidc/2/token".to_string()
}

fn default_toll_groups_url() -> String {
    "https://my.lumesia.com/fai/api/api/public/ext/getTollGroups".to_string()
}

fn default_invoice_tolls_url() -> String {
    "https://my.lumesia.com/fai/api/api/public/ext/searchTolls".to_string()
}

fn default_daily_tolls_url() -> String {
    "https://my.lumesia.com/fai/api/api/public/ext/searchDailyTolls".to_string()
}

fn default_documents_url() -> String {
    "https://my.lumesia.com/fai/api/api/public/ext/findDocuments".to_string()
}

fn default_download_document_url() -> String {
    "https://my.lumesia.com/fai/api/api/public/ext/downloadDocumentByUuid".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: default_login_url(),
            toll_groups: default_toll_groups_url(),
            invoice_tolls: default_invoice_tolls_url(),
            daily_tolls: default_daily_tolls_url(),
            documents: default_documents_url(),
            download_document: default_download_document_url(),
        }
    }
}

/// A document type (and optional category) downloaded on every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSelector {
    #[serde(rename = "type")]
    pub document_type: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl DocumentSelector {
    pub fn new(document_type: &str) -> Self {
        Self {
            document_type: document_type.to_string(),
            category: None,
        }
    }
}

fn default_documents() -> Vec<DocumentSelector> {
    [
        "FATTURA",
        "ALLEGATO_FATTURA",
        "ALLEGATO_FATTURA_CSV",
        "ALLEGATO_FATTURA_TXT",
    ]
    .into_iter()
    .map(DocumentSelector::new)
    .collect()
}

fn default_save_changes() -> bool {
    true
}

fn default_http_timeout_secs() -> u64 {
    60
}

/// Main Feenox configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Credentials JSON file, or a directory containing `feenox.json`
    #[serde(default = "default_config_dir")]
    pub credentials_path: PathBuf,

    /// Session cache artifact
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory where downloaded documents are written
    #[serde(default = "default_resource_dir")]
    pub resource_dir: PathBuf,

    /// Log directory (stderr when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Commit each sync step (false = dry run, every step rolls back)
    #[serde(default = "default_save_changes")]
    pub save_changes: bool,

    /// Timeout for each HTTP request
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Remote endpoints
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Document types synced by a full run
    #[serde(default = "default_documents")]
    pub documents: Vec<DocumentSelector>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials_path: default_config_dir(),
            cache_path: default_cache_path(),
            database_path: default_database_path(),
            resource_dir: default_resource_dir(),
            log_dir: None,
            save_changes: default_save_changes(),
            http_timeout_secs: default_http_timeout_secs(),
            endpoints: Endpoints::default(),
            documents: default_documents(),
        }
    }
}

/// Get default data directory (~/.local/share/feenox/).
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("feenox"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default config directory (~/.config/feenox/).
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("feenox"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get default config file path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("feenox.toml")
}

fn default_cache_path() -> PathBuf {
    default_data_dir().join(".cache")
}

fn default_database_path() -> PathBuf {
    default_data_dir().join("feenox.db")
}

fn default_resource_dir() -> PathBuf {
    default_data_dir().join("res")
}

impl Config {
    /// Load config from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Cannot parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from the given path, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Cannot serialize config to TOML")?;

        std::fs::write(path, content)
            .with_context(|| format!("Cannot write config file: {}", path.display()))?;

        // Restrict file permissions on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Log file path, when logging to a directory.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| dir.join("feenox.log"))
    }
}

/// Client credentials for the identity endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .finish()
    }
}

impl Credentials {
    /// Resolve a credentials source: a directory means `<dir>/feenox.json`.
    pub fn resolve_path(source: &Path) -> PathBuf {
        if source.is_dir() {
            source.join(CREDENTIALS_FILE_NAME)
        } else {
            source.to_path_buf()
        }
    }

    /// Load credentials from a file or a directory containing `feenox.json`.
    pub fn load(source: &Path) -> Result<Self> {
        let path = Self::resolve_path(source);
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read credentials file: {}", path.display()))?;
        let credentials: Credentials = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse credentials file: {}", path.display()))?;
        Ok(credentials)
    }
}

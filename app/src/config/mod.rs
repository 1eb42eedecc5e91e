use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::error::{Result, StoreError};

const APP_KEYWORD: &str = "social-via-email";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gmail API root for the signed-in user
    pub api_base_url: String,

    /// OAuth userinfo endpoint used to identify the signed-in person
    pub userinfo_url: String,

    /// Per-request timeout for the messaging API
    pub request_timeout_secs: u64,

    /// Label holding the app's documents
    pub data_folder: String,

    /// Label reserved for incoming app messages
    pub inbox_folder: String,

    /// Subject of the document holding the persisted app state
    pub repository_subject: String,

    /// JSON file used to seed the app state when the mailbox has none
    pub seed_file: Option<PathBuf>,

    pub oauth: OAuthConfig,
}

/// Implicit-grant OAuth settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthConfig {
    pub client_id: Option<String>,
    pub auth_url: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://gmail.googleapis.com/gmail/v1/users/me".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            request_timeout_secs: 30,
            data_folder: APP_KEYWORD.to_string(),
            inbox_folder: format!("{}-inbox", APP_KEYWORD),
            repository_subject: "repository-of-app-state".to_string(),
            seed_file: None,
            oauth: OAuthConfig::default(),
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            redirect_uri: "http://localhost:3000/loading".to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
                "https://www.googleapis.com/auth/gmail.modify".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Reject settings the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.data_folder.trim().is_empty() {
            return Err(StoreError::Config("data_folder must not be empty".to_string()));
        }
        if self.inbox_folder.trim().is_empty() {
            return Err(StoreError::Config("inbox_folder must not be empty".to_string()));
        }
        if self.repository_subject.trim().is_empty() {
            return Err(StoreError::Config(
                "repository_subject must not be empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(StoreError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // XDG config path
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_KEYWORD).join("config.toml"));
    }

    // Home directory fallback
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".config").join(APP_KEYWORD).join("config.toml"));
        paths.push(home_dir.join(format!(".{}.rc", APP_KEYWORD)));
    }

    paths
}

/// Load configuration from `explicit`, else the first default path that
/// exists, else defaults
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from_path(path);
    }

    for path in default_config_paths() {
        if path.exists() {
            info!("Found config at: {:?}", path);
            return load_config_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<AppConfig> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| StoreError::Config(format!("Failed to read config: {}", e)))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| StoreError::Config(format!("Failed to parse config: {}", e)))?;

    config.validate()?;
    Ok(config)
}

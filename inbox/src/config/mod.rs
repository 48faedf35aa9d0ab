use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use tracing::info;

use crate::types::error::InboxError;

/// Global configuration instance
static CONFIG: OnceCell<RwLock<InboxConfig>> = OnceCell::new();

/// Inbox configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxConfig {
    /// Base URL of the message API (`{api_url}messages/...`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Messages per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Idle window before pending edits are flushed
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Scroll target (pixels from the top) when changing page
    #[serde(default)]
    pub scroll_top_offset: u32,

    /// Delay between the scroll request and the page swap
    #[serde(default = "default_page_transition_ms")]
    pub page_transition_ms: u64,

    /// Timeout for each API request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Session cookie sent with every API request (e.g. `token=...`)
    pub auth_cookie: Option<String>,
}

fn default_api_url() -> String {
    "http://localhost:3000/api/".to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_debounce_ms() -> u64 {
    2000
}

fn default_page_transition_ms() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
            scroll_top_offset: 0,
            page_transition_ms: default_page_transition_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            auth_cookie: None,
        }
    }
}

impl InboxConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn page_transition(&self) -> Duration {
        Duration::from_millis(self.page_transition_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Reject values the inbox cannot work with
    pub fn validate(&self) -> Result<(), InboxError> {
        if self.page_size == 0 {
            return Err(InboxError::Config("page_size must be at least 1".into()));
        }
        if self.api_url.trim().is_empty() {
            return Err(InboxError::Config("api_url must not be empty".into()));
        }
        url::Url::parse(&self.api_url)?;
        Ok(())
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("portfolio-inbox").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("portfolio-inbox")
                .join("config.toml"),
        );
        paths.push(home_dir.join(".portfolio-inbox.rc"));
    }

    paths
}

/// Parse and validate a TOML configuration
pub fn load_config_from_str(content: &str) -> Result<InboxConfig, InboxError> {
    let config: InboxConfig = toml::from_str(content)
        .map_err(|e| InboxError::Config(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// Initialize configuration from default paths
pub fn init_config() -> Result<InboxConfig, InboxError> {
    info!("Initializing configuration from default paths");

    for path in default_config_paths() {
        if path.exists() {
            info!("Found config at: {:?}", path);
            return init_config_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    set_config(InboxConfig::default())
}

/// Initialize configuration from a specific path
pub fn init_config_from_path(path: &Path) -> Result<InboxConfig, InboxError> {
    info!("Loading configuration from: {:?}", path);

    let content = fs::read_to_string(path)
        .map_err(|e| InboxError::Config(format!("Failed to read config: {}", e)))?;

    set_config(load_config_from_str(&content)?)
}

/// Set the global configuration
fn set_config(config: InboxConfig) -> Result<InboxConfig, InboxError> {
    match CONFIG.get() {
        Some(lock) => {
            let mut guard = lock
                .write()
                .map_err(|e| InboxError::Config(format!("Failed to lock config: {}", e)))?;
            *guard = config.clone();
        }
        None => {
            CONFIG.set(RwLock::new(config.clone())).ok();
        }
    }
    Ok(config)
}

/// Current global configuration, or defaults when never initialized
pub fn get_config() -> InboxConfig {
    CONFIG
        .get()
        .and_then(|lock| lock.read().ok().map(|c| c.clone()))
        .unwrap_or_default()
}

/// Check if configuration is initialized
pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

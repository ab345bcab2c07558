//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or an explicit path), then applies `DEMOAPP_DATA_DIR`,
//! `DEMOAPP_LOG_LEVEL` and `DEMOAPP_BIND` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::dashboard::EndpointDescriptor;
use crate::error::AppError;
use crate::logger;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    pub bind: String,
    /// Upper bound for a request body read (login only).
    pub max_body_bytes: usize,
}

/// Flat-file locations (already expanded, no `~`).
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub items_path: PathBuf,
    pub credentials_path: PathBuf,
}

/// Dashboard client configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Scheme + authority every descriptor path is appended to.
    pub base_url: String,
    /// Per-call timeout for outbound requests.
    pub timeout_seconds: u64,
    /// Ordered descriptor list; order is display order.
    pub endpoints: Vec<EndpointDescriptor>,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub server: ServerConfig,
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
}

/// Values that take precedence over the TOML file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<String>,
    pub log_level: Option<String>,
    pub bind: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("DEMOAPP_DATA_DIR").ok(),
            log_level: env::var("DEMOAPP_LOG_LEVEL").ok(),
            bind: env::var("DEMOAPP_BIND").ok(),
        }
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize)]
struct RawConfig {
    app: RawApp,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    data: RawData,
    #[serde(default)]
    dashboard: RawDashboard,
}

#[derive(Deserialize)]
struct RawApp {
    log_level: String,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_max_body_bytes")]
    max_body_bytes: usize,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

#[derive(Deserialize)]
struct RawData {
    #[serde(default = "default_data_dir")]
    dir: String,
    #[serde(default = "default_items_file")]
    items_file: String,
    #[serde(default = "default_credentials_file")]
    credentials_file: String,
}

impl Default for RawData {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            items_file: default_items_file(),
            credentials_file: default_credentials_file(),
        }
    }
}

#[derive(Deserialize)]
struct RawDashboard {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
    /// `[[dashboard.endpoints]]` — falls back to the built-in five.
    #[serde(default)]
    endpoints: Option<Vec<EndpointDescriptor>>,
}

impl Default for RawDashboard {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            endpoints: None,
        }
    }
}

fn default_bind() -> String { "127.0.0.1:3000".to_string() }
fn default_max_body_bytes() -> usize { 64 * 1024 }
fn default_data_dir() -> String { "data".to_string() }
fn default_items_file() -> String { "items.json".to_string() }
fn default_credentials_file() -> String { "credentials.json".to_string() }
fn default_base_url() -> String { "http://127.0.0.1:3000".to_string() }
fn default_timeout_seconds() -> u64 { 10 }

/// The dashboard's built-in descriptor list, in display order.
pub fn default_endpoints() -> Vec<EndpointDescriptor> {
    [
        ("Root", "/api"),
        ("Hello", "/api/hello"),
        ("Data", "/api/data"),
        ("Compute", "/api/compute"),
        ("Items", "/api/items"),
    ]
    .into_iter()
    .map(|(label, path)| EndpointDescriptor::new(label, path))
    .collect()
}

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Load config from `path` (or `config/default.toml`), then apply env-var
/// overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    load_from(path, &Overrides::from_env())
}

/// Internal loader — accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let log_level = overrides.log_level.clone().unwrap_or(parsed.app.log_level);
    logger::parse_level(&log_level)?;
    let bind = overrides.bind.clone().unwrap_or(parsed.server.bind);

    let dir_str = overrides.data_dir.as_deref().unwrap_or(&parsed.data.dir);
    let dir = expand_home(dir_str);
    let items_path = dir.join(&parsed.data.items_file);
    let credentials_path = dir.join(&parsed.data.credentials_file);

    let endpoints = parsed.dashboard.endpoints.unwrap_or_else(default_endpoints);
    validate_endpoints(&endpoints)?;

    Ok(Config {
        log_level,
        server: ServerConfig {
            bind,
            max_body_bytes: parsed.server.max_body_bytes,
        },
        data: DataConfig {
            dir,
            items_path,
            credentials_path,
        },
        dashboard: DashboardConfig {
            base_url: parsed.dashboard.base_url.trim_end_matches('/').to_string(),
            timeout_seconds: parsed.dashboard.timeout_seconds,
            endpoints,
        },
    })
}

fn validate_endpoints(endpoints: &[EndpointDescriptor]) -> Result<(), AppError> {
    if endpoints.is_empty() {
        return Err(AppError::Config("dashboard.endpoints must not be empty".into()));
    }
    if let Some(bad) = endpoints.iter().find(|e| !e.path.starts_with('/')) {
        return Err(AppError::Config(format!(
            "dashboard endpoint '{}' has path '{}' (must start with '/')",
            bad.label, bad.path
        )));
    }
    Ok(())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

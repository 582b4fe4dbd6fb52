//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$ELOG_CONFIG` (environment variable)
//! 2. `~/.config/elogsubmit/config.toml` (Linux)
//!    `%APPDATA%\elogsubmit\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Service settings may then be overridden by the environment variables the
//! logbook tooling has always used (`SUBMIT_URL`, `LOG_ENTRY_SCHEMA_URL`,
//! `ELOGCERT_FILE`, `DEFAULT_UNIX_QUEUE_PATH`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ElogError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where and how entries are delivered.
    pub service: ServiceConfig,
    /// Local fallback queue.
    pub queue: QueueConfig,
    /// Notification defaults.
    pub notify: NotifyConfig,
    /// General behavior settings.
    pub general: GeneralConfig,
}

/// Remote logbook service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Schema the entry XML is validated against.
    pub schema_url: String,
    /// Base URL entries are PUT to; the file name is appended.
    pub submit_url: String,
    /// PEM client certificate + key. A bare file name is looked up in the
    /// home directory.
    pub cert_file: String,
    /// Skip server certificate verification (self-signed servers).
    pub accept_invalid_certs: bool,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// If non-empty, only these logbooks pass validation.
    pub known_logbooks: Vec<String>,
}

/// Local fallback queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Directory queued entries are written to.
    pub queue_dir: PathBuf,
}

/// Notification defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Domain appended to bare usernames, e.g. `@example.org`.
    pub email_domain: String,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

// ── Default implementations ─────────────────────────────────────

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            schema_url: String::new(),
            submit_url: String::new(),
            cert_file: ".elogcert".to_string(),
            accept_invalid_certs: false,
            timeout_secs: 30,
            known_logbooks: Vec::new(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_dir: default_queue_dir(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

/// Platform default queue directory.
pub fn default_queue_dir() -> PathBuf {
    if cfg!(windows) {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("elog")
            .join("queue")
    } else {
        PathBuf::from("/var/spool/elog/queue")
    }
}

impl Config {
    /// Check that everything delivery needs is present.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("service.schema_url", self.service.schema_url.trim().is_empty()),
            ("service.submit_url", self.service.submit_url.trim().is_empty()),
            ("service.cert_file", self.service.cert_file.trim().is_empty()),
            ("queue.queue_dir", self.queue.queue_dir.as_os_str().is_empty()),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, empty)| *empty)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ElogError::Config(format!(
                "missing required setting(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    /// Resolve the client certificate path.
    pub fn cert_path(&self) -> Result<PathBuf> {
        resolve_cert_path(&self.service.cert_file, dirs::home_dir().as_deref())
    }

    /// Apply overrides from environment-style variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(v) = get("SUBMIT_URL") {
            self.service.submit_url = v;
        }
        if let Some(v) = get("LOG_ENTRY_SCHEMA_URL") {
            self.service.schema_url = v;
        }
        if let Some(v) = get("ELOGCERT_FILE") {
            self.service.cert_file = v;
        }
        if let Some(v) = get("DEFAULT_UNIX_QUEUE_PATH") {
            self.queue.queue_dir = PathBuf::from(v);
        }
    }
}

/// A cert file given without any directory part lives in `home`.
fn resolve_cert_path(cert_file: &str, home: Option<&Path>) -> Result<PathBuf> {
    let path = Path::new(cert_file);
    let simple = path
        .parent()
        .map_or(true, |parent| parent.as_os_str().is_empty());
    if !simple {
        return Ok(path.to_path_buf());
    }
    let home = home.ok_or_else(|| {
        ElogError::Config(format!(
            "cannot resolve certificate '{cert_file}': no home directory"
        ))
    })?;
    Ok(home.join(path))
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations, then apply
/// environment overrides.
///
/// A missing file yields the defaults; an unreadable or malformed file is
/// an error, since guessing would send entries to the wrong place.
pub fn load_config() -> Result<Config> {
    let mut config = match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path)?,
        _ => Config::default(),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok());
    Ok(config)
}

/// Load configuration from a specific file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| ElogError::io(path, e))?;
    let config = toml::from_str::<Config>(&contents)
        .map_err(|e| ElogError::Config(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Save configuration to the standard location.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(&path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(path)
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("ELOG_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("elogsubmit").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("elogsubmit")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("elogsubmit.log")
}

//! Configuration loading for ChemDeck.
//! Reads chemdeck.toml from the current directory or the path in the CHEMDECK_CONFIG env var.

use chemdeck_common::{ChemdeckError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_ENV_VAR: &str = "CHEMDECK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "chemdeck.toml";

/// Upper bound for `jobs.delay_scale`.
pub const MAX_DELAY_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

// ── Server ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host()       -> String { "127.0.0.1".to_string() }
fn default_port()       -> u16    { 3001 }
fn default_static_dir() -> String { "static".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Jobs ──────────────────────────────────────────────────────────────────────

/// Which executor backs every tool's job runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobBackend {
    /// Fixed-delay placeholder results.
    #[default]
    Simulated,
    /// Real job API reached over HTTP (submit / poll / fetch).
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    #[serde(default)]
    pub backend: JobBackend,
    /// Multiplies each tool's simulated delay.
    #[serde(default = "default_delay_scale")]
    pub delay_scale: f64,
    pub backend_url: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

fn default_delay_scale()      -> f64 { 1.0 }
fn default_poll_interval_ms() -> u64 { 500 }
fn default_max_polls()        -> u32 { 240 }

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            backend: JobBackend::default(),
            delay_scale: default_delay_scale(),
            backend_url: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_polls: default_max_polls(),
        }
    }
}

impl JobsConfig {
    /// Scale a tool's nominal delay by `delay_scale`, saturating instead of overflowing.
    pub fn scaled_delay(&self, nominal: Duration) -> Duration {
        Duration::try_from_secs_f64(nominal.as_secs_f64() * self.delay_scale).unwrap_or(Duration::MAX)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ── Uploads / sessions / viewer ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_max_upload_bytes() -> u64 { 50 * 1024 * 1024 }

impl Default for UploadsConfig {
    fn default() -> Self {
        Self { max_upload_bytes: default_max_upload_bytes() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_secs()            -> u64 { 1800 }
fn default_sweep_interval_secs() -> u64 { 60 }

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SessionsConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_rcsb_base_url")]
    pub rcsb_base_url: String,
    #[serde(default = "default_representation")]
    pub default_representation: String,
    #[serde(default = "default_color_scheme")]
    pub default_color_scheme: String,
}

fn default_rcsb_base_url()  -> String { "https://files.rcsb.org/download".to_string() }
fn default_representation() -> String { "cartoon".to_string() }
fn default_color_scheme()   -> String { "chainid".to_string() }

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            rcsb_base_url: default_rcsb_base_url(),
            default_representation: default_representation(),
            default_color_scheme: default_color_scheme(),
        }
    }
}

#[cfg(test)]
mod tests;

impl Config {
    /// Load configuration from chemdeck.toml.
    /// Checks CHEMDECK_CONFIG env var first, then current directory.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if !Path::new(&path).exists() {
            tracing::info!("No config file at {}; using defaults", path);
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ChemdeckError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ChemdeckError::Config("server.port must be non-zero".into()));
        }
        if !(self.jobs.delay_scale > 0.0 && self.jobs.delay_scale <= MAX_DELAY_SCALE) {
            return Err(ChemdeckError::Config(format!(
                "jobs.delay_scale must be in (0, {MAX_DELAY_SCALE}], got {}",
                self.jobs.delay_scale
            )));
        }
        if self.jobs.poll_interval_ms == 0 {
            return Err(ChemdeckError::Config("jobs.poll_interval_ms must be non-zero".into()));
        }
        if self.jobs.max_polls == 0 {
            return Err(ChemdeckError::Config("jobs.max_polls must be non-zero".into()));
        }
        if self.sessions.sweep_interval_secs == 0 {
            return Err(ChemdeckError::Config("sessions.sweep_interval_secs must be non-zero".into()));
        }
        if self.jobs.backend == JobBackend::Http
            && self.jobs.backend_url.as_deref().map_or(true, str::is_empty)
        {
            return Err(ChemdeckError::Config(
                "jobs.backend = \"http\" requires jobs.backend_url".into(),
            ));
        }
        Ok(())
    }
}

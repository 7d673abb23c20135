use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound for `min_interval_ms` and `window_secs`.
const MAX_LIMIT_SPAN: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Origins allowed by CORS. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// How long a role read from `permisos` is trusted before re-querying.
    pub permission_cache_secs: u64,
    pub limits: LimitConfig,
}

/// Per-client anti-abuse settings shared by the write throttle and the
/// request window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Minimum spacing between two accepted writes from one client.
    pub min_interval_ms: u64,
    /// Length of the request-counting window.
    pub window_secs: u64,
    /// Requests allowed per client within one window.
    pub max_requests: u32,
    /// Use the first `X-Forwarded-For` entry as the client address.
    pub trust_forwarded_for: bool,
}

impl LimitConfig {
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_secs == 0 {
            return Err(Error::Config("limits.window_secs must be positive".into()));
        }
        if self.max_requests == 0 {
            return Err(Error::Config("limits.max_requests must be positive".into()));
        }
        if self.window() > MAX_LIMIT_SPAN {
            return Err(Error::Config(format!(
                "limits.window_secs must be at most {}",
                MAX_LIMIT_SPAN.as_secs()
            )));
        }
        if self.min_interval() > MAX_LIMIT_SPAN {
            return Err(Error::Config(format!(
                "limits.min_interval_ms must be at most {}",
                MAX_LIMIT_SPAN.as_millis()
            )));
        }
        Ok(())
    }
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 2_000,
            window_secs: 5 * 60,
            max_requests: 15,
            trust_forwarded_for: false,
        }
    }
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.limits.validate()
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn permission_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.permission_cache_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3002,
            db_path: PathBuf::from("./data/usuarios.db"),
            allowed_origins: Vec::new(),
            permission_cache_secs: 60,
            limits: LimitConfig::default(),
        }
    }
}

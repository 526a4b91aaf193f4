//! Configuration loading and representation.
//!
//! Everything comes from the environment, read once at startup.

use std::time::Duration;

use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";
const DEFAULT_REDIS_TIMEOUT_MS: u64 = 2000;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Administrator account seeded into the in-memory credential table at
/// startup, so a fresh deployment can log in.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub identifier: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub jwt_secret: String,
    pub use_persistent_stores: bool,
    pub redis_url: String,
    pub redis_timeout: Duration,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &"<redacted>")
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("redis_url", &self.redis_url)
            .field("redis_timeout", &self.redis_timeout)
            .field(
                "bootstrap_admin",
                &self.bootstrap_admin.as_ref().map(|a| a.identifier.as_str()),
            )
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let use_persistent_stores = parse_or(&lookup, "USE_PERSISTENT_STORES", false)?;
        let redis_timeout_ms = parse_or(&lookup, "REDIS_TIMEOUT_MS", DEFAULT_REDIS_TIMEOUT_MS)?;
        if redis_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "REDIS_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }

        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());

        let dev = lookup("APP_ENV").is_some_and(|v| v == "dev");
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if dev => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let bootstrap_admin = match (
            lookup("BOOTSTRAP_ADMIN_IDENTIFIER").filter(|s| !s.is_empty()),
            lookup("BOOTSTRAP_ADMIN_PASSWORD").filter(|s| !s.is_empty()),
        ) {
            (Some(identifier), Some(password)) => Some(BootstrapAdmin {
                identifier,
                password,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_IDENTIFIER")),
        };

        Ok(Self {
            port,
            jwt_secret,
            use_persistent_stores,
            redis_url,
            redis_timeout: Duration::from_millis(redis_timeout_ms),
            bootstrap_admin,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

//! Client configuration with environment overrides.
//!
//! Browser builds have no process environment, so every lookup misses and the
//! defaults apply. SSR/native hosts may override via `PORTAL_*` variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

/// Accounting ceiling for the host store (5 MiB, the common browser limit).
pub const DEFAULT_CAPACITY_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_PROBE_KEY: &str = "__ls_test__";
pub const DEFAULT_CACHE_PREFIX: &str = "cache:";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_VERIFY_ENDPOINT: &str = "/api/payments/verify";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Storage accessor and cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub capacity_bytes: u64,
    /// Throwaway key written and removed by availability probes.
    pub probe_key: String,
    /// Prefix for every key owned by the expiring cache.
    pub cache_prefix: String,
    pub cache_ttl_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            probe_key: DEFAULT_PROBE_KEY.to_owned(),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_owned(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub storage: StorageConfig,
    pub verify_endpoint: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { storage: StorageConfig::default(), verify_endpoint: DEFAULT_VERIFY_ENDPOINT.to_owned() }
    }
}

impl ClientConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `PORTAL_STORAGE_CAPACITY_BYTES`: default 5242880
    /// - `PORTAL_STORAGE_PROBE_KEY`: default `__ls_test__`
    /// - `PORTAL_CACHE_PREFIX`: default `cache:`
    /// - `PORTAL_CACHE_TTL_SECS`: default 86400
    /// - `PORTAL_VERIFY_ENDPOINT`: default `/api/payments/verify`
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] when the probe key or cache prefix is set
    /// to an empty string.
    pub fn from_env() -> Result<Self, ConfigError> {
        let probe_key = env_string("PORTAL_STORAGE_PROBE_KEY", DEFAULT_PROBE_KEY);
        if probe_key.is_empty() {
            return Err(ConfigError::Empty { var: "PORTAL_STORAGE_PROBE_KEY" });
        }
        let cache_prefix = env_string("PORTAL_CACHE_PREFIX", DEFAULT_CACHE_PREFIX);
        if cache_prefix.is_empty() {
            return Err(ConfigError::Empty { var: "PORTAL_CACHE_PREFIX" });
        }

        let storage = StorageConfig {
            capacity_bytes: env_parse("PORTAL_STORAGE_CAPACITY_BYTES", DEFAULT_CAPACITY_BYTES),
            probe_key,
            cache_prefix,
            cache_ttl_secs: env_parse("PORTAL_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
        };
        let verify_endpoint = env_string("PORTAL_VERIFY_ENDPOINT", DEFAULT_VERIFY_ENDPOINT)
            .trim_end_matches('/')
            .to_owned();

        Ok(Self { storage, verify_endpoint })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

//! Engine configuration
//!
//! Defaults suit a single process with an in-memory cache. Every field can
//! be overridden from the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `PERMISSION_CACHE_BACKEND` | `cache.backend` (`memory` or `redis`) | `memory` |
//! | `PERMISSION_CACHE_PREFIX` | `cache.key_prefix` | `perm:` |
//! | `PERMISSION_REDIS_URL` | `cache.redis_url` | unset |
//! | `PERMISSION_CACHE_SWEEP_SECS` | `cache.sweep_interval` | unset |
//! | `PERMISSION_MEMBERSHIP_TTL` | `membership_ttl` (seconds) | `300` |
//! | `PERMISSION_DECISION_TTL` | `decision_ttl` (seconds) | `300` |

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::{DecisionCache, MemoryCache, PermissionCache, DEFAULT_PREFIX, DEFAULT_TTL};
use crate::error::{PermissionError, Result};
use crate::priority::PriorityConfig;

/// Cache backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process [`MemoryCache`]
    #[default]
    Memory,
    /// Shared Redis cache (requires the `redis` feature)
    Redis,
}

impl FromStr for CacheBackend {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(PermissionError::InvalidConfig(format!(
                "Unknown cache backend: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::Redis => f.write_str("redis"),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Namespace for remote cache keys
    pub key_prefix: String,

    /// Redis connection URL (required for the Redis backend)
    pub redis_url: Option<String>,

    /// Background sweep interval for the memory cache, in seconds
    #[serde(with = "opt_secs")]
    pub sweep_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            key_prefix: DEFAULT_PREFIX.to_string(),
            redis_url: None,
            sweep_interval: None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheConfig,

    /// Time-to-live of cached tenant memberships, in seconds
    #[serde(with = "secs")]
    pub membership_ttl: Duration,

    /// Time-to-live of cached permission lists and check results, in seconds,
    /// applied by [`EngineConfig::decision_cache`]
    #[serde(with = "secs")]
    pub decision_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            membership_ttl: DEFAULT_TTL,
            decision_ttl: DEFAULT_TTL,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `PERMISSION_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source, defaults for unset ones
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        debug!("Loading permission engine configuration");
        let mut config = Self::default();

        if let Some(backend) = var("PERMISSION_CACHE_BACKEND") {
            config.cache.backend = backend.parse()?;
        }
        if let Some(prefix) = var("PERMISSION_CACHE_PREFIX") {
            config.cache.key_prefix = prefix;
        }
        if let Some(url) = var("PERMISSION_REDIS_URL") {
            config.cache.redis_url = Some(url);
        }
        if let Some(secs) = var("PERMISSION_CACHE_SWEEP_SECS") {
            config.cache.sweep_interval = Some(parse_secs("PERMISSION_CACHE_SWEEP_SECS", &secs)?);
        }
        if let Some(secs) = var("PERMISSION_MEMBERSHIP_TTL") {
            config.membership_ttl = parse_secs("PERMISSION_MEMBERSHIP_TTL", &secs)?;
        }
        if let Some(secs) = var("PERMISSION_DECISION_TTL") {
            config.decision_ttl = parse_secs("PERMISSION_DECISION_TTL", &secs)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.membership_ttl.is_zero() {
            return Err(PermissionError::InvalidConfig(
                "Membership TTL must be greater than zero".to_string(),
            ));
        }
        if self.decision_ttl.is_zero() {
            return Err(PermissionError::InvalidConfig(
                "Decision TTL must be greater than zero".to_string(),
            ));
        }
        if matches!(self.cache.sweep_interval, Some(interval) if interval.is_zero()) {
            return Err(PermissionError::InvalidConfig(
                "Cache sweep interval must be greater than zero".to_string(),
            ));
        }
        if self.cache.backend == CacheBackend::Redis && self.cache.redis_url.is_none() {
            return Err(PermissionError::InvalidConfig(
                "Redis cache backend requires PERMISSION_REDIS_URL".to_string(),
            ));
        }
        Ok(())
    }

    /// Priority checker settings derived from this configuration
    pub fn priority_config(&self) -> PriorityConfig {
        PriorityConfig {
            membership_ttl: self.membership_ttl,
        }
    }

    /// Decision cache over `cache` writing entries with `decision_ttl`
    pub fn decision_cache(&self, cache: Arc<dyn PermissionCache>) -> DecisionCache {
        DecisionCache::with_ttl(cache, self.decision_ttl)
    }
}

fn parse_secs(name: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| PermissionError::InvalidConfig(format!("Invalid {}: {}", name, e)))
}

/// Builds the cache selected by `config`
///
/// The memory backend starts its sweeper when `sweep_interval` is set, so
/// this must run inside a tokio runtime. The sweeper stops once the
/// returned cache is dropped. The Redis backend connects
/// eagerly and fails if the server is unreachable.
pub async fn build_cache(config: &CacheConfig) -> Result<Arc<dyn PermissionCache>> {
    match config.backend {
        CacheBackend::Memory => {
            let cache = MemoryCache::new();
            if let Some(interval) = config.sweep_interval {
                // detached; exits when the last cache handle is dropped
                drop(cache.spawn_sweeper(interval));
            }
            info!("Using in-memory permission cache");
            Ok(Arc::new(cache))
        }
        CacheBackend::Redis => build_redis_cache(config).await,
    }
}

#[cfg(feature = "redis")]
async fn build_redis_cache(config: &CacheConfig) -> Result<Arc<dyn PermissionCache>> {
    use crate::cache::{RedisStore, RemoteCache};

    let url = config.redis_url.as_deref().ok_or_else(|| {
        PermissionError::InvalidConfig("Redis cache backend requires a URL".to_string())
    })?;
    let store = RedisStore::connect(url).await?;

    info!("Using Redis permission cache with prefix '{}'", config.key_prefix);
    Ok(Arc::new(RemoteCache::with_prefix(store, config.key_prefix.clone())))
}

#[cfg(not(feature = "redis"))]
async fn build_redis_cache(_config: &CacheConfig) -> Result<Arc<dyn PermissionCache>> {
    Err(PermissionError::InvalidConfig(
        "Redis cache backend requires the `redis` feature".to_string(),
    ))
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod opt_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|secs| secs.map(Duration::from_secs))
    }
}

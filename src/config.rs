//! Configuration Module
//!
//! Per-cache settings (namespace, TTL, write mode) and server configuration
//! loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "cache";

/// Number of members requested per sorted-set scan round trip
pub const DEFAULT_SCAN_COUNT: usize = 100;

// == Write Mode ==
/// How `put` delivers its command batch to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Execute the batch before returning and report its outcome
    #[default]
    Sync,
    /// Hand the batch to a background task and return immediately.
    /// Delivery is best effort and failures are never reported.
    Async,
}

impl FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sync" => Ok(WriteMode::Sync),
            "async" => Ok(WriteMode::Async),
            other => Err(format!("unknown write mode '{}'", other)),
        }
    }
}

// == Cache Config ==
/// Settings consumed by every cache operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// First key part of every key, isolates caches sharing one store
    pub namespace: String,
    /// Record lifetime. Writes fail without it.
    pub ttl: Option<Duration>,
    /// Sync or fire-and-forget writes
    pub writes: WriteMode,
    /// Batch size hint for sorted-set scans
    pub scan_count: usize,
}

impl CacheConfig {
    /// Creates a config in the default namespace with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self::default().with_ttl(ttl)
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_writes(mut self, writes: WriteMode) -> Self {
        self.writes = writes;
        self
    }

    pub fn with_scan_count(mut self, scan_count: usize) -> Self {
        self.scan_count = scan_count.max(1);
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl: None,
            writes: WriteMode::Sync,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Redis connection URL, `None` selects the in-memory store
    pub redis_url: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Cache namespace
    pub namespace: String,
    /// Record TTL in milliseconds
    pub ttl_ms: u64,
    /// Write mode for `put`
    pub writes: WriteMode,
    /// In-memory store expiry interval in seconds
    pub expiry_interval: u64,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis connection URL (default: unset, in-memory store)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_NAMESPACE` - Cache namespace (default: "cache")
    /// - `CACHE_TTL_MS` - Record TTL in milliseconds (default: 300000)
    /// - `CACHE_WRITES` - `sync` or `async` (default: sync)
    /// - `EXPIRY_INTERVAL` - In-memory expiry frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            namespace: env::var("CACHE_NAMESPACE")
                .ok()
                .filter(|ns| !ns.is_empty())
                .unwrap_or(defaults.namespace),
            ttl_ms: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl_ms),
            writes: env::var("CACHE_WRITES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.writes),
            expiry_interval: env::var("EXPIRY_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.expiry_interval),
        }
    }

    /// Builds the cache settings described by this server config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(Duration::from_millis(self.ttl_ms))
            .with_namespace(self.namespace.clone())
            .with_writes(self.writes)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            server_port: 3000,
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl_ms: 300_000,
            writes: WriteMode::Sync,
            expiry_interval: 1,
        }
    }
}

//! Configuration for the warmgate gateway

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::common::utils::parse_duration;
use crate::common::Result;

/// Gateway configuration, also the source of process-wide tenant defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind address for the HTTP API
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Default origin URL for domains without a per-tenant override
    #[serde(default = "default_origin_url")]
    pub origin_url: String,

    /// Default cache-key prefix
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Default project id
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Lease after which a revalidation lock is considered abandoned
    #[serde(default = "default_lock_lease")]
    pub lock_lease: String,

    /// Expiry for cached responses
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    /// Paths warmed concurrently per batch, sized to the origin's practical
    /// concurrent-connection limits
    #[serde(default = "default_warm_batch_size")]
    pub warm_batch_size: usize,

    /// Attempts for the origin path-listing call
    #[serde(default = "default_sitemap_retries")]
    pub sitemap_retries: usize,

    /// Per-request timeout for origin fetches
    #[serde(default = "default_origin_timeout")]
    pub origin_timeout: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}
fn default_origin_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_cache_prefix() -> String {
    "docs".to_string()
}
fn default_project_id() -> String {
    "default_project".to_string()
}
fn default_lock_lease() -> String {
    "15m".to_string()
}
fn default_cache_ttl() -> String {
    "24h".to_string()
}
fn default_warm_batch_size() -> usize {
    6
}
fn default_sitemap_retries() -> usize {
    3
}
fn default_origin_timeout() -> String {
    "30s".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            origin_url: default_origin_url(),
            cache_prefix: default_cache_prefix(),
            project_id: default_project_id(),
            lock_lease: default_lock_lease(),
            cache_ttl: default_cache_ttl(),
            warm_batch_size: default_warm_batch_size(),
            sitemap_retries: default_sitemap_retries(),
            origin_timeout: default_origin_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl GatewayConfig {
    /// Load config from `warmgate.toml` (if present) and `WARMGATE_*`
    /// environment variables, falling back to defaults
    pub fn load() -> Self {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("warmgate").required(false))
            .add_source(config::Environment::with_prefix("WARMGATE"));

        match builder.build().and_then(|c| c.try_deserialize()) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Config load failed ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::InvalidConfig(e.to_string()))
    }

    pub fn lock_lease(&self) -> Result<Duration> {
        parse_duration(&self.lock_lease)
    }

    pub fn cache_ttl(&self) -> Result<Duration> {
        parse_duration(&self.cache_ttl)
    }

    pub fn origin_timeout(&self) -> Result<Duration> {
        parse_duration(&self.origin_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.cache_prefix, "docs");
        assert_eq!(cfg.project_id, "default_project");
        assert_eq!(cfg.warm_batch_size, 6);
        assert_eq!(cfg.sitemap_retries, 3);
        assert_eq!(cfg.lock_lease().unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(cfg.cache_ttl().unwrap(), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_from_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warmgate.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "origin_url = \"https://origin.example.com\"\nwarm_batch_size = 2\nlock_lease = \"30s\""
        )
        .unwrap();

        let cfg = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(cfg.origin_url, "https://origin.example.com");
        assert_eq!(cfg.warm_batch_size, 2);
        assert_eq!(cfg.lock_lease().unwrap(), Duration::from_secs(30));
        // Unset fields keep their defaults
        assert_eq!(cfg.cache_prefix, "docs");
    }

    #[test]
    fn test_invalid_lease_rejected() {
        let cfg = GatewayConfig {
            lock_lease: "soon".to_string(),
            ..Default::default()
        };
        assert!(cfg.lock_lease().is_err());
    }
}

//! Tenant configuration resolution
//!
//! Per-domain config lives in the KV store under `CONFIG:{domain}:*` keys;
//! a missing tenant is a valid degraded mode, every field falls back to the
//! process-wide defaults.

use crate::common::keys::{config_origin_key, config_prefix_key, config_project_key};
use crate::common::{GatewayConfig, KvStore, Result};

/// Effective configuration for one domain
#[derive(Debug, Clone)]
pub struct TenantConfig {
    pub origin_url: String,
    pub cache_prefix: String,
    pub project_id: String,
}

/// Resolve a domain's tenant config, defaulting missing fields
pub async fn resolve_tenant(
    kv: &dyn KvStore,
    defaults: &GatewayConfig,
    domain: &str,
) -> Result<TenantConfig> {
    let origin_url = kv
        .get(&config_origin_key(domain))
        .await?
        .unwrap_or_else(|| defaults.origin_url.clone());
    let cache_prefix = kv
        .get(&config_prefix_key(domain))
        .await?
        .unwrap_or_else(|| defaults.cache_prefix.clone());
    let project_id = kv
        .get(&config_project_key(domain))
        .await?
        .unwrap_or_else(|| defaults.project_id.clone());

    Ok(TenantConfig {
        origin_url,
        cache_prefix,
        project_id,
    })
}

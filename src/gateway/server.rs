//! Gateway server

use std::sync::Arc;

use crate::common::{EdgeCache, GatewayConfig, KvStore, MemoryCache, MemoryKv, Result};
use crate::gateway::http::{create_router, GatewayState};

pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub async fn serve(self) -> Result<()> {
        tracing::info!("Starting gateway");
        tracing::info!("  HTTP API: {}", self.config.bind_addr);
        tracing::info!("  Default origin: {}", self.config.origin_url);
        tracing::info!("  Warm batch size: {}", self.config.warm_batch_size);
        tracing::info!("  Lock lease: {}", self.config.lock_lease);
        tracing::info!("  Cache TTL: {}", self.config.cache_ttl);

        // Default backends; deployments with external stores swap these
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        let cache: Arc<dyn EdgeCache> = Arc::new(MemoryCache::new());

        let state = GatewayState::new(&self.config, kv, cache)?;
        let router = create_router(state);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("✓ Gateway ready");

        axum::serve(listener, router).await?;
        Ok(())
    }
}

//! Cache warming
//!
//! Warms one batch of paths at a time: every path in the batch is fetched
//! concurrently, and both content representations per path are fetched
//! concurrently as well, so a batch issues at most `2 * batch_size` in-flight
//! origin requests. One path failing does not abort the rest of the batch.

use futures_util::future;
use std::sync::Arc;
use std::time::Duration;

use crate::common::keys::{build_cache_key, ContentKind};
use crate::common::{EdgeCache, Error, Result, METRICS};
use crate::coordinator::origin_client::OriginClient;
use crate::coordinator::runner::DeploymentConfig;

pub struct Warmer {
    origin: OriginClient,
    cache: Arc<dyn EdgeCache>,
    cache_ttl: Duration,
}

impl Warmer {
    pub fn new(origin: OriginClient, cache: Arc<dyn EdgeCache>, cache_ttl: Duration) -> Self {
        Self {
            origin,
            cache,
            cache_ttl,
        }
    }

    /// Warm every path in the batch concurrently. Returns the number of paths
    /// that failed; failures are logged, not propagated.
    pub async fn warm_batch(&self, config: &DeploymentConfig, batch: &[String]) -> usize {
        let results = future::join_all(batch.iter().map(|path| self.warm_path(config, path))).await;

        let mut failed = 0;
        for (path, result) in batch.iter().zip(results) {
            if let Err(e) = result {
                failed += 1;
                METRICS.warm_failures.inc();
                tracing::warn!(
                    path = %path,
                    deployment = %config.deployment_id,
                    error = %e,
                    "Path warm failed, continuing batch"
                );
            }
        }
        failed
    }

    /// Fetch and store both representations of one path
    async fn warm_path(&self, config: &DeploymentConfig, path: &str) -> Result<()> {
        let (page, fragment) = tokio::join!(
            self.warm_kind(config, path, ContentKind::Page),
            self.warm_kind(config, path, ContentKind::DataFragment),
        );
        page?;
        fragment?;
        Ok(())
    }

    async fn warm_kind(&self, config: &DeploymentConfig, path: &str, kind: ContentKind) -> Result<()> {
        let response = self
            .origin
            .fetch_content(&config.origin_url, path, kind)
            .await?;
        if !response.is_cacheable() {
            return Err(Error::OriginStatus {
                status: response.status,
                url: format!("{}{}", config.origin_url, path),
            });
        }
        let key = build_cache_key(&config.cache_prefix, &config.deployment_id, path, kind);
        self.cache.store(&key, response, self.cache_ttl).await
    }
}

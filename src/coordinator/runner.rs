//! Revalidation run workflow
//!
//! A run brings the cache for one deployment to a fully-warmed state before
//! exposing it as active: check/reclaim the lock, acquire it, resolve the path
//! list, warm batches sequentially while publishing progress through the lock,
//! then commit the active version and release. Any unrecoverable failure
//! leaves the lock in place; the lease lets the next trigger reclaim it.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::common::utils::{chunks, retry_fixed};
use crate::common::version::set_active_version;
use crate::common::{EdgeCache, GatewayConfig, KvStore, Result, METRICS};
use crate::coordinator::lock::RevalidationLock;
use crate::coordinator::origin_client::OriginClient;
use crate::coordinator::warmer::Warmer;

/// Delay between attempts of the path-listing call
const SITEMAP_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Everything a run needs to know about the deployment it warms
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    pub cache_prefix: String,
    pub deployment_id: String,
    pub origin_url: String,
    pub project_id: String,
    pub domain: String,
}

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevalidationStatus {
    AlreadyRunning,
    Completed,
}

impl std::fmt::Display for RevalidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevalidationStatus::AlreadyRunning => write!(f, "ALREADY_RUNNING"),
            RevalidationStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevalidationOutcome {
    pub status: RevalidationStatus,
    pub message: String,
}

impl RevalidationOutcome {
    pub fn already_running() -> Self {
        Self {
            status: RevalidationStatus::AlreadyRunning,
            message: "A revalidation process is already running.".to_string(),
        }
    }

    pub fn completed(warmed: u64) -> Self {
        Self {
            status: RevalidationStatus::Completed,
            message: format!("Revalidation completed. Warmed {} paths.", warmed),
        }
    }
}

/// Executes warming runs; one instance is shared by all project workers
pub struct Revalidator {
    kv: Arc<dyn KvStore>,
    lock: RevalidationLock,
    warmer: Warmer,
    origin: OriginClient,
    batch_size: usize,
    sitemap_retries: usize,
}

impl Revalidator {
    pub fn new(
        kv: Arc<dyn KvStore>,
        cache: Arc<dyn EdgeCache>,
        origin: OriginClient,
        config: &GatewayConfig,
    ) -> Result<Self> {
        let lock = RevalidationLock::new(kv.clone(), config.lock_lease()?);
        let warmer = Warmer::new(origin.clone(), cache, config.cache_ttl()?);
        Ok(Self {
            kv,
            lock,
            warmer,
            origin,
            batch_size: config.warm_batch_size,
            sitemap_retries: config.sitemap_retries,
        })
    }

    /// Run the warming workflow for one deployment. Idempotent while a run is
    /// live: callers racing an in-flight run get `ALREADY_RUNNING` back.
    pub async fn start_revalidation(
        &self,
        config: &DeploymentConfig,
        explicit_paths: Option<Vec<String>>,
    ) -> Result<RevalidationOutcome> {
        if let Some(existing) = self.lock.read(&config.project_id).await? {
            if !existing.is_expired(self.lock.lease()) {
                tracing::debug!(
                    project = %config.project_id,
                    deployment = %existing.deployment_id,
                    "Revalidation already running"
                );
                METRICS.runs_already_running.inc();
                return Ok(RevalidationOutcome::already_running());
            }
            // No owner left to negotiate with: reclaim is unilateral
            tracing::warn!(
                project = %config.project_id,
                stale_deployment = %existing.deployment_id,
                "Reclaiming expired revalidation lock"
            );
            self.lock.release(&config.project_id).await?;
        }

        let state = self
            .lock
            .acquire(&config.project_id, &config.deployment_id)
            .await?;

        METRICS.active_runs.inc();
        let result = self.run_warming(config, explicit_paths, state).await;
        METRICS.active_runs.dec();

        match result {
            Ok(warmed) => {
                METRICS.runs_completed.inc();
                tracing::info!(
                    project = %config.project_id,
                    deployment = %config.deployment_id,
                    warmed,
                    "Revalidation completed"
                );
                Ok(RevalidationOutcome::completed(warmed))
            }
            Err(e) => {
                // The lock stays put; the lease lets the next trigger reclaim it
                METRICS.runs_failed.inc();
                Err(e)
            }
        }
    }

    /// Record the expected deployment version for a project
    pub async fn update_expected_version(
        &self,
        project_id: &str,
        deployment_id: &str,
    ) -> Result<()> {
        crate::common::version::set_expected_version(&*self.kv, project_id, deployment_id).await
    }

    async fn run_warming(
        &self,
        config: &DeploymentConfig,
        explicit_paths: Option<Vec<String>>,
        mut state: crate::coordinator::lock::LockState,
    ) -> Result<u64> {
        let paths = self.resolve_paths(config, explicit_paths).await?;
        let total = paths.len() as u64;
        tracing::info!(
            project = %config.project_id,
            deployment = %config.deployment_id,
            total,
            "Starting cache warm"
        );

        let mut warmed = 0u64;
        for batch in chunks(&paths, self.batch_size) {
            self.warmer.warm_batch(config, &batch).await;
            warmed += batch.len() as u64;
            METRICS.paths_warmed.add(batch.len() as u64);

            state.paths_total = total;
            state.paths_warmed = warmed;
            self.lock.update_progress(&config.project_id, &state).await?;
            tracing::debug!(
                project = %config.project_id,
                warmed,
                total,
                "Warm batch complete"
            );
        }

        // Terminal step: only now does the new deployment become active
        set_active_version(&*self.kv, &config.domain, &config.deployment_id).await?;
        self.lock.release(&config.project_id).await?;
        Ok(warmed)
    }

    async fn resolve_paths(
        &self,
        config: &DeploymentConfig,
        explicit_paths: Option<Vec<String>>,
    ) -> Result<Vec<String>> {
        match explicit_paths {
            Some(paths) if !paths.is_empty() => Ok(paths),
            _ => {
                retry_fixed(
                    || self.origin.fetch_paths(&config.origin_url),
                    self.sitemap_retries,
                    SITEMAP_RETRY_DELAY,
                )
                .await
            }
        }
    }
}

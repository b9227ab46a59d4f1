//! Per-project revalidation workers
//!
//! Each project gets one addressable worker task with a request channel,
//! spawned on first trigger. Jobs for a project drain through its worker one
//! at a time, so run bodies never interleave within this process; across
//! processes the lock record still arbitrates. Triggering is fire-and-forget:
//! the caller never waits for the run.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::common::METRICS;
use crate::coordinator::runner::{DeploymentConfig, Revalidator};

/// One queued warming request
#[derive(Debug, Clone)]
pub struct RevalidateJob {
    pub config: DeploymentConfig,
    /// Explicit paths to warm; the origin sitemap when absent
    pub paths: Option<Vec<String>>,
}

pub struct CoordinatorRegistry {
    revalidator: Arc<Revalidator>,
    workers: Mutex<HashMap<String, mpsc::UnboundedSender<RevalidateJob>>>,
}

impl CoordinatorRegistry {
    pub fn new(revalidator: Arc<Revalidator>) -> Self {
        Self {
            revalidator,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Enqueue a warming run for the job's project. Never blocks and never
    /// waits for the run to finish.
    pub fn trigger(&self, job: RevalidateJob) {
        METRICS.runs_triggered.inc();
        let project_id = job.config.project_id.clone();

        let mut workers = self.workers.lock().unwrap();
        let sender = workers
            .entry(project_id.clone())
            .or_insert_with(|| spawn_worker(self.revalidator.clone(), project_id.clone()));

        if let Err(unsent) = sender.send(job) {
            // The worker task is gone; replace it and requeue
            let sender = spawn_worker(self.revalidator.clone(), project_id.clone());
            let _ = sender.send(unsent.0);
            workers.insert(project_id, sender);
        }
    }
}

fn spawn_worker(
    revalidator: Arc<Revalidator>,
    project_id: String,
) -> mpsc::UnboundedSender<RevalidateJob> {
    let (tx, mut rx) = mpsc::unbounded_channel::<RevalidateJob>();
    tokio::spawn(async move {
        tracing::debug!(project = %project_id, "Revalidation worker started");
        while let Some(job) = rx.recv().await {
            let deployment = job.config.deployment_id.clone();
            match revalidator.start_revalidation(&job.config, job.paths).await {
                Ok(outcome) => {
                    tracing::info!(
                        project = %project_id,
                        deployment = %deployment,
                        status = %outcome.status,
                        "{}",
                        outcome.message
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        project = %project_id,
                        deployment = %deployment,
                        error = %e,
                        "Revalidation run failed; lock will expire via its lease"
                    );
                }
            }
        }
    });
    tx
}

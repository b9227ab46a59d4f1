//! Revalidation lock
//!
//! One lock record per project in the KV store. The record is both the mutual
//! exclusion primitive and the progress channel: it is created on acquire,
//! rewritten after every warmed batch, and deleted on success or reclaim. A
//! record older than the lease is abandoned and may be reclaimed unilaterally.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::common::keys::lock_key;
use crate::common::utils::timestamp_now_millis;
use crate::common::{Error, KvStore, Result};

/// Lock record for one project's warming run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockState {
    /// Deployment being warmed
    pub deployment_id: String,
    /// Unix millis of lock acquisition; the lease is measured from here
    pub acquired_at: u64,
    pub paths_total: u64,
    pub paths_warmed: u64,
}

impl LockState {
    pub fn new(deployment_id: &str) -> Self {
        Self {
            deployment_id: deployment_id.to_string(),
            acquired_at: timestamp_now_millis(),
            paths_total: 0,
            paths_warmed: 0,
        }
    }

    /// Has the owning run held this lock past its lease?
    pub fn is_expired(&self, lease: Duration) -> bool {
        timestamp_now_millis().saturating_sub(self.acquired_at) >= lease.as_millis() as u64
    }
}

/// Lock operations over the KV store for one coordinator instance
pub struct RevalidationLock {
    kv: Arc<dyn KvStore>,
    lease: Duration,
}

impl RevalidationLock {
    pub fn new(kv: Arc<dyn KvStore>, lease: Duration) -> Self {
        Self { kv, lease }
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Current lock record for a project, if any. An unparseable record is
    /// treated as absent so a wedged run cannot block the project forever.
    pub async fn read(&self, project_id: &str) -> Result<Option<LockState>> {
        let raw = match self.kv.get(&lock_key(project_id)).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                tracing::warn!(
                    project = %project_id,
                    error = %e,
                    "Discarding unreadable lock record"
                );
                Ok(None)
            }
        }
    }

    /// Write a fresh lock record with zeroed progress counters
    pub async fn acquire(&self, project_id: &str, deployment_id: &str) -> Result<LockState> {
        let state = LockState::new(deployment_id);
        self.write(project_id, &state).await?;
        Ok(state)
    }

    /// Rewrite the lock record with updated progress counters
    pub async fn update_progress(&self, project_id: &str, state: &LockState) -> Result<()> {
        self.write(project_id, state).await
    }

    /// Delete the lock record
    pub async fn release(&self, project_id: &str) -> Result<()> {
        self.kv.delete(&lock_key(project_id)).await
    }

    async fn write(&self, project_id: &str, state: &LockState) -> Result<()> {
        let raw = serde_json::to_string(state)
            .map_err(|e| Error::Internal(format!("Serialize lock state: {}", e)))?;
        self.kv.put(&lock_key(project_id), raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MemoryKv;

    fn lock() -> RevalidationLock {
        RevalidationLock::new(Arc::new(MemoryKv::new()), Duration::from_secs(900))
    }

    #[tokio::test]
    async fn test_acquire_read_release() {
        let lock = lock();
        assert!(lock.read("prj_1").await.unwrap().is_none());

        let state = lock.acquire("prj_1", "dpl_1").await.unwrap();
        assert_eq!(state.paths_total, 0);
        assert_eq!(state.paths_warmed, 0);

        let read = lock.read("prj_1").await.unwrap().unwrap();
        assert_eq!(read.deployment_id, "dpl_1");
        assert!(!read.is_expired(Duration::from_secs(900)));

        lock.release("prj_1").await.unwrap();
        assert!(lock.read("prj_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_progress_updates_persist() {
        let lock = lock();
        let mut state = lock.acquire("prj_1", "dpl_1").await.unwrap();

        state.paths_total = 3;
        state.paths_warmed = 2;
        lock.update_progress("prj_1", &state).await.unwrap();

        let read = lock.read("prj_1").await.unwrap().unwrap();
        assert_eq!(read.paths_total, 3);
        assert_eq!(read.paths_warmed, 2);
        // Acquisition time survives progress rewrites
        assert_eq!(read.acquired_at, state.acquired_at);
    }

    #[test]
    fn test_lease_expiry() {
        let mut state = LockState::new("dpl_1");
        assert!(!state.is_expired(Duration::from_secs(900)));

        state.acquired_at = timestamp_now_millis() - 16 * 60 * 1000;
        assert!(state.is_expired(Duration::from_secs(900)));
        assert!(!state.is_expired(Duration::from_secs(3600)));
    }

    #[tokio::test]
    async fn test_unreadable_record_treated_as_absent() {
        let kv = Arc::new(MemoryKv::new());
        kv.put("LOCK:prj_1", "not json".to_string()).await.unwrap();

        let lock = RevalidationLock::new(kv, Duration::from_secs(900));
        assert!(lock.read("prj_1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_locks_are_per_project() {
        let lock = lock();
        lock.acquire("prj_1", "dpl_1").await.unwrap();
        assert!(lock.read("prj_2").await.unwrap().is_none());
    }
}

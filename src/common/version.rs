//! Version records and drift detection
//!
//! Two views over the KV store: the expected version (written when a
//! deployment is announced) and the active version (written only as the
//! terminal step of a successful warming run, so readers never observe a
//! half-warmed deployment as active).

use crate::common::keys::{active_version_key, expected_version_key};
use crate::common::{KvStore, Result};

/// Outcome of comparing an origin response against the expected version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    pub should_revalidate: bool,
    pub want_version: Option<String>,
    pub got_version: Option<String>,
}

impl VersionCheck {
    fn no_drift(got_version: Option<String>) -> Self {
        Self {
            should_revalidate: false,
            want_version: None,
            got_version,
        }
    }
}

/// Expected deployment version for a project, if one has been announced
pub async fn expected_version(kv: &dyn KvStore, project_id: &str) -> Result<Option<String>> {
    kv.get(&expected_version_key(project_id)).await
}

/// Record the expected deployment version for a project
pub async fn set_expected_version(
    kv: &dyn KvStore,
    project_id: &str,
    deployment_id: &str,
) -> Result<()> {
    kv.put(&expected_version_key(project_id), deployment_id.to_string())
        .await
}

/// Active deployment version served for a domain, if any run ever completed
pub async fn active_version(kv: &dyn KvStore, domain: &str) -> Result<Option<String>> {
    kv.get(&active_version_key(domain)).await
}

/// Commit the active deployment version for a domain
pub async fn set_active_version(kv: &dyn KvStore, domain: &str, deployment_id: &str) -> Result<()> {
    kv.put(&active_version_key(domain), deployment_id.to_string())
        .await
}

/// Compare the version the origin reported against the version expected for
/// its project. Both identifying headers must be present and an expected
/// version must exist before drift can be declared.
pub async fn detect_version_mismatch(
    kv: &dyn KvStore,
    got_version: Option<&str>,
    got_project: Option<&str>,
) -> Result<VersionCheck> {
    let (got_version, project_id) = match (got_version, got_project) {
        (Some(v), Some(p)) => (v, p),
        _ => return Ok(VersionCheck::no_drift(None)),
    };

    let want_version = match expected_version(kv, project_id).await? {
        Some(v) => v,
        None => return Ok(VersionCheck::no_drift(Some(got_version.to_string()))),
    };

    Ok(VersionCheck {
        should_revalidate: want_version != got_version,
        want_version: Some(want_version),
        got_version: Some(got_version.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MemoryKv;

    #[tokio::test]
    async fn test_matching_version_is_not_drift() {
        let kv = MemoryKv::new();
        set_expected_version(&kv, "p1", "v2").await.unwrap();

        let check = detect_version_mismatch(&kv, Some("v2"), Some("p1"))
            .await
            .unwrap();
        assert!(!check.should_revalidate);
        assert_eq!(check.want_version.as_deref(), Some("v2"));
        assert_eq!(check.got_version.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_drift_reports_wanted_version() {
        let kv = MemoryKv::new();
        set_expected_version(&kv, "p1", "v3").await.unwrap();

        let check = detect_version_mismatch(&kv, Some("v2"), Some("p1"))
            .await
            .unwrap();
        assert!(check.should_revalidate);
        assert_eq!(check.want_version.as_deref(), Some("v3"));
        assert_eq!(check.got_version.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_missing_headers_never_drift() {
        let kv = MemoryKv::new();
        set_expected_version(&kv, "p1", "v3").await.unwrap();

        let check = detect_version_mismatch(&kv, None, Some("p1")).await.unwrap();
        assert!(!check.should_revalidate);
        assert_eq!(check.got_version, None);

        let check = detect_version_mismatch(&kv, Some("v2"), None).await.unwrap();
        assert!(!check.should_revalidate);
        assert_eq!(check.got_version, None);
    }

    #[tokio::test]
    async fn test_no_expected_version_never_drift() {
        let kv = MemoryKv::new();
        let check = detect_version_mismatch(&kv, Some("v2"), Some("p1"))
            .await
            .unwrap();
        assert!(!check.should_revalidate);
        assert_eq!(check.want_version, None);
        assert_eq!(check.got_version.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_active_version_roundtrip() {
        let kv = MemoryKv::new();
        assert_eq!(active_version(&kv, "docs.example.com").await.unwrap(), None);

        set_active_version(&kv, "docs.example.com", "dpl_1")
            .await
            .unwrap();
        assert_eq!(
            active_version(&kv, "docs.example.com").await.unwrap(),
            Some("dpl_1".to_string())
        );
    }
}

//! Key templates for the KV config/version store and the edge cache.
//!
//! KV keys are flat strings addressing tenant config, version records and the
//! per-project revalidation lock. Cache keys are deployment-scoped so a new
//! deployment never overwrites a previous deployment's entries.

use axum::http::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Response header the origin echoes with its deployment version
pub const VERSION_HEADER: &str = "x-version";

/// Response header the origin echoes with its project id
pub const PROJECT_HEADER: &str = "x-vercel-project-id";

/// Request header marking a data-fragment fetch (`rsc: 1`)
pub const FRAGMENT_MARKER_HEADER: &str = "rsc";

/// Origin URL for a domain
pub fn config_origin_key(domain: &str) -> String {
    format!("CONFIG:{}:origin", domain)
}

/// Cache-key prefix for a domain
pub fn config_prefix_key(domain: &str) -> String {
    format!("CONFIG:{}:prefix", domain)
}

/// Project id for a domain (fallback, the origin response header wins)
pub fn config_project_key(domain: &str) -> String {
    format!("CONFIG:{}:project", domain)
}

/// Expected deployment version for a project (set by the deployment webhook)
pub fn expected_version_key(project_id: &str) -> String {
    format!("DEPLOY:{}:id", project_id)
}

/// Active deployment version for a domain (set after cache warming completes)
pub fn active_version_key(domain: &str) -> String {
    format!("DEPLOYMENT:{}", domain)
}

/// Revalidation lock for a project
pub fn lock_key(project_id: &str) -> String {
    format!("LOCK:{}", project_id)
}

/// Content representation served for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Full rendered page
    Page,
    /// Navigation payload fetched with the `rsc: 1` marker header
    DataFragment,
}

impl ContentKind {
    /// Both representations, in warming order
    pub const ALL: [ContentKind; 2] = [ContentKind::Page, ContentKind::DataFragment];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Page => "page",
            ContentKind::DataFragment => "data-fragment",
        }
    }

    /// Which representation a request asks for, from its marker header
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let marked = headers
            .get(FRAGMENT_MARKER_HEADER)
            .and_then(|v| v.to_str().ok())
            == Some("1");
        if marked {
            ContentKind::DataFragment
        } else {
            ContentKind::Page
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Percent-encoding set for cache-key segments (no `/` or `%` may survive,
/// the segment boundaries carry the key structure)
const SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'%')
    .add(b' ')
    .add(b'?')
    .add(b'#')
    .add(b'&');

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

/// Build the cache key for one representation of one path under one
/// deployment: `{prefix}/{deploymentId}{path}/{kind}`.
///
/// Prefix and deployment id are percent-encoded, the path is normalized to a
/// leading slash, and the kind is a fixed slash-free suffix, so the key is
/// injective over its four inputs.
pub fn build_cache_key(prefix: &str, deployment_id: &str, path: &str, kind: ContentKind) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    format!(
        "{}/{}{}/{}",
        encode_segment(prefix),
        encode_segment(deployment_id),
        path,
        kind.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::collections::HashSet;

    #[test]
    fn test_kv_key_templates() {
        assert_eq!(
            config_origin_key("docs.example.com"),
            "CONFIG:docs.example.com:origin"
        );
        assert_eq!(
            config_prefix_key("docs.example.com"),
            "CONFIG:docs.example.com:prefix"
        );
        assert_eq!(
            config_project_key("docs.example.com"),
            "CONFIG:docs.example.com:project"
        );
        assert_eq!(expected_version_key("prj_1"), "DEPLOY:prj_1:id");
        assert_eq!(
            active_version_key("docs.example.com"),
            "DEPLOYMENT:docs.example.com"
        );
        assert_eq!(lock_key("prj_1"), "LOCK:prj_1");
    }

    #[test]
    fn test_cache_key_stable() {
        let a = build_cache_key("docs", "dpl_abc123", "/getting-started", ContentKind::Page);
        let b = build_cache_key("docs", "dpl_abc123", "/getting-started", ContentKind::Page);
        assert_eq!(a, b);
        assert_eq!(a, "docs/dpl_abc123/getting-started/page");
    }

    #[test]
    fn test_cache_key_kind_suffix() {
        let page = build_cache_key("docs", "dpl_1", "/guide", ContentKind::Page);
        let frag = build_cache_key("docs", "dpl_1", "/guide", ContentKind::DataFragment);
        assert!(page.ends_with("/page"));
        assert!(frag.ends_with("/data-fragment"));
        assert_ne!(page, frag);
    }

    #[test]
    fn test_cache_key_injective() {
        // Adversarial tuples that would collide under naive concatenation
        let tuples = [
            ("docs", "dpl_1", "/a", ContentKind::Page),
            ("docs", "dpl_1", "/a", ContentKind::DataFragment),
            ("docs", "dpl_1", "/a/page", ContentKind::Page),
            ("docs", "dpl_1/a", "/b", ContentKind::Page),
            ("docs/dpl_1", "a", "/b", ContentKind::Page),
            ("docs", "dpl_2", "/a", ContentKind::Page),
            ("doc", "s_dpl_1", "/a", ContentKind::Page),
        ];
        let keys: HashSet<String> = tuples
            .iter()
            .map(|(p, d, path, k)| build_cache_key(p, d, path, *k))
            .collect();
        assert_eq!(keys.len(), tuples.len());
    }

    #[test]
    fn test_cache_key_normalizes_leading_slash() {
        assert_eq!(
            build_cache_key("docs", "dpl_1", "guide", ContentKind::Page),
            build_cache_key("docs", "dpl_1", "/guide", ContentKind::Page)
        );
    }

    #[test]
    fn test_content_kind_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(ContentKind::from_headers(&headers), ContentKind::Page);

        headers.insert(FRAGMENT_MARKER_HEADER, HeaderValue::from_static("1"));
        assert_eq!(
            ContentKind::from_headers(&headers),
            ContentKind::DataFragment
        );

        headers.insert(FRAGMENT_MARKER_HEADER, HeaderValue::from_static("0"));
        assert_eq!(ContentKind::from_headers(&headers), ContentKind::Page);
    }
}

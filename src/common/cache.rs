//! Edge cache store seam
//!
//! The HTTP cache store is an external collaborator addressed by the composite
//! cache key from [`crate::common::keys`]. Entries are immutable once written
//! for a given key; expiry is the only lifecycle the gateway relies on, and
//! eviction/sharding stay inside the store.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::common::utils::timestamp_now_millis;
use crate::common::Result;

/// A materialized origin response, storable in the edge cache
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Only successful responses go into the cache
    pub fn is_cacheable(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First value of a header, by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<HeaderName>(),
                HeaderValue::from_str(value),
            ) {
                response.headers_mut().append(name, value);
            }
        }
        response
    }
}

/// Trait for the external HTTP cache store
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Look up a non-expired entry by cache key
    async fn lookup(&self, key: &str) -> Result<Option<CachedResponse>>;

    /// Store an entry under a cache key with an expiry
    async fn store(&self, key: &str, response: CachedResponse, ttl: Duration) -> Result<()>;
}

/// In-memory cache store (default)
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (CachedResponse, u64)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries, expired ones included until next lookup
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EdgeCache for MemoryCache {
    async fn lookup(&self, key: &str) -> Result<Option<CachedResponse>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= timestamp_now_millis() => {
                entries.remove(key);
                Ok(None)
            }
            Some((response, _)) => Ok(Some(response.clone())),
            None => Ok(None),
        }
    }

    async fn store(&self, key: &str, response: CachedResponse, ttl: Duration) -> Result<()> {
        let expires_at = timestamp_now_millis().saturating_add(ttl.as_millis() as u64);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (response, expires_at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> CachedResponse {
        CachedResponse::new(
            200,
            vec![("content-type".to_string(), "text/html".to_string())],
            Bytes::copy_from_slice(body.as_bytes()),
        )
    }

    #[test]
    fn test_store_and_lookup() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let key = "docs/dpl_1/guide/page";
            assert!(cache.lookup(key).await.unwrap().is_none());

            cache
                .store(key, page("<html>"), Duration::from_secs(60))
                .await
                .unwrap();
            let hit = cache.lookup(key).await.unwrap().unwrap();
            assert_eq!(hit.status, 200);
            assert_eq!(hit.body, Bytes::from_static(b"<html>"));
            assert_eq!(hit.header("Content-Type"), Some("text/html"));
        });
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        tokio_test::block_on(async {
            let cache = MemoryCache::new();
            let key = "docs/dpl_1/guide/page";
            cache
                .store(key, page("stale"), Duration::from_millis(0))
                .await
                .unwrap();
            assert!(cache.lookup(key).await.unwrap().is_none());
            assert!(cache.is_empty());
        });
    }

    #[test]
    fn test_cacheable() {
        assert!(page("ok").is_cacheable());
        let not_found = CachedResponse::new(404, vec![], Bytes::new());
        assert!(!not_found.is_cacheable());
        let error = CachedResponse::new(500, vec![], Bytes::new());
        assert!(!error.is_cacheable());
    }
}

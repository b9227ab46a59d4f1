//! HTTP client for the origin content service

use axum::http::HeaderMap;
use std::time::Duration;

use crate::common::keys::{ContentKind, FRAGMENT_MARKER_HEADER};
use crate::common::{CachedResponse, Error, Result, METRICS};

/// Path-listing endpoint exposed by the origin
const SITEMAP_PATH: &str = "/api/sitemap";

/// Request headers that must not be forwarded to the origin
const SKIP_REQUEST_HEADERS: [&str; 3] = ["host", "content-length", "connection"];

/// Response headers that must not be replayed from a materialized response
const SKIP_RESPONSE_HEADERS: [&str; 4] =
    ["connection", "transfer-encoding", "content-length", "keep-alive"];

#[derive(Clone)]
pub struct OriginClient {
    http: reqwest::Client,
}

impl OriginClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Build origin client: {}", e)))?;
        Ok(Self { http })
    }

    /// Fetch the list of warmable paths from the origin sitemap endpoint
    pub async fn fetch_paths(&self, origin_url: &str) -> Result<Vec<String>> {
        let url = join_url(origin_url, SITEMAP_PATH);
        METRICS.origin_fetches.inc();

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::OriginStatus {
                status: status.as_u16(),
                url,
            });
        }
        response
            .json::<Vec<String>>()
            .await
            .map_err(|e| Error::Origin(format!("Invalid sitemap payload: {}", e)))
    }

    /// Fetch one representation of one path, with the data-fragment marker
    /// header when asked for that kind
    pub async fn fetch_content(
        &self,
        origin_url: &str,
        path: &str,
        kind: ContentKind,
    ) -> Result<CachedResponse> {
        let url = join_url(origin_url, path);
        METRICS.origin_fetches.inc();

        let mut request = self.http.get(&url);
        if kind == ContentKind::DataFragment {
            request = request.header(FRAGMENT_MARKER_HEADER, "1");
        }
        materialize(request.send().await?).await
    }

    /// Forward a gateway request to the origin, replaying its headers
    pub async fn proxy(
        &self,
        origin_url: &str,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<CachedResponse> {
        let url = join_url(origin_url, path);
        METRICS.origin_fetches.inc();

        let mut request = self.http.get(&url);
        for (name, value) in headers {
            let name = name.as_str();
            if SKIP_REQUEST_HEADERS.contains(&name) {
                continue;
            }
            if let Ok(value) = value.to_str() {
                request = request.header(name, value);
            }
        }
        materialize(request.send().await?).await
    }
}

/// Materialize a streamed origin response into a storable one
async fn materialize(response: reqwest::Response) -> Result<CachedResponse> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter(|(name, _)| !SKIP_RESPONSE_HEADERS.contains(&name.as_str()))
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes().await?;
    Ok(CachedResponse::new(status, headers, body))
}

fn join_url(origin_url: &str, path: &str) -> String {
    format!("{}{}", origin_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:3000", "/docs"),
            "http://localhost:3000/docs"
        );
        assert_eq!(
            join_url("http://localhost:3000/", "/docs"),
            "http://localhost:3000/docs"
        );
    }
}

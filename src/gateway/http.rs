//! HTTP surface for the gateway
//!
//! Routes:
//! - `POST /prewarm`: queue a warming run, reply immediately
//! - `POST /webhook/deployment`: record a project's expected version
//! - `GET /health`, `GET /metrics`: operational endpoints
//! - everything else: the passthrough-or-cache content path

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::common::keys::{build_cache_key, ContentKind, PROJECT_HEADER, VERSION_HEADER};
use crate::common::version::{active_version, detect_version_mismatch};
use crate::common::{
    CachedResponse, EdgeCache, Error, GatewayConfig, KvStore, Result, METRICS,
};
use crate::coordinator::origin_client::OriginClient;
use crate::coordinator::registry::{CoordinatorRegistry, RevalidateJob};
use crate::coordinator::runner::{DeploymentConfig, Revalidator};
use crate::gateway::middleware::request_tracing;
use crate::gateway::tenant::{resolve_tenant, TenantConfig};

/// Shared gateway state for HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub kv: Arc<dyn KvStore>,
    pub cache: Arc<dyn EdgeCache>,
    pub origin: OriginClient,
    pub revalidator: Arc<Revalidator>,
    pub registry: Arc<CoordinatorRegistry>,
    pub defaults: Arc<GatewayConfig>,
    pub cache_ttl: Duration,
}

impl GatewayState {
    /// Wire up the origin client, revalidator and per-project worker registry
    /// around the given stores.
    pub fn new(
        config: &GatewayConfig,
        kv: Arc<dyn KvStore>,
        cache: Arc<dyn EdgeCache>,
    ) -> Result<Self> {
        let origin = OriginClient::new(config.origin_timeout()?)?;
        let revalidator = Arc::new(Revalidator::new(
            kv.clone(),
            cache.clone(),
            origin.clone(),
            config,
        )?);
        let registry = Arc::new(CoordinatorRegistry::new(revalidator.clone()));
        Ok(Self {
            kv,
            cache,
            origin,
            revalidator,
            registry,
            defaults: Arc::new(config.clone()),
            cache_ttl: config.cache_ttl()?,
        })
    }
}

/// Creates the HTTP router with all public endpoints.
pub fn create_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/prewarm", post(prewarm))
        .route("/webhook/deployment", post(deployment_webhook))
        // The content path: everything that is not an operational endpoint
        .fallback(serve_content)
        .layer(axum::middleware::from_fn(request_tracing))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    (StatusCode::OK, METRICS.to_prometheus())
}

/// Request body for a prewarm run
#[derive(Debug, Deserialize)]
struct PrewarmRequest {
    /// Explicit paths to warm; the origin sitemap is used when omitted
    #[serde(default)]
    paths: Vec<String>,
    #[serde(flatten)]
    config: DeploymentConfig,
}

/// Queue a warming run and reply immediately
async fn prewarm(
    State(state): State<GatewayState>,
    Json(request): Json<PrewarmRequest>,
) -> impl IntoResponse {
    let paths = if request.paths.is_empty() {
        None
    } else {
        Some(request.paths)
    };
    tracing::info!(
        project = %request.config.project_id,
        deployment = %request.config.deployment_id,
        explicit_paths = paths.as_ref().map(Vec::len).unwrap_or(0),
        "Prewarm queued"
    );
    state.registry.trigger(RevalidateJob {
        config: request.config,
        paths,
    });
    (StatusCode::ACCEPTED, Json(json!({ "status": "queued" })))
}

/// Deployment webhook body: the flat form, or the nested shape the deployment
/// platform posts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WebhookRequest {
    Nested { payload: WebhookPayload },
    Flat {
        #[serde(rename = "projectId")]
        project_id: String,
        #[serde(rename = "deploymentId")]
        deployment_id: String,
    },
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    project: WebhookRef,
    deployment: WebhookRef,
}

#[derive(Debug, Deserialize)]
struct WebhookRef {
    id: String,
}

/// Record a project's expected deployment version
async fn deployment_webhook(
    State(state): State<GatewayState>,
    Json(request): Json<WebhookRequest>,
) -> Response {
    let (project_id, deployment_id) = match request {
        WebhookRequest::Flat {
            project_id,
            deployment_id,
        } => (project_id, deployment_id),
        WebhookRequest::Nested { payload } => (payload.project.id, payload.deployment.id),
    };

    match state
        .revalidator
        .update_expected_version(&project_id, &deployment_id)
        .await
    {
        Ok(()) => {
            tracing::info!(
                project = %project_id,
                deployment = %deployment_id,
                "Updated expected deployment version"
            );
            (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// The content path: serve from cache, proxy on miss, repair in the background
async fn serve_content(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    match handle_content(&state, request).await {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn handle_content(state: &GatewayState, request: Request<Body>) -> Result<Response> {
    let headers = request.headers().clone();
    let path = request.uri().path().to_string();
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let tenant = resolve_tenant(&*state.kv, &state.defaults, &host).await?;

    let Some(active) = active_version(&*state.kv, &host).await? else {
        // Cold start: no deployment was ever warmed for this domain, so the
        // cache store holds nothing for it
        METRICS.passthrough.inc();
        let response = state.origin.proxy(&tenant.origin_url, &path, &headers).await?;
        return Ok(response.into_response());
    };

    let kind = ContentKind::from_headers(&headers);
    let cache_key = build_cache_key(&tenant.cache_prefix, &active, &path, kind);

    if let Some(hit) = state.cache.lookup(&cache_key).await? {
        METRICS.cache_hits.inc();
        return Ok(hit.into_response());
    }
    METRICS.cache_misses.inc();

    let origin_response = state.origin.proxy(&tenant.origin_url, &path, &headers).await?;

    let got_version = origin_response.header(VERSION_HEADER).map(str::to_string);
    let got_project = origin_response.header(PROJECT_HEADER).map(str::to_string);

    // Drift check and cache fill happen after the response is determined,
    // overlapped with the reply
    let kv = state.kv.clone();
    let cache = state.cache.clone();
    let registry = state.registry.clone();
    let cache_ttl = state.cache_ttl;
    let stored = origin_response.clone();
    let domain = host.clone();
    tokio::spawn(async move {
        let result = finish_miss(
            kv, cache, registry, tenant, domain, cache_key, stored, got_version, got_project,
            cache_ttl,
        )
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Post-response cache maintenance failed");
        }
    });

    Ok(origin_response.into_response())
}

/// After a miss was answered from the origin: detect version drift, trigger a
/// background run if needed, and fill the cache
#[allow(clippy::too_many_arguments)]
async fn finish_miss(
    kv: Arc<dyn KvStore>,
    cache: Arc<dyn EdgeCache>,
    registry: Arc<CoordinatorRegistry>,
    tenant: TenantConfig,
    domain: String,
    cache_key: String,
    response: CachedResponse,
    got_version: Option<String>,
    got_project: Option<String>,
    cache_ttl: Duration,
) -> Result<()> {
    let check =
        detect_version_mismatch(&*kv, got_version.as_deref(), got_project.as_deref()).await?;

    if check.should_revalidate {
        if let Some(want) = check.want_version {
            tracing::info!(
                domain = %domain,
                want = %want,
                got = ?check.got_version,
                "Version drift detected, triggering revalidation"
            );
            // The response header is the authoritative project id, the tenant
            // config value is only a fallback
            let project_id = got_project.unwrap_or(tenant.project_id);
            registry.trigger(RevalidateJob {
                config: DeploymentConfig {
                    cache_prefix: tenant.cache_prefix,
                    deployment_id: want,
                    origin_url: tenant.origin_url,
                    project_id,
                    domain,
                },
                paths: None,
            });
        }
    }

    if response.is_cacheable() {
        cache.store(&cache_key, response, cache_ttl).await?;
    }
    Ok(())
}

fn error_response(e: Error) -> Response {
    let status = e.to_http_status();
    tracing::warn!(error = %e, status = %status.as_u16(), "Request failed");
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

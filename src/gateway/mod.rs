//! Cache gateway
//!
//! The request-facing component: resolves tenant config, serves from the edge
//! cache when it can, proxies to the origin when it cannot, and triggers
//! background revalidation when the origin's reported version drifts from the
//! expected one.

pub mod http;
pub mod middleware;
pub mod server;
pub mod tenant;

pub use http::{create_router, GatewayState};
pub use server::Gateway;
pub use tenant::{resolve_tenant, TenantConfig};

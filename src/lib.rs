//! # warmgate
//!
//! An edge caching and revalidation gateway with:
//! - Deployment-versioned cache keys (instant rollback by repointing a version)
//! - Version-drift detection on the read path, repair out of band
//! - Lease-guarded warming runs, at most one per project
//! - Bounded-concurrency cache warming against the origin
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   GET /*            ┌─────────────────────────┐
//! │   Clients    ├────────────────────►│      Cache Gateway      │
//! └──────────────┘                     │  serve / proxy / detect │
//!                                      └─────┬──────────┬────────┘
//!                       fire-and-forget      │          │ read-through
//!                    ┌───────────────────────┘          ▼
//!                    ▼                            ┌───────────┐
//!        ┌───────────────────────┐                │ Edge cache│
//!        │ Revalidation          │    warm        └───────────┘
//!        │ Coordinator (actor    ├──────────────► ┌───────────┐
//!        │ per project + lock)   │    sitemap     │  Origin   │
//!        └──────────┬────────────┘                └───────────┘
//!                   │ lock / versions
//!                   ▼
//!             ┌───────────┐
//!             │  KV store │
//!             └───────────┘
//! ```
//!
//! ## Usage
//!
//! ### Start the gateway
//! ```bash
//! warmgate-gateway serve \
//!   --bind 0.0.0.0:8080 \
//!   --origin https://docs-origin.example.com
//! ```
//!
//! ### Trigger a prewarm run
//! ```bash
//! warmgate prewarm /docs /docs/install \
//!   --domain docs.example.com \
//!   --deployment dpl_abc123
//! ```
//!
//! ### Announce a deployment (what the webhook sender does)
//! ```bash
//! warmgate deploy --project prj_1 --deployment dpl_abc123
//! ```

pub mod common;
pub mod coordinator;
pub mod gateway;

// Re-export commonly used types
pub use common::{Error, GatewayConfig, Result};
pub use coordinator::{DeploymentConfig, Revalidator};
pub use gateway::Gateway;

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build info
pub const BUILD_INFO: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARGO_PKG_NAME"), ")");

//! Revalidation coordination
//!
//! The coordinator is responsible for:
//! - At most one in-flight warming run per project (lease-guarded lock)
//! - Bringing the cache for a new deployment to a fully-warmed state
//! - Committing the active version only after warming completes
//! - Progress reporting through the lock record itself

pub mod lock;
pub mod origin_client;
pub mod registry;
pub mod runner;
pub mod warmer;

pub use lock::{LockState, RevalidationLock};
pub use origin_client::OriginClient;
pub use registry::{CoordinatorRegistry, RevalidateJob};
pub use runner::{DeploymentConfig, RevalidationOutcome, RevalidationStatus, Revalidator};

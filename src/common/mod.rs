//! Common utilities and types shared across warmgate

pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod kv;
pub mod metrics;
pub mod utils;
pub mod version;

pub use cache::{CachedResponse, EdgeCache, MemoryCache};
pub use config::GatewayConfig;
pub use error::{Error, Result};
pub use keys::{build_cache_key, ContentKind};
pub use kv::{KvStore, MemoryKv};
pub use metrics::METRICS;
pub use utils::{chunks, parse_duration, retry_fixed, timestamp_now_millis};

//! Config/version store seam
//!
//! The durable per-key byte store is an external collaborator: it holds tenant
//! config, version records and the revalidation lock. The trait assumes atomic
//! single-key read/write with read-your-writes consistency. The in-memory
//! implementation is the default backend and the test double.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::common::Result;

/// Trait for the external key-value config/version store
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: String) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory store (default)
#[derive(Default)]
pub struct MemoryKv {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.map.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_your_writes() {
        tokio_test::block_on(async {
            let kv = MemoryKv::new();
            assert_eq!(kv.get("missing").await.unwrap(), None);

            kv.put("DEPLOYMENT:docs.example.com", "dpl_1".to_string())
                .await
                .unwrap();
            assert_eq!(
                kv.get("DEPLOYMENT:docs.example.com").await.unwrap(),
                Some("dpl_1".to_string())
            );

            kv.put("DEPLOYMENT:docs.example.com", "dpl_2".to_string())
                .await
                .unwrap();
            assert_eq!(
                kv.get("DEPLOYMENT:docs.example.com").await.unwrap(),
                Some("dpl_2".to_string())
            );
        });
    }

    #[test]
    fn test_delete() {
        tokio_test::block_on(async {
            let kv = MemoryKv::new();
            kv.put("LOCK:prj_1", "{}".to_string()).await.unwrap();
            kv.delete("LOCK:prj_1").await.unwrap();
            assert_eq!(kv.get("LOCK:prj_1").await.unwrap(), None);

            // Deleting an absent key is a no-op
            kv.delete("LOCK:prj_1").await.unwrap();
        });
    }
}

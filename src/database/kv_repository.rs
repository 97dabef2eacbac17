//! MongoDB-backed key-value store with a read-through cache.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use mongodb::Collection;
use mongodb::bson::doc;
use serde_json::Value;
use tracing::debug;

use super::Database;
use super::models::KvEntry;
use super::store::KvStore;
use crate::cache::{CacheConfig, TypedCache};

/// Repository backing the `KvStore` capability.
pub struct KvRepository {
    collection: Collection<KvEntry>,
    cache: TypedCache<String, Value>,
}

impl KvRepository {
    pub fn new(db: &Database) -> Self {
        let cache = TypedCache::new(
            "kv_entries",
            CacheConfig::with_capacity(5_000).ttl(Duration::from_secs(600)), // 10 minutes
        );

        Self {
            collection: db.collection("kv"),
            cache,
        }
    }
}

#[async_trait]
impl KvStore for KvRepository {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = key.to_string();
        if let Some(value) = self.cache.get(&key) {
            debug!("KV cache hit for {}", key);
            return Ok(Some(value));
        }

        let found = self.collection.find_one(doc! { "_id": key.as_str() }).await?;
        let value = match found {
            Some(entry) => entry.decode()?,
            None => return Ok(None),
        };

        self.cache.insert(key, value.clone());
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let entry = KvEntry::new(key, &value)?;
        let options = mongodb::options::ReplaceOptions::builder()
            .upsert(true)
            .build();

        self.collection
            .replace_one(doc! { "_id": key }, &entry)
            .with_options(options)
            .await?;

        self.cache.insert(key.to_string(), value);
        debug!("Saved KV entry {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let result = self.collection.delete_one(doc! { "_id": key }).await?;
        self.cache.invalidate(&key.to_string());
        debug!("Removed KV entry {}: {}", key, result.deleted_count > 0);
        Ok(())
    }
}

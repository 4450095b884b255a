// src/services/redis_service.rs
use crate::errors::ShelfScanError;
use crate::models::*;
use crate::services::EntryStore;
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use uuid::Uuid;

const DEFAULT_NAMESPACE: &str = "stock";

/// Inventory entries kept in Redis. Each entry is a JSON document at
/// `{ns}:item:{id}` and the sorted set `{ns}:items` records insertion order,
/// scored by the `{ns}:seq` counter.
pub struct RedisEntryStore {
    conn: ConnectionManager,
    namespace: String,
}

impl RedisEntryStore {
    pub async fn new(redis_url: &str) -> Result<Self, ShelfScanError> {
        Self::with_namespace(redis_url, DEFAULT_NAMESPACE).await
    }

    pub async fn with_namespace(
        redis_url: &str,
        namespace: impl Into<String>,
    ) -> Result<Self, ShelfScanError> {
        let client = Client::open(redis_url)?;
        let mut conn = ConnectionManager::new(client).await?;

        // Test connection
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        Ok(Self {
            conn,
            namespace: namespace.into(),
        })
    }

    fn entry_key(&self, id: &str) -> String {
        format!("{}:item:{}", self.namespace, id)
    }

    fn index_key(&self) -> String {
        format!("{}:items", self.namespace)
    }

    fn sequence_key(&self) -> String {
        format!("{}:seq", self.namespace)
    }

    async fn fetch(&self, id: &Uuid) -> Result<Option<InventoryEntry>, ShelfScanError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.entry_key(&id.to_string())).await?;
        value
            .map(|v| serde_json::from_str(&v).map_err(ShelfScanError::from))
            .transpose()
    }
}

#[async_trait]
impl EntryStore for RedisEntryStore {
    async fn list(&self) -> Result<Vec<InventoryEntry>, ShelfScanError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrevrange(self.index_key(), 0, -1).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| self.entry_key(id)).collect();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&keys)
            .query_async(&mut conn)
            .await?;

        values
            .into_iter()
            .flatten()
            .map(|v| serde_json::from_str(&v).map_err(ShelfScanError::from))
            .collect()
    }

    async fn insert(&self, entry: NewInventoryEntry) -> Result<InventoryEntry, ShelfScanError> {
        let entry = entry.into_entry(Uuid::new_v4(), Utc::now());
        let value = serde_json::to_string(&entry)?;

        let mut conn = self.conn.clone();
        let _: () = conn.set(self.entry_key(&entry.id.to_string()), value).await?;
        let seq: i64 = conn.incr(self.sequence_key(), 1).await?;
        let _: () = conn.zadd(self.index_key(), entry.id.to_string(), seq).await?;

        Ok(entry)
    }

    async fn update(&self, id: Uuid, update: &EntryUpdate) -> Result<InventoryEntry, ShelfScanError> {
        update.validate()?;
        let not_found = || ShelfScanError::NotFound(format!("stock entry {}", id));

        let mut entry = self.fetch(&id).await?.ok_or_else(not_found)?;
        update.apply_to(&mut entry);
        let value = serde_json::to_string(&entry)?;

        // XX only overwrites an existing key, so a concurrent delete wins.
        let mut conn = self.conn.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(self.entry_key(&id.to_string()))
            .arg(value)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        written.ok_or_else(not_found)?;

        Ok(entry)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ShelfScanError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.entry_key(&id.to_string())).await?;
        let _: () = conn.zrem(self.index_key(), id.to_string()).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ShelfScanError> {
        let mut conn = self.conn.clone();
        let ids: Vec<String> = conn.zrange(self.index_key(), 0, -1).await?;

        let mut keys: Vec<String> = ids.iter().map(|id| self.entry_key(id)).collect();
        keys.push(self.index_key());
        keys.push(self.sequence_key());
        let _: () = conn.del(keys).await?;

        Ok(())
    }
}

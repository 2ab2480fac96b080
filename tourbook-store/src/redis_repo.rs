use std::sync::Arc;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;
use tourbook_core::repository::DraftStore;
use tourbook_core::StoreError;
use tracing::{debug, warn};

/// Draft records kept in Redis, one JSON string per record.
///
/// Keys look like `draft:{namespace}:{record}`. Every save is a single `SET`,
/// so a record is always replaced as a whole.
#[derive(Clone)]
pub struct RedisDraftStore {
    client: redis::Client,
    namespace: String,
    ttl_seconds: u64,
}

impl RedisDraftStore {
    pub fn new(connection_string: &str, ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self {
            client,
            namespace: "default".to_string(),
            ttl_seconds,
        })
    }

    fn key(&self, name: &str) -> String {
        format!("draft:{}:{}", self.namespace, name)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

fn backend(err: redis::RedisError) -> StoreError {
    warn!("Redis draft store error: {}", err);
    StoreError::Backend(err.to_string())
}

#[async_trait]
impl DraftStore for RedisDraftStore {
    async fn save(&self, name: &str, record: Value) -> Result<(), StoreError> {
        let payload = serde_json::to_string(&record).map_err(|e| StoreError::Malformed {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        let mut conn = self.connection().await?;
        let key = self.key(name);
        if self.ttl_seconds > 0 {
            conn.set_ex::<_, _, ()>(&key, payload, self.ttl_seconds)
                .await
                .map_err(backend)?;
        } else {
            conn.set::<_, _, ()>(&key, payload).await.map_err(backend)?;
        }
        debug!("Draft record saved: {}", key);
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Value>, StoreError> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.key(name)).await.map_err(backend)?;
        raw.map(|s| {
            serde_json::from_str(&s).map_err(|e| StoreError::Malformed {
                name: name.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
    }

    async fn clear(&self, name: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.key(name)).await.map_err(backend)?;
        Ok(())
    }

    fn scoped(&self, namespace: &str) -> Arc<dyn DraftStore> {
        Arc::new(Self {
            client: self.client.clone(),
            namespace: namespace.to_string(),
            ttl_seconds: self.ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        let store = RedisDraftStore::new("redis://127.0.0.1/", 60).unwrap();
        assert_eq!(store.key("pendingBooking"), "draft:default:pendingBooking");

        let scoped = RedisDraftStore {
            namespace: "tab-9".to_string(),
            ..store
        };
        assert_eq!(scoped.key("currentBooking"), "draft:tab-9:currentBooking");
    }
}

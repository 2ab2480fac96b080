use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tourbook_core::repository::DraftStore;
use tourbook_core::StoreError;

/// Process-local draft store. Namespaces share one map.
#[derive(Clone, Default)]
pub struct MemoryDraftStore {
    namespace: String,
    records: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.namespace, name)
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn save(&self, name: &str, record: Value) -> Result<(), StoreError> {
        self.records.write().await.insert(self.key(name), record);
        Ok(())
    }

    async fn load(&self, name: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.records.read().await.get(&self.key(name)).cloned())
    }

    async fn clear(&self, name: &str) -> Result<(), StoreError> {
        self.records.write().await.remove(&self.key(name));
        Ok(())
    }

    fn scoped(&self, namespace: &str) -> Arc<dyn DraftStore> {
        Arc::new(Self {
            namespace: namespace.to_string(),
            records: self.records.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tourbook_core::repository::{load_record, save_record, PENDING_BOOKING};

    #[tokio::test]
    async fn test_save_replaces_whole_record() {
        let store = MemoryDraftStore::new();
        store
            .save(PENDING_BOOKING, json!({ "a": 1, "b": 2 }))
            .await
            .unwrap();
        store.save(PENDING_BOOKING, json!({ "a": 3 })).await.unwrap();

        let record = store.load(PENDING_BOOKING).await.unwrap().unwrap();
        assert_eq!(record, json!({ "a": 3 }));

        store.clear(PENDING_BOOKING).await.unwrap();
        assert!(store.load(PENDING_BOOKING).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let root = MemoryDraftStore::new();
        let first = root.scoped("tab-1");
        let second = root.scoped("tab-2");

        save_record(first.as_ref(), "bookerInfo", &json!({ "first_name": "Ana" }))
            .await
            .unwrap();

        let other: Option<Value> = load_record(second.as_ref(), "bookerInfo").await.unwrap();
        assert!(other.is_none());

        let again = root.scoped("tab-1");
        let mine: Option<Value> = load_record(again.as_ref(), "bookerInfo").await.unwrap();
        assert_eq!(mine, Some(json!({ "first_name": "Ana" })));
    }
}

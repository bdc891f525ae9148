//! In-memory `KvBackend`.
// 中文: 基于内存的 `KvBackend` 实现。

use super::errors::StoreError;
use super::traits::{Item, ItemStream, KvBackend};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};

/// A backend that keeps items in a concurrent hash map.
///
/// Contents are lost when the process exits. Used for `memory://` endpoints
/// and in tests.
///
/// 中文: 将条目保存在并发哈希表中的后端，进程退出后数据丢失。
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: DashMap<String, Item>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn put_item(&self, key: &str, item: Item) -> Result<(), StoreError> {
        self.items.insert(key.to_owned(), item);
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        Ok(self.items.get(key).map(|entry| entry.value().clone()))
    }

    async fn scan_items(&self) -> Result<ItemStream, StoreError> {
        // Snapshot so no shard lock is held while the caller consumes.
        let snapshot: Vec<Item> = self.items.iter().map(|e| e.value().clone()).collect();
        Ok(stream::iter(snapshot.into_iter().map(Ok)).boxed())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn item(id: &str) -> Item {
        Item::from([("id".to_owned(), id.to_owned())])
    }

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let backend = MemoryBackend::new();
        assert!(backend.get_item("a").await.unwrap().is_none());

        backend.put_item("a", item("a")).await.unwrap();
        let mut updated = item("a");
        updated.insert("name".into(), "second".into());
        backend.put_item("a", updated.clone()).await.unwrap();

        assert_eq!(backend.get_item("a").await.unwrap(), Some(updated));
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_returns_everything() {
        let backend = MemoryBackend::new();
        for key in ["a", "b", "c"] {
            backend.put_item(key, item(key)).await.unwrap();
        }
        let mut ids: Vec<String> = backend
            .scan_items()
            .await
            .unwrap()
            .map_ok(|i| i["id"].clone())
            .try_collect()
            .await
            .unwrap();
        ids.sort();
        assert_eq!(ids, ["a", "b", "c"]);
    }
}

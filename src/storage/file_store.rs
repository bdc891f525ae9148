//! JSON file storage implementation for `KvBackend`.
// 中文: `KvBackend` 的 JSON 文件存储实现。

use super::errors::StoreError;
use super::traits::{Item, ItemStream, KvBackend};
use crate::common::utils::{atomic_write, open_lock_file};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk layout: `{"items": {"<key>": {"<attr>": "<value>", ...}}}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    items: BTreeMap<String, Item>,
}

/// A backend that keeps every item in one pretty-printed JSON file.
///
/// The file only ever holds sealed secrets, so it is stored as plain JSON.
/// Each put runs as one blocking task that holds an exclusive advisory lock
/// on `<path>.lock` across read-modify-write, then replaces the file through
/// a unique temporary file and a rename. Writers in other processes and
/// other instances on the same path are therefore serialised, and a put
/// whose caller stops waiting still runs to completion.
///
/// 中文: 将所有条目保存在一个格式化 JSON 文件中的后端。
///
/// 每次写入在一个阻塞任务中完成：持有 `<path>.lock` 上的排他建议锁，
/// 读取、修改后通过唯一临时文件加重命名替换原文件。跨进程、跨实例的写入因此被串行化。
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Creates a backend over `path`. The file is created on first write.
    /// 中文: 创建一个指向 `path` 的后端，文件在首次写入时创建。
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e.into()),
        }
    }
}

fn load_blocking(path: &Path) -> Result<Document, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
        Err(e) => Err(e.into()),
    }
}

/// Inserts one item under the file lock. Returns the item count written.
fn put_locked(path: &Path, key: String, item: Item) -> Result<usize, StoreError> {
    let mut lock = fd_lock::RwLock::new(open_lock_file(path)?);
    let _guard = lock.write()?;

    let mut document = load_blocking(path)?;
    document.items.insert(key, item);
    let json = serde_json::to_vec_pretty(&document)?;
    atomic_write(path, &json)?;
    Ok(document.items.len())
}

#[async_trait]
impl KvBackend for JsonFileBackend {
    async fn put_item(&self, key: &str, item: Item) -> Result<(), StoreError> {
        let path = self.path.clone();
        let key = key.to_owned();
        let items = tokio::task::spawn_blocking(move || put_locked(&path, key, item))
            .await
            .map_err(|e| StoreError::Unavailable(format!("vault file writer failed: {e}")))??;
        debug!(path = %self.path.display(), items, "vault file written");
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        let mut document = self.load().await?;
        Ok(document.items.remove(key))
    }

    async fn scan_items(&self) -> Result<ItemStream, StoreError> {
        let document = self.load().await?;
        Ok(stream::iter(document.items.into_values().map(Ok)).boxed())
    }

    fn name(&self) -> &'static str {
        "json-file"
    }
}

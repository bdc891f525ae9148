//! Traits for abstracting key-value storage backends.
// 中文: 用于抽象键值存储后端的 Trait。

use super::errors::StoreError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::BTreeMap;

/// One stored item: attribute name to string value.
pub type Item = BTreeMap<String, String>;

/// Items produced by a scan, in no particular order.
pub type ItemStream = BoxStream<'static, Result<Item, StoreError>>;

/// Defines the capability a storage backend must offer the vault.
///
/// A backend is a flat table of string-keyed items. It knows nothing about
/// records, sealing or encoding; the [`VaultStore`](super::VaultStore)
/// adapter maps records onto items. Implementations must be safe to call
/// from many tasks at once.
///
/// 中文: 定义了存储后端必须向保险库提供的能力。
///
/// 后端是一个以字符串为键的扁平表，对记录、封印和编码一无所知；
/// 记录与条目之间的映射由 `VaultStore` 适配器负责。实现必须支持并发调用。
#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    /// Stores `item` under `key`, replacing anything already there.
    ///
    /// 中文: 以 `key` 存储 `item`，覆盖已有条目。
    async fn put_item(&self, key: &str, item: Item) -> Result<(), StoreError>;

    /// Fetches the item under `key`, or `None` if there is none.
    ///
    /// 中文: 读取 `key` 对应的条目；不存在时返回 `None`。
    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError>;

    /// Streams every item. The stream may be consumed lazily; an `Err` item
    /// means the scan cannot continue.
    ///
    /// 中文: 以流的形式返回全部条目。出现 `Err` 表示扫描无法继续。
    async fn scan_items(&self) -> Result<ItemStream, StoreError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

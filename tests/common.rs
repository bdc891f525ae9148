//!
//! 集成测试的通用辅助函数
//!
#![allow(dead_code)]

use async_trait::async_trait;
use personal_vault::prelude::*;
use personal_vault::storage::{Item, ItemStream, StoreError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn secret(text: &str) -> SecretString {
    SecretString::from(text.to_owned())
}

pub fn new_secret(name: &str, description: Option<&str>, text: &str) -> NewSecret {
    NewSecret::new(name, description.map(str::to_owned), secret(text))
}

/// Wraps a [`MemoryBackend`] and counts every backend call.
#[derive(Default)]
pub struct CountingBackend {
    pub inner: MemoryBackend,
    pub puts: AtomicUsize,
    pub gets: AtomicUsize,
    pub scans: AtomicUsize,
}

impl CountingBackend {
    pub fn calls(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
            + self.gets.load(Ordering::SeqCst)
            + self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvBackend for CountingBackend {
    async fn put_item(&self, key: &str, item: Item) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put_item(key, item).await
    }

    async fn get_item(&self, key: &str) -> Result<Option<Item>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(key).await
    }

    async fn scan_items(&self) -> Result<ItemStream, StoreError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.inner.scan_items().await
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// A backend whose calls never complete.
pub struct StalledBackend;

#[async_trait]
impl KvBackend for StalledBackend {
    async fn put_item(&self, _key: &str, _item: Item) -> Result<(), StoreError> {
        futures::future::pending().await
    }

    async fn get_item(&self, _key: &str) -> Result<Option<Item>, StoreError> {
        futures::future::pending().await
    }

    async fn scan_items(&self) -> Result<ItemStream, StoreError> {
        futures::future::pending().await
    }

    fn name(&self) -> &'static str {
        "stalled"
    }
}

/// A backend that is always unreachable.
pub struct DownBackend;

#[async_trait]
impl KvBackend for DownBackend {
    async fn put_item(&self, _key: &str, _item: Item) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn get_item(&self, _key: &str) -> Result<Option<Item>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn scan_items(&self) -> Result<ItemStream, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &'static str {
        "down"
    }
}

/// A vault over a fresh counting backend with a random key.
pub fn counting_vault() -> (VaultService, Arc<CountingBackend>) {
    let backend = Arc::new(CountingBackend::default());
    let key = MasterKey::generate().expect("key generation");
    (VaultService::with_backend(backend.clone(), key), backend)
}

//! Maps vault records onto backend items.
// 中文: 将保险库记录映射为后端条目。

use super::errors::StoreError;
use super::traits::{Item, KvBackend};
use crate::error::{Result, VaultError};
use crate::vault::{RecordId, VaultMetadata, VaultRecord};
use futures::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const ATTR_ID: &str = "id";
pub const ATTR_NAME: &str = "name";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_SECRET: &str = "secret";

/// Listing stream. A corrupt row yields an `Err` and the scan moves on; a
/// backend failure or cancellation yields an `Err` and ends the stream.
pub type MetadataStream = BoxStream<'static, Result<VaultMetadata>>;

/// Record-level view over a [`KvBackend`].
///
/// Every call takes the caller's [`CancellationToken`]. When it fires before
/// the backend answers, the call returns [`StoreError::Cancelled`] and the
/// in-flight backend future is dropped.
#[derive(Clone)]
pub struct VaultStore {
    backend: Arc<dyn KvBackend>,
}

impl VaultStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Inserts or replaces the item keyed by `record.id`.
    pub async fn put(&self, record: &VaultRecord, cancel: &CancellationToken) -> Result<()> {
        let key = record.id.to_string();
        let item = record_to_item(record);
        cancellable(cancel, self.backend.put_item(&key, item)).await?;
        Ok(())
    }

    /// Fetches one record. A missing key is [`VaultError::NotFound`].
    pub async fn get(&self, id: &RecordId, cancel: &CancellationToken) -> Result<VaultRecord> {
        let key = id.to_string();
        match cancellable(cancel, self.backend.get_item(&key)).await? {
            Some(item) => Ok(item_to_record(&key, item)?),
            None => Err(VaultError::NotFound(*id)),
        }
    }

    /// Lists `{id, name}` for every stored record, consumed lazily.
    pub async fn scan_all(&self, cancel: &CancellationToken) -> Result<MetadataStream> {
        let rows = cancellable(cancel, self.backend.scan_items()).await?;
        debug!(backend = self.backend.name(), "scan started");

        let state = ScanState {
            rows,
            cancel: cancel.clone(),
            done: false,
        };
        let stream = stream::unfold(state, |mut state| async move {
            if state.done {
                return None;
            }
            let next = tokio::select! {
                biased;
                _ = state.cancel.cancelled() => Some(Err(StoreError::Cancelled)),
                row = state.rows.next() => row,
            };
            match next {
                None => None,
                Some(Ok(item)) => {
                    let result = item_to_metadata(item).map_err(|e| {
                        warn!(error = %e, "skipping corrupt record in scan");
                        VaultError::from(e)
                    });
                    Some((result, state))
                }
                Some(Err(e)) => {
                    state.done = true;
                    Some((Err(VaultError::from(e)), state))
                }
            }
        });
        Ok(stream.boxed())
    }
}

struct ScanState {
    rows: super::traits::ItemStream,
    cancel: CancellationToken,
    done: bool,
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = std::result::Result<T, StoreError>>,
) -> std::result::Result<T, StoreError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(StoreError::Cancelled),
        result = operation => result,
    }
}

fn record_to_item(record: &VaultRecord) -> Item {
    let mut item = Item::new();
    item.insert(ATTR_ID.to_owned(), record.id.to_string());
    item.insert(ATTR_NAME.to_owned(), record.name.clone());
    if let Some(description) = &record.description {
        item.insert(ATTR_DESCRIPTION.to_owned(), description.clone());
    }
    item.insert(ATTR_SECRET.to_owned(), record.sealed_secret.clone());
    item
}

fn corrupt(key: &str, reason: impl Into<String>) -> StoreError {
    StoreError::CorruptRecord {
        key: key.to_owned(),
        reason: reason.into(),
    }
}

fn take_attr(item: &mut Item, key: &str, attr: &str) -> std::result::Result<String, StoreError> {
    item.remove(attr)
        .ok_or_else(|| corrupt(key, format!("missing attribute `{attr}`")))
}

fn parse_id(key: &str, raw: &str) -> std::result::Result<RecordId, StoreError> {
    RecordId::parse(raw).map_err(|_| corrupt(key, format!("invalid id {raw:?}")))
}

fn item_to_record(key: &str, mut item: Item) -> std::result::Result<VaultRecord, StoreError> {
    let id = parse_id(key, &take_attr(&mut item, key, ATTR_ID)?)?;
    if id.to_string() != key {
        return Err(corrupt(key, format!("stored under a different id ({id})")));
    }
    Ok(VaultRecord {
        id,
        name: take_attr(&mut item, key, ATTR_NAME)?,
        description: item.remove(ATTR_DESCRIPTION),
        sealed_secret: take_attr(&mut item, key, ATTR_SECRET)?,
    })
}

fn item_to_metadata(item: Item) -> std::result::Result<VaultMetadata, StoreError> {
    let key = item
        .get(ATTR_ID)
        .cloned()
        .unwrap_or_else(|| "<unknown>".to_owned());
    let raw_id = item
        .get(ATTR_ID)
        .ok_or_else(|| corrupt(&key, format!("missing attribute `{ATTR_ID}`")))?;
    let id = parse_id(&key, raw_id)?;
    let name = item
        .get(ATTR_NAME)
        .cloned()
        .ok_or_else(|| corrupt(&key, format!("missing attribute `{ATTR_NAME}`")))?;
    Ok(VaultMetadata { id, name })
}

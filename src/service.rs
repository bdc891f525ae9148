//! Vault service: validation, sealing and storage behind the three user
//! operations.
//!
//! 中文: 保险库服务，组合输入校验、封印与存储，对外提供保存、列出和读取三个操作。

use crate::codec;
use crate::error::{Result, VaultError};
use crate::keys::MasterKey;
use crate::storage::{KvBackend, MetadataStream, StoreError, VaultStore};
use crate::symmetric::AesGcmSystem;
use crate::symmetric::errors::CryptoError;
use crate::vault::{NewSecret, RecordId, VaultRecord};
use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use zeroize::Zeroize;

/// The vault. Cheap to clone; clones share the store and the master key.
///
/// The key is fixed for the lifetime of the service and is only ever read,
/// so concurrent requests need no coordination here.
#[derive(Clone)]
pub struct VaultService {
    store: VaultStore,
    key: Arc<MasterKey>,
}

impl VaultService {
    pub fn new(store: VaultStore, key: MasterKey) -> Self {
        Self {
            store,
            key: Arc::new(key),
        }
    }

    pub fn with_backend(backend: Arc<dyn KvBackend>, key: MasterKey) -> Self {
        Self::new(VaultStore::new(backend), key)
    }

    /// Seals `input.secret` and stores it under a new identifier.
    ///
    /// Blank names and empty secrets are rejected before anything is sealed
    /// or stored. An empty description is stored as no description.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn save(&self, input: NewSecret, cancel: &CancellationToken) -> Result<RecordId> {
        validate_new_secret(&input)?;

        let sealed = AesGcmSystem::seal(input.secret.expose_secret().as_bytes(), &self.key)?;
        let record = VaultRecord {
            id: RecordId::generate(),
            name: input.name,
            description: input.description.filter(|d| !d.is_empty()),
            sealed_secret: codec::encode(&sealed),
        };

        self.store.put(&record, cancel).await?;
        info!(id = %record.id, backend = self.store.backend_name(), "secret saved");
        Ok(record.id)
    }

    /// Streams `{id, name}` for every stored record without unsealing
    /// anything.
    #[instrument(skip_all)]
    pub async fn retrieve_all(&self, cancel: &CancellationToken) -> Result<MetadataStream> {
        self.store.scan_all(cancel).await
    }

    /// Validates `id`, fetches the record and returns its plaintext.
    ///
    /// Malformed identifiers never reach the store.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn retrieve_by_id(&self, id: &str, cancel: &CancellationToken) -> Result<SecretString> {
        let id = RecordId::parse(id)?;
        let record = self.store.get(&id, cancel).await?;

        let sealed = codec::decode(&record.sealed_secret)?;
        let mut plaintext = AesGcmSystem::unseal(&sealed, &self.key)?;
        let bytes = std::mem::take(&mut *plaintext);
        let secret = String::from_utf8(bytes).map_err(|e| {
            e.into_bytes().zeroize();
            CryptoError::InvalidUtf8
        })?;

        debug!("secret unsealed");
        Ok(SecretString::from(secret))
    }

    /// Confirms the backend answers a scan. Does not touch secret material.
    #[instrument(skip_all)]
    pub async fn health(&self, cancel: &CancellationToken) -> Result<()> {
        let mut rows = self.store.scan_all(cancel).await?;
        // Pull one row so a lazily failing backend is noticed; a corrupt row
        // still proves the backend is reachable.
        match rows.next().await {
            None | Some(Ok(_)) => Ok(()),
            Some(Err(VaultError::Store(StoreError::CorruptRecord { .. }))) => Ok(()),
            Some(Err(e)) => Err(e),
        }
    }
}

fn validate_new_secret(input: &NewSecret) -> Result<()> {
    if input.name.trim().is_empty() {
        return Err(VaultError::Validation("name must not be empty".to_owned()));
    }
    if input.secret.expose_secret().is_empty() {
        return Err(VaultError::Validation("secret must not be empty".to_owned()));
    }
    Ok(())
}

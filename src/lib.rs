//! # Personal Vault: sealed storage for personal secrets
//!
//! `personal-vault` keeps named secrets (passwords, tokens) in a key-value
//! store, sealed under a single master key. Only sealed text ever reaches
//! the store; plaintext exists only in memory, inside zeroize-on-drop
//! buffers, for the duration of a request.
//!
//! ## Core Concepts
//!
//! - **`MasterKey`**: 256-bit key derived once from an operator passphrase
//!   with PBKDF2-HMAC-SHA256 and persisted (hex) in the configuration file.
//! - **`AesGcmSystem`**: seals a secret as `nonce ‖ ciphertext ‖ tag` with
//!   AES-256-GCM and a fresh random nonce per call.
//! - **`codec`**: standard base64 text form of sealed bytes.
//! - **`VaultStore` / `KvBackend`**: record mapping over a pluggable
//!   key-value backend (in-memory or JSON file).
//! - **`VaultService`**: `save`, `retrieve_all` and `retrieve_by_id`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use personal_vault::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> personal_vault::Result<()> {
//! let key = StaticKeyProvider::new(MasterKey::generate()?).obtain()?;
//! let vault = VaultService::with_backend(Arc::new(MemoryBackend::new()), key);
//! let cancel = CancellationToken::new();
//!
//! let id = vault
//!     .save(NewSecret::new("mail", None, SecretString::from("hunter2".to_owned())), &cancel)
//!     .await?;
//! let secret = vault.retrieve_by_id(&id.to_string(), &cancel).await?;
//! assert_eq!(secret.expose_secret(), "hunter2");
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod common;
pub mod error;
pub mod keys;
pub mod service;
pub mod storage;
pub mod symmetric;
pub mod vault;

pub use error::{Result, VaultError, VaultErrorKind};
pub use keys::MasterKey;
pub use service::VaultService;

/// The version of the `personal-vault` crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// --- Prelude ---
// The types most callers need.
pub mod prelude {
    pub use crate::codec::SealedSecret;
    pub use crate::common::{AppConfig, ConfigStore};
    pub use crate::error::{VaultError, VaultErrorKind};
    pub use crate::keys::{
        ConfigKeyProvider, FixedPassphrase, KeyMaterialProvider, MasterKey, PassphraseSource,
        StaticKeyProvider, StdinPassphrase,
    };
    pub use crate::service::VaultService;
    pub use crate::storage::{KvBackend, MemoryBackend, VaultStore, backend_from_endpoint};
    pub use crate::symmetric::AesGcmSystem;
    pub use crate::vault::{NewSecret, RecordId, SaveResponse, VaultMetadata};
    pub use secrecy::{ExposeSecret, SecretString};
    pub use tokio_util::sync::CancellationToken;
}

//! Defines the top-level error type for the `personal-vault` crate.

use crate::codec::EncodingError;
use crate::common::errors::ConfigError;
use crate::storage::StoreError;
use crate::symmetric::errors::CryptoError;
use crate::vault::RecordId;
use thiserror::Error;

/// The main error type for the `personal-vault` crate.
///
/// Every vault operation returns this type. Messages never contain
/// plaintext secrets or key material.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unable to find the record {0}")]
    NotFound(RecordId),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Coarse classification of [`VaultError`], for callers that map errors onto
/// a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultErrorKind {
    Validation,
    NotFound,
    Encoding,
    Crypto,
    Store,
    Config,
}

impl VaultError {
    pub fn kind(&self) -> VaultErrorKind {
        match self {
            VaultError::Validation(_) => VaultErrorKind::Validation,
            VaultError::NotFound(_) => VaultErrorKind::NotFound,
            VaultError::Encoding(_) => VaultErrorKind::Encoding,
            VaultError::Crypto(_) => VaultErrorKind::Crypto,
            VaultError::Store(_) => VaultErrorKind::Store,
            VaultError::Config(_) => VaultErrorKind::Config,
        }
    }

    /// HTTP-style status code: 400 for bad input, 404 for a missing record,
    /// 500 for everything else.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            VaultErrorKind::Validation => 400,
            VaultErrorKind::NotFound => 404,
            _ => 500,
        }
    }

    /// Whether the failure is on the vault's side rather than the caller's.
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

pub type Result<T> = std::result::Result<T, VaultError>;

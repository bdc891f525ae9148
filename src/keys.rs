//! Master key material.
//!
//! The vault seals every record under one symmetric key. This module holds
//! the in-memory representation of that key ([`MasterKey`]), the PBKDF2
//! derivation that produces it from an operator passphrase ([`kdf`]), and the
//! providers that obtain it once at process start ([`provider`]).
//!
//! 中文: 主密钥材料。保险库用同一把对称密钥封印所有记录；该密钥只存在于进程内存中，
//! 持久化形式只有配置文件里的十六进制文本。

pub mod kdf;
pub mod passphrase;
pub mod provider;

pub use self::kdf::{KdfParams, derive_key, generate_salt};
pub use self::passphrase::{FixedPassphrase, PassphraseSource, StdinPassphrase};
pub use self::provider::{ConfigKeyProvider, KeyMaterialProvider, StaticKeyProvider};

use crate::common::config::ENV_SECRET_CHECK;
use crate::common::errors::ConfigError;
use crate::symmetric::errors::CryptoError;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, TryRngCore};
use secrecy::{CloneableSecret, ExposeSecret, SecretBox, SecretString};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

type HmacSha256 = Hmac<Sha256>;

/// Length of the master key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

const KEY_CHECK_LABEL: &[u8] = b"personal-vault master key check v1";

/// 主密钥字节的 Newtype 包装，以实现 `CloneableSecret`。
#[derive(Clone, Default, Zeroize)]
struct KeyBytes([u8; KEY_SIZE]);

impl CloneableSecret for KeyBytes {}

/// The process-wide symmetric key used for every seal and unseal.
///
/// The bytes live in a zeroize-on-drop [`SecretBox`]; `Debug` never prints
/// them. Share one instance behind an `Arc` rather than cloning it per
/// request.
#[derive(Clone)]
pub struct MasterKey(SecretBox<KeyBytes>);

impl MasterKey {
    /// Builds a key from raw bytes, rejecting anything that is not exactly
    /// [`KEY_SIZE`] long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() != KEY_SIZE {
            return Err(ConfigError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        Ok(Self::init_with(|k| k.copy_from_slice(bytes)))
    }

    /// Decodes the hex form kept in configuration.
    pub fn from_hex(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = Zeroizing::new(
            hex::decode(encoded.trim())
                .map_err(|e| ConfigError::InvalidKey(format!("not valid hex: {e}")))?,
        );
        Self::from_slice(&bytes)
    }

    /// Generates a random key from the OS CSPRNG.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut bytes = Box::new(KeyBytes::default());
        OsRng.try_fill_bytes(&mut bytes.0)?;
        Ok(Self(SecretBox::new(bytes)))
    }

    /// Hex encoding for persistence. The returned string is itself secret.
    pub fn to_hex(&self) -> SecretString {
        SecretString::from(hex::encode(self.expose_bytes()))
    }

    /// Borrows the raw key bytes for the duration of a cipher call.
    pub fn expose_bytes(&self) -> &[u8] {
        &self.0.expose_secret().0
    }

    /// Hex HMAC-SHA256 of a fixed label under this key.
    ///
    /// Stored next to the salt so that a key re-derived from a passphrase can
    /// be compared with the one that sealed existing records. It reveals
    /// nothing about the key itself.
    pub fn check_value(&self) -> Result<String, ConfigError> {
        Ok(hex::encode(self.label_mac()?.finalize().into_bytes()))
    }

    /// Constant-time comparison against a stored [`check_value`](Self::check_value).
    pub fn matches_check_value(&self, encoded: &str) -> Result<bool, ConfigError> {
        let expected = hex::decode(encoded.trim()).map_err(|e| ConfigError::InvalidValue {
            key: ENV_SECRET_CHECK,
            reason: e.to_string(),
        })?;
        Ok(self.label_mac()?.verify_slice(&expected).is_ok())
    }

    fn label_mac(&self) -> Result<HmacSha256, ConfigError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.expose_bytes())
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;
        mac.update(KEY_CHECK_LABEL);
        Ok(mac)
    }

    /// Runs `fill` against a zeroed, heap-allocated key buffer, so key bytes
    /// are never copied through the stack.
    pub(crate) fn init_with(fill: impl FnOnce(&mut [u8; KEY_SIZE])) -> Self {
        let mut bytes = Box::new(KeyBytes::default());
        fill(&mut bytes.0);
        Self(SecretBox::new(bytes))
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

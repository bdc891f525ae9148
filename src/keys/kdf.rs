//! PBKDF2-HMAC-SHA256 key derivation for the master key.
//!
//! Parameters: 32-byte random salt, 600 000 iterations by default, 32-byte
//! output. Configured iteration counts below [`MIN_ITERATIONS`] are refused.
use super::{KEY_SIZE, MasterKey};
use crate::common::errors::ConfigError;
use crate::common::config::ENV_KDF_ITERATIONS;
use pbkdf2::pbkdf2_hmac;
use rand_core::{OsRng, TryRngCore};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

/// Length of the random salt in bytes.
pub const SALT_SIZE: usize = 32;

/// Iteration count used when configuration does not name one.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// Lowest iteration count accepted from configuration.
pub const MIN_ITERATIONS: u32 = 100_000;

/// 密钥派生参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl KdfParams {
    /// Validates an iteration count read from configuration.
    pub fn new(iterations: u32) -> Result<Self, ConfigError> {
        if iterations < MIN_ITERATIONS {
            return Err(ConfigError::InvalidValue {
                key: ENV_KDF_ITERATIONS,
                reason: format!("{iterations} is below the minimum of {MIN_ITERATIONS}"),
            });
        }
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Generate a random 32-byte salt.
pub fn generate_salt() -> Result<[u8; SALT_SIZE], ConfigError> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.try_fill_bytes(&mut salt)?;
    Ok(salt)
}

/// Derive the 32-byte master key from a passphrase and salt.
///
/// Deterministic: the same passphrase, salt and parameters always produce the
/// same key. The derived bytes go straight into the key's secret box.
pub fn derive_key(passphrase: &SecretString, salt: &[u8], params: &KdfParams) -> MasterKey {
    MasterKey::init_with(|out: &mut [u8; KEY_SIZE]| {
        pbkdf2_hmac::<Sha256>(
            passphrase.expose_secret().as_bytes(),
            salt,
            params.iterations,
            out,
        )
    })
}

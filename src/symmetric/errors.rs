use thiserror::Error;

/// 封印/解封过程中可能出现的密码学错误。
///
/// Every variant is a per-request failure. None of them carries plaintext.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid key size: expected {expected}, got {actual}")]
    InvalidKeySize { expected: usize, actual: usize },

    #[error("Random number generation failed: {0}")]
    Rng(#[from] rand_core::OsError),

    #[error("Encryption failed")]
    EncryptionFailed,

    /// The authentication tag did not verify. The ciphertext, the nonce or the
    /// key is wrong.
    #[error("Decryption failed: authentication tag mismatch")]
    AuthenticationFailed,

    #[error("Sealed secret is malformed or truncated: {0}")]
    MalformedCiphertext(String),

    #[error("Decrypted secret is not valid UTF-8")]
    InvalidUtf8,
}

//! Text form of sealed secrets.
//!
//! Sealed bytes are stored as standard, padded base64 (RFC 4648 alphabet).
//! The codec does no authentication of its own; a decoded value is only
//! trusted after [`AesGcmSystem::unseal`](crate::symmetric::AesGcmSystem::unseal)
//! verifies its tag.
use base64::{Engine, engine::general_purpose};
use std::fmt;
use thiserror::Error;

/// Stored text could not be decoded back into sealed bytes.
#[derive(Error, Debug)]
#[error("Sealed secret is not valid base64: {0}")]
pub struct EncodingError(#[from] base64::DecodeError);

/// `nonce ‖ ciphertext ‖ tag` as produced by the AEAD.
///
/// Not secret by itself, but it is bound to one master key and must not be
/// altered; any change is caught at unseal time.
#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecret(Vec<u8>);

impl SealedSecret {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SealedSecret({} bytes)", self.0.len())
    }
}

/// 将封印后的字节编码为文本
pub fn encode(sealed: &SealedSecret) -> String {
    general_purpose::STANDARD.encode(sealed.as_bytes())
}

/// 将文本解码为封印后的字节
pub fn decode(text: &str) -> Result<SealedSecret, EncodingError> {
    Ok(SealedSecret(general_purpose::STANDARD.decode(text)?))
}

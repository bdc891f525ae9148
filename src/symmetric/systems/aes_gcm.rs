//! AES-256-GCM 对称加密实现
use crate::codec::SealedSecret;
use crate::keys::MasterKey;
use crate::symmetric::errors::CryptoError;
use crate::symmetric::traits::SymmetricCryptographicSystem;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand_core::{OsRng, TryRngCore};
use zeroize::Zeroizing;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;

/// AES-256-GCM 对称加密系统
///
/// Output layout is `nonce(12) ‖ ciphertext ‖ tag(16)` with no length prefix
/// or version byte. A fresh random nonce is drawn from the OS CSPRNG on every
/// call.
#[derive(Debug)]
pub struct AesGcmSystem;

impl AesGcmSystem {
    fn cipher(key: &MasterKey) -> Result<Aes256Gcm, CryptoError> {
        let bytes = key.expose_bytes();
        Aes256Gcm::new_from_slice(bytes).map_err(|_| CryptoError::InvalidKeySize {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })
    }

    /// 封印一段明文，得到可直接编码存储的 [`SealedSecret`]。
    pub fn seal(plaintext: &[u8], key: &MasterKey) -> Result<SealedSecret, CryptoError> {
        Self::encrypt(key, plaintext, None).map(SealedSecret::from_bytes)
    }

    /// 解封并校验 [`SealedSecret`]。返回的缓冲区在释放时清零。
    pub fn unseal(
        sealed: &SealedSecret,
        key: &MasterKey,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        Self::decrypt(key, sealed.as_bytes(), None)
    }
}

impl SymmetricCryptographicSystem for AesGcmSystem {
    const KEY_SIZE: usize = KEY_SIZE;
    const NONCE_SIZE: usize = NONCE_SIZE;
    const TAG_SIZE: usize = TAG_SIZE;
    type Error = CryptoError;

    fn encrypt(
        key: &MasterKey,
        plaintext: &[u8],
        additional_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, Self::Error> {
        let cipher = Self::cipher(key)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.try_fill_bytes(&mut nonce_bytes)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut output = Vec::with_capacity(NONCE_SIZE + plaintext.len() + TAG_SIZE);
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(plaintext);

        let tag = cipher
            .encrypt_in_place_detached(
                nonce,
                additional_data.unwrap_or_default(),
                &mut output[NONCE_SIZE..],
            )
            .map_err(|_| CryptoError::EncryptionFailed)?;
        output.extend_from_slice(&tag);
        Ok(output)
    }

    fn decrypt(
        key: &MasterKey,
        ciphertext: &[u8],
        additional_data: Option<&[u8]>,
    ) -> Result<Zeroizing<Vec<u8>>, Self::Error> {
        if ciphertext.len() < Self::min_ciphertext_len() {
            return Err(CryptoError::MalformedCiphertext(format!(
                "need at least {} bytes, got {}",
                Self::min_ciphertext_len(),
                ciphertext.len()
            )));
        }
        let cipher = Self::cipher(key)?;
        let (nonce_bytes, body) = ciphertext.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        // 标签校验失败时缓冲区随 Zeroizing 一起清零。
        let mut buffer = Zeroizing::new(body.to_vec());
        cipher
            .decrypt_in_place(nonce, additional_data.unwrap_or_default(), &mut *buffer)
            .map_err(|_| CryptoError::AuthenticationFailed)?;
        Ok(buffer)
    }
}

use crate::keys::MasterKey;
use zeroize::Zeroizing;

/// 对称认证加密系统的公共特征
///
/// A system seals plaintext into a self-contained `nonce ‖ ciphertext ‖ tag`
/// byte string. Nonces are generated inside `encrypt`; callers cannot supply
/// one, so two calls under the same key never share a nonce by accident.
pub trait SymmetricCryptographicSystem: Sized {
    /// 密钥的期望长度（以字节为单位）。
    const KEY_SIZE: usize;

    /// Nonce 长度（以字节为单位），位于密文开头。
    const NONCE_SIZE: usize;

    /// 认证标签长度（以字节为单位），位于密文末尾。
    const TAG_SIZE: usize;

    /// 该系统的错误类型。
    type Error: std::error::Error + Send + Sync + 'static;

    /// 使用主密钥加密数据。
    fn encrypt(
        key: &MasterKey,
        plaintext: &[u8],
        additional_data: Option<&[u8]>,
    ) -> Result<Vec<u8>, Self::Error>;

    /// 使用主密钥解密并验证数据。
    fn decrypt(
        key: &MasterKey,
        ciphertext: &[u8],
        additional_data: Option<&[u8]>,
    ) -> Result<Zeroizing<Vec<u8>>, Self::Error>;

    /// Smallest well-formed ciphertext: a nonce and a tag around an empty
    /// message.
    fn min_ciphertext_len() -> usize {
        Self::NONCE_SIZE + Self::TAG_SIZE
    }
}


//! 对称加密核心模块
//!
//! The vault uses a single authenticated cipher. [`traits`] describes the
//! shape every system follows; [`systems`] holds the AES-256-GCM
//! implementation used to seal records.

pub mod errors;
pub mod systems;
pub mod traits;

pub use self::errors::CryptoError;
pub use self::systems::aes_gcm::AesGcmSystem;
pub use self::traits::SymmetricCryptographicSystem;

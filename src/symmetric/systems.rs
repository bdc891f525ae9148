//! # Symmetric Cryptographic Systems Module
//!
//! Each system implements [`SymmetricCryptographicSystem`](super::traits::SymmetricCryptographicSystem)
//! and owns its own wire layout.
//!
//! ---
//!
//! # 对称加密系统模块
//!
//! 每个对称加密系统都应实现 `SymmetricCryptographicSystem` 特征，并自行定义密文布局。

pub mod aes_gcm;

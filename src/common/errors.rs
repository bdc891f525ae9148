use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration or obtaining the master key.
///
/// These surface at process start. A vault that cannot obtain its key does
/// not serve requests.
///
/// 中文: 加载配置或获取主密钥时产生的错误，只在启动阶段出现。
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("Failed to write configuration file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Invalid master key: {0}")]
    InvalidKey(String),

    #[error("Failed to read passphrase: {0}")]
    Passphrase(#[source] std::io::Error),

    #[error("Passphrase must not be empty")]
    EmptyPassphrase,

    /// The passphrase produced a key other than the one recorded by
    /// `SECRET_CHECK`. Records sealed under the original key would not open.
    #[error("Passphrase does not match the stored key check; nothing was written")]
    KeyCheckMismatch,

    #[error("Random number generation failed: {0}")]
    Rng(#[from] rand_core::OsError),

    #[error("Unsupported storage endpoint: {0}")]
    UnsupportedEndpoint(String),
}

//!
//! # 通用配置模块
//!
//! Configuration lives in a dotenv-style file (`app.env` by default) and may be
//! overridden key by key through process environment variables. The file is
//! also where the master key is persisted after the first passphrase
//! derivation, so it is always written with owner-only permissions.
//!
//! 中文: 配置保存在 dotenv 风格的文件中，可被同名环境变量覆盖。首次派生主密钥后，
//! 密钥以十六进制形式写回该文件。
//!
use super::errors::ConfigError;
use super::utils::atomic_write;
use crate::keys::{KdfParams, MasterKey};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "app.env";

/// Storage endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "file://vault.json";

pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL_DYNAMODB";
pub const ENV_SECRET: &str = "SECRET";
pub const ENV_SECRET_SALT: &str = "SECRET_SALT";
pub const ENV_KDF_ITERATIONS: &str = "KDF_ITERATIONS";
pub const ENV_SECRET_CHECK: &str = "SECRET_CHECK";

const KNOWN_KEYS: [&str; 5] = [
    ENV_ENDPOINT,
    ENV_SECRET,
    ENV_SECRET_SALT,
    ENV_KDF_ITERATIONS,
    ENV_SECRET_CHECK,
];

/// 应用配置快照
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Storage endpoint, e.g. `file://vault.json` or `memory://`.
    pub endpoint_url: String,
    /// Hex-encoded master key. Sole source of truth when present.
    pub secret: Option<SecretString>,
    /// Hex-encoded PBKDF2 salt from the first derivation.
    pub secret_salt: Option<String>,
    /// PBKDF2 iteration count. Falls back to [`KdfParams::default`].
    pub kdf_iterations: Option<u32>,
    /// Hex HMAC identifying the derived key, see [`MasterKey::check_value`].
    pub secret_check: Option<String>,
}

impl AppConfig {
    fn from_entries(entries: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            entries
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        let kdf_iterations = match non_empty(ENV_KDF_ITERATIONS) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|e| ConfigError::InvalidValue {
                key: ENV_KDF_ITERATIONS,
                reason: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            endpoint_url: non_empty(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            secret: non_empty(ENV_SECRET).map(SecretString::from),
            secret_salt: non_empty(ENV_SECRET_SALT),
            kdf_iterations,
            secret_check: non_empty(ENV_SECRET_CHECK),
        })
    }
}

/// Key material written back after the first derivation.
pub struct KeyMaterialRecord<'a> {
    pub key: &'a MasterKey,
    pub salt: &'a [u8],
    pub params: KdfParams,
}

/// Reads and writes the configuration file.
///
/// `load` merges the file with process environment variables (environment
/// wins). `persist_key_material` only touches the file.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
    use_process_env: bool,
}

impl ConfigStore {
    /// Store backed by `path`, with environment overrides enabled.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            use_process_env: true,
        }
    }

    /// Store that ignores the process environment entirely.
    pub fn file_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            use_process_env: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the current configuration. A missing file is not an error.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut entries: BTreeMap<String, String> = self.read_entries()?.into_iter().collect();
        if self.use_process_env {
            for key in KNOWN_KEYS {
                if let Ok(value) = std::env::var(key) {
                    debug!(key, "configuration value overridden by environment");
                    entries.insert(key.to_owned(), value);
                }
            }
        }
        AppConfig::from_entries(&entries)
    }

    /// Writes the master key, its salt, the iteration count and the key check
    /// value into the file.
    ///
    /// Other entries are preserved in their original order. A missing
    /// endpoint is filled in with [`DEFAULT_ENDPOINT`] so later runs see a
    /// complete file. Comments in the existing file are not retained.
    pub fn persist_key_material(&self, material: &KeyMaterialRecord<'_>) -> Result<(), ConfigError> {
        let mut entries = self.read_entries()?;
        let secret = material.key.to_hex();
        let check = material.key.check_value()?;

        if !entries.iter().any(|(k, _)| k == ENV_ENDPOINT) {
            upsert(&mut entries, ENV_ENDPOINT, DEFAULT_ENDPOINT.to_owned());
        }
        upsert(&mut entries, ENV_SECRET, secret.expose_secret().to_owned());
        upsert(&mut entries, ENV_SECRET_SALT, hex::encode(material.salt));
        upsert(
            &mut entries,
            ENV_KDF_ITERATIONS,
            material.params.iterations().to_string(),
        );
        upsert(&mut entries, ENV_SECRET_CHECK, check);

        let mut contents = Zeroizing::new(String::new());
        for (key, value) in &entries {
            let _ = writeln!(contents, "{}={}", key, quote_value(value));
        }
        // Entries hold a copy of the key too.
        for (_, value) in entries.iter_mut() {
            zeroize::Zeroize::zeroize(value);
        }

        atomic_write(&self.path, contents.as_bytes()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "master key material persisted");
        Ok(())
    }

    fn read_entries(&self) -> Result<Vec<(String, String)>, ConfigError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let read_err = |source| ConfigError::Read {
            path: self.path.clone(),
            source,
        };
        dotenvy::from_path_iter(&self.path)
            .map_err(read_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_err)
    }
}

fn upsert(entries: &mut Vec<(String, String)>, key: &str, value: String) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key.to_owned(), value)),
    }
}

fn quote_value(value: &str) -> String {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_.:/@+=".contains(c));
    if plain {
        value.to_owned()
    } else if !value.contains('\'') {
        // Single quotes disable `$VAR` substitution on the way back in.
        format!("'{value}'")
    } else {
        // Inside double quotes `\`, `"` and `$` must all be escaped.
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('$', "\\$");
        format!("\"{escaped}\"")
    }
}

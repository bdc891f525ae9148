//! Master key providers.
//!
//! A provider is consulted once, before any request is served. The key it
//! returns is then shared, read-only, by every request.
//!
//! 中文: 主密钥提供者。进程启动时调用一次，之后所有请求共享同一把只读密钥。
use super::kdf::{self, KdfParams};
use super::passphrase::PassphraseSource;
use super::MasterKey;
use crate::common::config::{ConfigStore, KeyMaterialRecord, ENV_SECRET_SALT};
use crate::common::errors::ConfigError;
use secrecy::ExposeSecret;
use tracing::{info, instrument, warn};
use zeroize::Zeroizing;

/// Obtains the master key for this process.
pub trait KeyMaterialProvider {
    fn obtain(&self) -> Result<MasterKey, ConfigError>;
}

/// Hands out a key that already exists in memory.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    key: MasterKey,
}

impl StaticKeyProvider {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }
}

impl KeyMaterialProvider for StaticKeyProvider {
    fn obtain(&self) -> Result<MasterKey, ConfigError> {
        Ok(self.key.clone())
    }
}

/// Reads the key from configuration, deriving and persisting it on first run.
///
/// Resolution order:
/// 1. `SECRET` present: decode it and return. Nothing is written.
/// 2. `SECRET` absent, `SECRET_SALT` present: prompt, re-derive with the
///    stored salt. If `SECRET_CHECK` is present the derived key must match
///    it, otherwise [`ConfigError::KeyCheckMismatch`] and nothing is written.
///    Persist `SECRET`.
/// 3. Neither present: prompt, draw a fresh salt, derive, persist
///    `SECRET`, `SECRET_SALT`, `KDF_ITERATIONS` and `SECRET_CHECK`.
pub struct ConfigKeyProvider<P> {
    store: ConfigStore,
    passphrase: P,
}

impl<P: PassphraseSource> ConfigKeyProvider<P> {
    pub fn new(store: ConfigStore, passphrase: P) -> Self {
        Self { store, passphrase }
    }
}

impl<P: PassphraseSource> KeyMaterialProvider for ConfigKeyProvider<P> {
    #[instrument(skip_all, fields(path = %self.store.path().display()))]
    fn obtain(&self) -> Result<MasterKey, ConfigError> {
        let config = self.store.load()?;

        if let Some(secret) = &config.secret {
            info!("using persisted master key");
            return MasterKey::from_hex(secret.expose_secret());
        }

        let params = match config.kdf_iterations {
            Some(iterations) => KdfParams::new(iterations)?,
            None => KdfParams::default(),
        };

        let salt = match &config.secret_salt {
            Some(encoded) => {
                info!("no persisted key; re-deriving with stored salt");
                Zeroizing::new(hex::decode(encoded).map_err(|e| ConfigError::InvalidValue {
                    key: ENV_SECRET_SALT,
                    reason: e.to_string(),
                })?)
            }
            None => {
                info!("no persisted key material; deriving a new master key");
                Zeroizing::new(kdf::generate_salt()?.to_vec())
            }
        };
        if salt.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: ENV_SECRET_SALT,
                reason: "salt must not be empty".to_owned(),
            });
        }

        let passphrase = self.passphrase.read_passphrase()?;
        let key = kdf::derive_key(&passphrase, &salt, &params);

        if config.secret_salt.is_some() {
            match &config.secret_check {
                Some(check) => {
                    if !key.matches_check_value(check)? {
                        warn!("derived key does not match stored key check");
                        return Err(ConfigError::KeyCheckMismatch);
                    }
                }
                None => warn!("no key check stored; cannot confirm the passphrase"),
            }
        }

        self.store.persist_key_material(&KeyMaterialRecord {
            key: &key,
            salt: &salt,
            params,
        })?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::{ENV_KDF_ITERATIONS, ENV_SECRET, ENV_SECRET_CHECK};
    use crate::keys::kdf::MIN_ITERATIONS;
    use crate::keys::passphrase::FixedPassphrase;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Counts prompts so tests can assert whether the operator was asked.
    struct CountingPassphrase {
        inner: FixedPassphrase,
        calls: AtomicUsize,
    }

    impl CountingPassphrase {
        fn new(pass: &str) -> Self {
            Self {
                inner: FixedPassphrase::new(SecretString::from(pass.to_owned())),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PassphraseSource for CountingPassphrase {
        fn read_passphrase(&self) -> Result<secrecy::SecretString, ConfigError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.read_passphrase()
        }
    }

    fn fast_config(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("app.env");
        std::fs::write(
            &path,
            format!("AWS_ENDPOINT_URL_DYNAMODB=memory://\n{ENV_KDF_ITERATIONS}={MIN_ITERATIONS}\n"),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_static_provider() {
        let key = MasterKey::generate().unwrap();
        let provider = StaticKeyProvider::new(key.clone());
        assert_eq!(provider.obtain().unwrap().expose_bytes(), key.expose_bytes());
    }

    #[test]
    fn test_first_run_derives_and_persists() {
        let dir = tempdir().unwrap();
        let path = fast_config(dir.path());
        let store = ConfigStore::file_only(&path);
        let provider = ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("pw"));

        let key = provider.obtain().unwrap();
        assert_eq!(provider.passphrase.calls.load(Ordering::SeqCst), 1);

        let config = store.load().unwrap();
        assert_eq!(
            config.secret.as_ref().map(|s| s.expose_secret().to_owned()),
            Some(key.to_hex().expose_secret().to_owned())
        );
        let salt = config.secret_salt.expect("salt persisted");
        assert_eq!(hex::decode(salt).unwrap().len(), kdf::SALT_SIZE);
        assert_eq!(config.kdf_iterations, Some(MIN_ITERATIONS));
        assert_eq!(config.endpoint_url, "memory://");
    }

    #[test]
    fn test_second_run_reuses_persisted_key_without_prompt() {
        let dir = tempdir().unwrap();
        let path = fast_config(dir.path());
        let store = ConfigStore::file_only(&path);

        let first = ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("pw"))
            .obtain()
            .unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        let provider = ConfigKeyProvider::new(store, CountingPassphrase::new("different"));
        let second = provider.obtain().unwrap();

        assert_eq!(first.expose_bytes(), second.expose_bytes());
        assert_eq!(provider.passphrase.calls.load(Ordering::SeqCst), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_missing_secret_rederives_with_stored_salt() {
        let dir = tempdir().unwrap();
        let path = fast_config(dir.path());
        let store = ConfigStore::file_only(&path);

        let original = ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("pw"))
            .obtain()
            .unwrap();

        // Drop SECRET but keep the salt and the check.
        strip_secret(&path);

        let again = ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("pw"))
            .obtain()
            .unwrap();
        assert_eq!(original.expose_bytes(), again.expose_bytes());
        assert!(store.load().unwrap().secret.is_some());
    }

    fn strip_secret(path: &std::path::Path) {
        let text = std::fs::read_to_string(path).unwrap();
        let stripped: String = text
            .lines()
            .filter(|l| !l.starts_with(&format!("{ENV_SECRET}=")))
            .map(|l| format!("{l}\n"))
            .collect();
        std::fs::write(path, stripped).unwrap();
    }

    #[test]
    fn test_wrong_passphrase_on_rederive_is_refused() {
        let dir = tempdir().unwrap();
        let path = fast_config(dir.path());
        let store = ConfigStore::file_only(&path);

        ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("pw"))
            .obtain()
            .unwrap();
        strip_secret(&path);
        let before = std::fs::read_to_string(&path).unwrap();
        assert!(before.contains(&format!("{ENV_SECRET_CHECK}=")));

        let provider = ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("typo"));
        assert!(matches!(provider.obtain(), Err(ConfigError::KeyCheckMismatch)));
        assert_eq!(provider.passphrase.calls.load(Ordering::SeqCst), 1);
        // Nothing was persisted for the wrong key.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(store.load().unwrap().secret.is_none());
    }

    #[test]
    fn test_rederive_without_stored_check_still_works() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.env");
        std::fs::write(
            &path,
            format!("{ENV_KDF_ITERATIONS}={MIN_ITERATIONS}\nSECRET_SALT={}\n", "ab".repeat(32)),
        )
        .unwrap();
        let store = ConfigStore::file_only(&path);

        let key = ConfigKeyProvider::new(store.clone(), CountingPassphrase::new("pw"))
            .obtain()
            .unwrap();
        // The check is written alongside the key from now on.
        assert_eq!(
            store.load().unwrap().secret_check,
            Some(key.check_value().unwrap())
        );
    }

    #[test]
    fn test_persisted_secret_is_sole_source_of_truth() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.env");
        let key = MasterKey::generate().unwrap();
        std::fs::write(
            &path,
            format!(
                "SECRET={}\nSECRET_SALT=00ff\n",
                key.to_hex().expose_secret()
            ),
        )
        .unwrap();

        let provider =
            ConfigKeyProvider::new(ConfigStore::file_only(&path), CountingPassphrase::new("x"));
        let loaded = provider.obtain().unwrap();
        assert_eq!(loaded.expose_bytes(), key.expose_bytes());
        assert_eq!(provider.passphrase.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_persisted_secret_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.env");
        std::fs::write(&path, "SECRET=not-hex\n").unwrap();

        let provider =
            ConfigKeyProvider::new(ConfigStore::file_only(&path), CountingPassphrase::new("x"));
        assert!(matches!(provider.obtain(), Err(ConfigError::InvalidKey(_))));
    }

    #[test]
    fn test_low_iteration_config_rejected_before_prompt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.env");
        std::fs::write(&path, "KDF_ITERATIONS=1\n").unwrap();

        let provider =
            ConfigKeyProvider::new(ConfigStore::file_only(&path), CountingPassphrase::new("x"));
        assert!(matches!(
            provider.obtain(),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(provider.passphrase.calls.load(Ordering::SeqCst), 0);
        assert!(!std::fs::read_to_string(&path).unwrap().contains("SECRET"));
    }

    #[test]
    fn test_empty_passphrase_persists_nothing() {
        let dir = tempdir().unwrap();
        let path = fast_config(dir.path());
        let before = std::fs::read_to_string(&path).unwrap();

        let provider =
            ConfigKeyProvider::new(ConfigStore::file_only(&path), CountingPassphrase::new(""));
        assert!(matches!(provider.obtain(), Err(ConfigError::EmptyPassphrase)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }
}

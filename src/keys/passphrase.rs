//! Where the operator passphrase comes from.
use crate::common::errors::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use std::io::{self, BufRead, Write};
use zeroize::Zeroizing;

/// A source of the operator passphrase used for first-run key derivation.
pub trait PassphraseSource: Send + Sync {
    fn read_passphrase(&self) -> Result<SecretString, ConfigError>;
}

/// Prompts on stderr and reads one line from stdin.
///
/// The trailing line ending is stripped; anything else, including inner
/// whitespace, is part of the passphrase.
#[derive(Debug, Clone)]
pub struct StdinPassphrase {
    prompt: String,
}

impl StdinPassphrase {
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Default for StdinPassphrase {
    fn default() -> Self {
        Self::with_prompt("Please enter your password: ")
    }
}

impl PassphraseSource for StdinPassphrase {
    fn read_passphrase(&self) -> Result<SecretString, ConfigError> {
        let mut stderr = io::stderr().lock();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|_| stderr.flush())
            .map_err(ConfigError::Passphrase)?;

        let mut line = Zeroizing::new(String::new());
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(ConfigError::Passphrase)?;
        if read == 0 {
            return Err(ConfigError::Passphrase(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed before a passphrase was entered",
            )));
        }
        non_empty(line.trim_end_matches(['\r', '\n']))
    }
}

/// A passphrase known up front, e.g. supplied by a test or a secret manager.
#[derive(Debug, Clone)]
pub struct FixedPassphrase(SecretString);

impl FixedPassphrase {
    pub fn new(passphrase: SecretString) -> Self {
        Self(passphrase)
    }
}

impl PassphraseSource for FixedPassphrase {
    fn read_passphrase(&self) -> Result<SecretString, ConfigError> {
        non_empty(self.0.expose_secret())
    }
}

fn non_empty(passphrase: &str) -> Result<SecretString, ConfigError> {
    if passphrase.is_empty() {
        return Err(ConfigError::EmptyPassphrase);
    }
    Ok(SecretString::from(passphrase.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_passphrase() {
        let source = FixedPassphrase::new(SecretString::from("correct horse".to_owned()));
        let pass = source.read_passphrase().unwrap();
        assert_eq!(pass.expose_secret(), "correct horse");
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        let source = FixedPassphrase::new(SecretString::from(String::new()));
        assert!(matches!(
            source.read_passphrase(),
            Err(ConfigError::EmptyPassphrase)
        ));
    }
}

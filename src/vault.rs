//! Vault domain types: record identifiers, stored records, listing metadata
//! and the request/response shapes of the save operation.
use crate::error::VaultError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the canonical hyphenated identifier text.
const ID_TEXT_LEN: usize = 36;

/// 记录的唯一标识符（UUID v4，小写连字符形式）
///
/// Identifiers are generated at save time and validated before any lookup
/// reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(Uuid);

impl RecordId {
    /// A fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses the `8-4-4-4-12` hex form. Upper-case hex is accepted and
    /// normalised; braced, URN and un-hyphenated forms are not.
    pub fn parse(text: &str) -> Result<Self, VaultError> {
        if text.len() != ID_TEXT_LEN {
            return Err(VaultError::Validation(format!(
                "invalid record id {text:?}: expected a {ID_TEXT_LEN}-character UUID"
            )));
        }
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|e| VaultError::Validation(format!("invalid record id {text:?}: {e}")))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for RecordId {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

/// A stored vault entry. Only `sealed_secret` is confidential, and it is
/// kept in its encoded, sealed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    pub id: RecordId,
    pub name: String,
    pub description: Option<String>,
    /// Base64 text of `nonce ‖ ciphertext ‖ tag`.
    pub sealed_secret: String,
}

/// Listing view of a record. Never carries secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultMetadata {
    pub id: RecordId,
    pub name: String,
}

/// 保存请求
///
/// Deserialises from `{"name": ..., "description": ..., "password": ...}`.
/// The secret is held in a [`SecretString`] from the moment it is parsed.
#[derive(Debug, Deserialize)]
pub struct NewSecret {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "password", deserialize_with = "secret_from_string")]
    pub secret: SecretString,
}

fn secret_from_string<'de, D: serde::Deserializer<'de>>(d: D) -> Result<SecretString, D::Error> {
    String::deserialize(d).map(SecretString::from)
}

impl NewSecret {
    pub fn new(name: impl Into<String>, description: Option<String>, secret: SecretString) -> Self {
        Self {
            name: name.into(),
            description,
            secret,
        }
    }
}

/// Result of a successful save, rendered as `path: <id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveResponse {
    pub id: RecordId,
}

impl fmt::Display for SaveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path: {}", self.id)
    }
}

impl Serialize for SaveResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultErrorKind;
    use secrecy::ExposeSecret;

    #[test]
    fn test_generate_is_canonical_and_parses_back() {
        let id = RecordId::generate();
        let text = id.to_string();
        assert_eq!(text.len(), ID_TEXT_LEN);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(RecordId::parse(&text).unwrap(), id);
    }

    #[test]
    fn test_parse_normalises_case() {
        let id = RecordId::parse("6B2B5F4E-0C1D-4E2F-9A3B-4C5D6E7F8091").unwrap();
        assert_eq!(id.to_string(), "6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "not-a-uuid",
            "6b2b5f4e0c1d4e2f9a3b4c5d6e7f8091",
            "{6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091}",
            "6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f809g",
            "6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091 ",
        ] {
            let err = RecordId::parse(bad).unwrap_err();
            assert_eq!(err.kind(), VaultErrorKind::Validation, "{bad:?}");
        }
    }

    #[test]
    fn test_metadata_json_shape() {
        let id = RecordId::parse("6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091").unwrap();
        let meta = VaultMetadata {
            id,
            name: "mail".to_owned(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(
            json,
            r#"{"id":"6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091","name":"mail"}"#
        );
        let back: VaultMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_metadata_rejects_bad_id() {
        let result = serde_json::from_str::<VaultMetadata>(r#"{"id":"nope","name":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_secret_from_json() {
        let req: NewSecret =
            serde_json::from_str(r#"{"name":"mail","password":"hunter2"}"#).unwrap();
        assert_eq!(req.name, "mail");
        assert!(req.description.is_none());
        assert_eq!(req.secret.expose_secret(), "hunter2");
        assert!(!format!("{req:?}").contains("hunter2"));
    }

    #[test]
    fn test_save_response_rendering() {
        let id = RecordId::parse("6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091").unwrap();
        let response = SaveResponse { id };
        assert_eq!(
            response.to_string(),
            "path: 6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091"
        );
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#""path: 6b2b5f4e-0c1d-4e2f-9a3b-4c5d6e7f8091""#
        );
    }
}

//! The storage module, defining how vault records are persisted.
// 中文: 存储模块，定义保险库记录的持久化方式。

pub mod adapter;
pub mod errors;
pub mod memory_store;
pub mod traits;

#[cfg(feature = "file-backend")]
pub mod file_store;

pub use self::adapter::{MetadataStream, VaultStore};
pub use self::errors::StoreError;
pub use self::memory_store::MemoryBackend;
pub use self::traits::{Item, ItemStream, KvBackend};

#[cfg(feature = "file-backend")]
pub use self::file_store::JsonFileBackend;

use crate::common::errors::ConfigError;
use std::sync::Arc;
use tracing::warn;

/// Builds the backend named by a configured endpoint URL.
///
/// * `memory://` keeps records in process memory only.
/// * `file://<path>` keeps records in a JSON file (feature `file-backend`).
///
/// Anything else, including remote document-store URLs, is rejected.
pub fn backend_from_endpoint(endpoint: &str) -> Result<Arc<dyn KvBackend>, ConfigError> {
    let endpoint = endpoint.trim();
    if endpoint == "memory://" {
        warn!("using in-memory storage; records are lost on exit");
        return Ok(Arc::new(MemoryBackend::new()));
    }

    #[cfg(feature = "file-backend")]
    if let Some(path) = endpoint.strip_prefix("file://") {
        if path.is_empty() {
            return Err(ConfigError::UnsupportedEndpoint(format!(
                "{endpoint} (missing file path)"
            )));
        }
        tracing::info!(path, "using JSON file storage");
        return Ok(Arc::new(JsonFileBackend::new(path)));
    }

    Err(ConfigError::UnsupportedEndpoint(endpoint.to_owned()))
}

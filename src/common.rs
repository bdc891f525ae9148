//! 通用模块，包含配置、错误类型与文件系统工具函数

pub mod config;
pub mod errors;
pub mod utils;

pub use self::config::{AppConfig, ConfigStore, KeyMaterialRecord};
pub use self::errors::ConfigError;

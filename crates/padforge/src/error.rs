use padforge_cache::{CacheError, DocumentError, ExtractError};
use padforge_device::DeviceError;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("{0}")]
    Extract(#[from] ExtractError),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("slot {0} is outside of 1..=16")]
    InvalidSlot(u8),
    #[error("no cache entry for {0}")]
    NoSuchEntry(String),
}

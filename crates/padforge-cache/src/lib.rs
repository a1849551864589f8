mod archive;
mod document;
mod installation;
mod provider;
mod store;

use thiserror::Error;

pub use archive::{
    ArchiveError, ArchiveOpener, LooseFileArchive, OpenArchive, ProfileArchive,
    DEFAULT_PROFILE_ENTRY,
};
pub use document::{Document, DocumentError, Element, Node};
pub use installation::{GameInstallation, Installation};
pub use provider::{DefaultProfileProvider, ExtractError, Progress};
pub use store::{
    format_size, sanitize_key, CacheInfo, CacheStore, Lookup, CACHE_FILE_SUFFIX,
};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("no cache directory available on this system")]
    NoCacheDir,
}

use std::path::PathBuf;

use thiserror::Error;

use crate::archive::{ArchiveError, ArchiveOpener, OpenArchive, ProfileArchive};
use crate::document::Document;
use crate::installation::Installation;
use crate::store::{CacheInfo, CacheStore, Lookup};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("installation {environment} is not valid")]
    InvalidInstallation { environment: String },
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("default profile not found in {}", archive.display())]
    ProfileNotFound { archive: PathBuf },
}

/// Optional status sink for [`DefaultProfileProvider::get_or_extract`].
pub type Progress<'a> = Option<&'a mut dyn FnMut(&str)>;

/// Supplies the default profile of an installation, from the cache when
/// possible and from the installation's archive otherwise.
pub struct DefaultProfileProvider<O> {
    store: CacheStore,
    opener: O,
}

impl<O: ArchiveOpener> DefaultProfileProvider<O> {
    pub fn new(store: CacheStore, opener: O) -> Self {
        Self { store, opener }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Return the cached document for the installation's cache key, or
    /// extract it from the archive and cache it.
    ///
    /// Invalid installations are rejected before the archive is touched. A
    /// failure to write the cache does not affect the result.
    pub fn get_or_extract<I>(
        &self,
        installation: &I,
        mut progress: Progress<'_>,
    ) -> Result<Document, ExtractError>
    where
        I: Installation + ?Sized,
    {
        let mut report = |status: &str| {
            log::debug!("{status}");
            if let Some(sink) = progress.as_deref_mut() {
                sink(status);
            }
        };

        let key = installation.cache_key();
        report("Checking cache...");
        match self.store.lookup(&key) {
            Lookup::Hit(document) => {
                report("Loaded from cache");
                log::info!("default profile for {key} loaded from cache");
                return Ok(document);
            }
            Lookup::Healed => report("Discarded corrupted cache entry"),
            Lookup::Miss => {}
        }

        if !installation.is_valid() {
            log::warn!(
                "installation {} is not valid, skipping extraction",
                installation.environment()
            );
            return Err(ExtractError::InvalidInstallation {
                environment: installation.environment().to_owned(),
            });
        }

        let archive_path = installation.archive_path();
        report("Opening archive...");
        let mut archive = OpenArchive::open(self.opener.archive_for(archive_path))
            .inspect_err(|e| log::error!("failed to open archive: {e}"))?;
        log::debug!(
            "archive {} has {} entries",
            archive_path.display(),
            archive.entry_count()
        );

        report("Extracting default profile...");
        let Some(document) = archive.extract_default_profile() else {
            log::error!("default profile not found in {}", archive_path.display());
            return Err(ExtractError::ProfileNotFound {
                archive: archive_path.to_owned(),
            });
        };
        drop(archive);

        report("Caching default profile...");
        self.store.put(&key, &document);
        report("Default profile ready");
        log::info!("default profile for {key} extracted");
        Ok(document)
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.store.info()
    }

    pub fn clear_cache(&self) -> usize {
        self.store.clear()
    }
}

use std::fs;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::document::Document;

/// Location of the default profile inside the game data.
pub const DEFAULT_PROFILE_ENTRY: &str = "Data/Libs/Config/defaultProfile.xml";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("not a data directory: {0}")]
    NotADirectory(PathBuf),
}

/// Source of the default profile document.
pub trait ProfileArchive {
    fn open(&mut self) -> Result<(), ArchiveError>;
    /// Number of entries; zero until opened.
    fn entry_count(&self) -> usize;
    fn extract_default_profile(&mut self) -> Option<Document>;
    /// Release the underlying handle. Must be safe to call more than once.
    fn close(&mut self);
}

/// Creates an archive for an installation's archive path.
pub trait ArchiveOpener {
    type Archive: ProfileArchive;

    fn archive_for(&self, path: &Path) -> Self::Archive;
}

impl<F, A> ArchiveOpener for F
where
    F: Fn(&Path) -> A,
    A: ProfileArchive,
{
    type Archive = A;

    fn archive_for(&self, path: &Path) -> A {
        self(path)
    }
}

/// An opened archive that is closed when dropped.
pub struct OpenArchive<A: ProfileArchive> {
    archive: A,
}

impl<A: ProfileArchive> OpenArchive<A> {
    /// Open `archive`. It is closed again if opening fails halfway.
    pub fn open(mut archive: A) -> Result<Self, ArchiveError> {
        if let Err(e) = archive.open() {
            archive.close();
            return Err(e);
        }
        Ok(Self { archive })
    }
}

impl<A: ProfileArchive> Deref for OpenArchive<A> {
    type Target = A;

    fn deref(&self) -> &A {
        &self.archive
    }
}

impl<A: ProfileArchive> DerefMut for OpenArchive<A> {
    fn deref_mut(&mut self) -> &mut A {
        &mut self.archive
    }
}

impl<A: ProfileArchive> Drop for OpenArchive<A> {
    fn drop(&mut self) {
        self.archive.close();
    }
}

/// Archive over an unpacked data directory.
#[derive(Debug)]
pub struct LooseFileArchive {
    root: PathBuf,
    entries: Option<usize>,
}

impl LooseFileArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.entries.is_some()
    }

    fn entry_path(&self, entry: &str) -> PathBuf {
        entry
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

fn count_files(root: &Path) -> Result<usize, ArchiveError> {
    let io_err = |path: &Path, source| ArchiveError::Io {
        path: path.to_owned(),
        source,
    };

    let mut count = 0;
    let mut pending = vec![root.to_owned()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(|e| io_err(&dir, e))? {
            let entry = entry.map_err(|e| io_err(&dir, e))?;
            let file_type = entry.file_type().map_err(|e| io_err(&dir, e))?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                count += 1;
            }
        }
    }
    Ok(count)
}

impl ProfileArchive for LooseFileArchive {
    fn open(&mut self) -> Result<(), ArchiveError> {
        if !self.root.is_dir() {
            return Err(ArchiveError::NotADirectory(self.root.clone()));
        }
        let count = count_files(&self.root)?;
        log::debug!("opened {} with {count} entries", self.root.display());
        self.entries = Some(count);
        Ok(())
    }

    fn entry_count(&self) -> usize {
        self.entries.unwrap_or(0)
    }

    fn extract_default_profile(&mut self) -> Option<Document> {
        if !self.is_open() {
            log::warn!("extract called on a closed archive");
            return None;
        }
        let path = self.entry_path(DEFAULT_PROFILE_ENTRY);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("default profile not readable at {}: {e}", path.display());
                return None;
            }
        };
        match Document::from_bytes(&bytes) {
            Ok(document) => Some(document),
            Err(e) => {
                log::warn!("default profile at {} is malformed: {e}", path.display());
                None
            }
        }
    }

    fn close(&mut self) {
        self.entries = None;
    }
}

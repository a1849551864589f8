use std::path::{Path, PathBuf};

use crate::store::sanitize_key;

/// An installed copy of the game whose default profile is cached.
pub trait Installation {
    /// Environment label, e.g. `LIVE` or `PTU`.
    fn environment(&self) -> &str;
    /// Whether the source archive is present and readable.
    fn is_valid(&self) -> bool;
    fn archive_path(&self) -> &Path;
    /// Deterministic key that changes whenever the installed version does.
    fn cache_key(&self) -> String;
}

/// Installation described by its root directory and installed version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInstallation {
    environment: String,
    root: PathBuf,
    archive: PathBuf,
    version: String,
}

impl GameInstallation {
    /// `archive` is relative to `root`.
    pub fn new(
        environment: impl Into<String>,
        root: impl Into<PathBuf>,
        archive: impl AsRef<Path>,
        version: impl Into<String>,
    ) -> Self {
        let root = root.into();
        let archive = root.join(archive);
        Self {
            environment: environment.into(),
            root,
            archive,
            version: version.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Installation for GameInstallation {
    fn environment(&self) -> &str {
        &self.environment
    }

    fn is_valid(&self) -> bool {
        !self.version.is_empty() && self.archive.exists()
    }

    fn archive_path(&self) -> &Path {
        &self.archive
    }

    fn cache_key(&self) -> String {
        sanitize_key(&format!("{}_{}", self.environment, self.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_follows_version() {
        let a = GameInstallation::new("LIVE", "/games/sc", "Data.p4k", "3.24.1");
        let b = GameInstallation::new("LIVE", "/other/place", "Data.p4k", "3.24.1");
        let c = GameInstallation::new("LIVE", "/games/sc", "Data.p4k", "3.24.2");

        assert_eq!(a.cache_key(), "LIVE_3.24.1");
        assert_eq!(a.cache_key(), b.cache_key());
        assert_ne!(a.cache_key(), c.cache_key());
    }

    #[test]
    fn missing_archive_is_invalid() {
        let inst = GameInstallation::new("PTU", "/definitely/not/here", "Data.p4k", "4.0");
        assert!(!inst.is_valid());
        assert_eq!(inst.archive_path(), Path::new("/definitely/not/here/Data.p4k"));
    }
}

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::CacheError;

/// Suffix shared by every cache file; the part before it is the cache key.
pub const CACHE_FILE_SUFFIX: &str = "_defaultProfile.xml";

const TEMP_SUFFIX: &str = ".tmp";
const CACHE_NAMESPACE: &str = "padforge";
const CACHE_LAYOUT_VERSION: &str = "v1";
const CACHE_SUBDIR: &str = "profiles";
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Outcome of reading a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(Document),
    Miss,
    /// The entry existed but did not parse; it has been removed.
    Healed,
}

/// Summary of the cache directory contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheInfo {
    pub count: usize,
    pub total_bytes: u64,
    pub formatted_size: String,
    pub environment_labels: Vec<String>,
}

/// One XML file per cache key inside a directory this store owns.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at [`CacheStore::default_dir`].
    pub fn open_default() -> Result<Self, CacheError> {
        Ok(Self::new(Self::default_dir()?))
    }

    /// `<user cache dir>/padforge/v1/profiles`.
    pub fn default_dir() -> Result<PathBuf, CacheError> {
        dirs::cache_dir()
            .map(|p| {
                p.join(CACHE_NAMESPACE)
                    .join(CACHE_LAYOUT_VERSION)
                    .join(CACHE_SUBDIR)
            })
            .ok_or(CacheError::NoCacheDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}{CACHE_FILE_SUFFIX}", sanitize_key(key)))
    }

    /// Read an entry. A file that fails to parse is deleted and reported as
    /// [`Lookup::Healed`].
    pub fn lookup(&self, key: &str) -> Lookup {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Lookup::Miss,
            Err(e) => {
                log::warn!("failed to read cache file {}: {e}", path.display());
                return Lookup::Miss;
            }
        };

        match Document::from_bytes(&bytes) {
            Ok(document) => {
                log::debug!("cache hit for {key}");
                Lookup::Hit(document)
            }
            Err(e) => {
                log::warn!(
                    "corrupted cache file {}: {e}; removing it",
                    path.display()
                );
                if let Err(e) = fs::remove_file(&path) {
                    log::warn!("failed to remove {}: {e}", path.display());
                }
                Lookup::Healed
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Document> {
        match self.lookup(key) {
            Lookup::Hit(document) => Some(document),
            Lookup::Miss | Lookup::Healed => None,
        }
    }

    /// Write an entry through a temporary file and a rename, so readers
    /// see either the old file, no file, or the complete new one.
    pub fn write(&self, key: &str, document: &Document) -> Result<PathBuf, CacheError> {
        let content = document.to_pretty_string()?;
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = temp_path(&path);
        let written = write_synced(&tmp, content.as_bytes())
            .and_then(|()| fs::rename(&tmp, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(path)
    }

    /// Like [`CacheStore::write`], but failures are logged and reported as
    /// `false` only.
    pub fn put(&self, key: &str, document: &Document) -> bool {
        match self.write(key, document) {
            Ok(path) => {
                log::debug!("cached default profile at {}", path.display());
                true
            }
            Err(e) => {
                log::warn!("failed to cache default profile for {key}: {e}");
                false
            }
        }
    }

    pub fn exists(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    /// Remove every cache file, including leftovers of interrupted writes.
    /// Returns how many files were removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        for path in self.files(|name| {
            name.ends_with(CACHE_FILE_SUFFIX)
                || name.ends_with(&format!("{CACHE_FILE_SUFFIX}{TEMP_SUFFIX}"))
        }) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::warn!("failed to remove {}: {e}", path.display()),
            }
        }
        log::info!("cleared {removed} cached profile(s)");
        removed
    }

    /// Remove the entry for `key`. Returns whether a file was removed.
    pub fn clear_one(&self, key: &str) -> bool {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => {
                log::warn!("failed to remove {}: {e}", path.display());
                false
            }
        }
    }

    pub fn info(&self) -> CacheInfo {
        let mut info = CacheInfo::default();
        for path in self.files(|name| name.ends_with(CACHE_FILE_SUFFIX)) {
            let Some(label) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(CACHE_FILE_SUFFIX))
            else {
                continue;
            };
            info.count += 1;
            info.total_bytes += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            info.environment_labels.push(label.to_owned());
        }
        info.environment_labels.sort();
        info.formatted_size = format_size(info.total_bytes);
        info
    }

    /// Regular files in the cache directory whose name matches `filter`.
    fn files(&self, filter: impl Fn(&str) -> bool) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("failed to list {}: {e}", self.dir.display());
                return Vec::new();
            }
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| entry.file_name().to_str().is_some_and(&filter))
            .map(|entry| entry.path())
            .collect()
    }
}

/// Replace every character outside `[A-Za-z0-9._-]` so the key stays a
/// single file name.
pub fn sanitize_key(key: &str) -> String {
    if key.is_empty() {
        return "_".to_owned();
    }
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .replace("..", "__")
}

/// Human-friendly size with base 1024, e.g. `1.5 KB`.
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let number = format!("{size:.2}");
    let number = number.trim_end_matches('0').trim_end_matches('.');
    format!("{number} {}", SIZE_UNITS[unit])
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_size_picks_unit_and_trims_zeros() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1000), "1000 B");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_258_291), "1.2 MB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5 GB");
    }

    #[test]
    fn sanitize_key_keeps_file_name_safe() {
        assert_eq!(sanitize_key("LIVE_3.24.1-9381"), "LIVE_3.24.1-9381");
        assert_eq!(sanitize_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_key("a b\\c"), "a_b_c");
        assert_eq!(sanitize_key(""), "_");
    }

    #[test]
    fn temp_path_appends_suffix() {
        let p = temp_path(Path::new("/cache/LIVE_defaultProfile.xml"));
        assert_eq!(p, PathBuf::from("/cache/LIVE_defaultProfile.xml.tmp"));
    }
}

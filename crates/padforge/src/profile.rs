use std::io::Write;
use std::path::Path;

use colored::Colorize;
use padforge_cache::{
    CacheStore, DefaultProfileProvider, Document, Installation, LooseFileArchive,
};

use crate::config::Config;
use crate::error::CliError;
use crate::{print_debug, print_info};

/// Cache store at the configured directory or the user cache directory.
pub(crate) fn store(config: &Config) -> Result<CacheStore, CliError> {
    match &config.cache_dir {
        Some(dir) => Ok(CacheStore::new(dir)),
        None => Ok(CacheStore::open_default()?),
    }
}

/// Resolve the default profile of `installation` and write it to `output`
/// or stdout.
pub(crate) fn show<I: Installation + ?Sized>(
    store: CacheStore,
    installation: &I,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let document = extract(store, installation)?;
    let text = document.to_pretty_string()?;
    match output {
        Some(path) => {
            std::fs::write(path, &text)?;
            print_info!("default profile written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn extract<I: Installation + ?Sized>(
    store: CacheStore,
    installation: &I,
) -> Result<Document, CliError> {
    print_debug!(
        "{} archive at {}",
        installation.environment(),
        installation.archive_path().display()
    );
    let provider =
        DefaultProfileProvider::new(store, |path: &Path| LooseFileArchive::new(path));
    let mut progress = |status: &str| {
        print_info!("{}", status.dimmed());
    };
    Ok(provider.get_or_extract(installation, Some(&mut progress))?)
}

pub(crate) fn info(store: &CacheStore) {
    let info = store.info();
    print_info!("cache directory: {}", store.dir().display());
    print_info!(
        "{} cached profile(s), {}",
        info.count.to_string().bold(),
        info.formatted_size
    );
    for label in &info.environment_labels {
        print_info!("  {label}");
    }
}

pub(crate) fn clear(store: &CacheStore, key: Option<&str>) -> Result<(), CliError> {
    match key {
        Some(key) => {
            if !store.clear_one(key) {
                return Err(CliError::NoSuchEntry(key.to_owned()));
            }
            print_info!("removed cached profile {key}");
        }
        None => {
            let removed = store.clear();
            print_info!("removed {removed} cached file(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use padforge_cache::{Element, GameInstallation, DEFAULT_PROFILE_ENTRY};
    use tempfile::TempDir;

    use super::*;

    fn game_with_profile() -> TempDir {
        let game = TempDir::new().expect("game dir");
        let entry = DEFAULT_PROFILE_ENTRY
            .split('/')
            .fold(game.path().join("Data"), |p, part| p.join(part));
        fs::create_dir_all(entry.parent().expect("has parent")).expect("mkdir");
        fs::write(
            &entry,
            "<profile version=\"1\"><actionmap name=\"seat_general\"/></profile>",
        )
        .expect("write profile");
        game
    }

    #[test]
    fn show_writes_file_and_caches() {
        let game = game_with_profile();
        let cache = TempDir::new().expect("cache dir");
        let installation = GameInstallation::new("LIVE", game.path(), "Data", "3.24.1");
        let output = cache.path().join("out.xml");

        show(CacheStore::new(cache.path().join("profiles")), &installation, Some(&output))
            .expect("profile extracted");

        let written = Document::parse(&fs::read_to_string(&output).expect("written"))
            .expect("well formed");
        assert_eq!(
            written.root().child("actionmap"),
            Some(&Element::new("actionmap").with_attribute("name", "seat_general"))
        );
        let store = CacheStore::new(cache.path().join("profiles"));
        assert!(store.exists(&installation.cache_key()));
    }

    #[test]
    fn show_fails_for_missing_archive() {
        let cache = TempDir::new().expect("cache dir");
        let installation =
            GameInstallation::new("PTU", cache.path().join("nowhere"), "Data", "4.0");
        let result = show(CacheStore::new(cache.path()), &installation, None);
        assert!(matches!(result, Err(CliError::Extract(_))));
    }

    #[test]
    fn clear_unknown_key_is_an_error() {
        let cache = TempDir::new().expect("cache dir");
        let store = CacheStore::new(cache.path());
        assert!(matches!(
            clear(&store, Some("LIVE_1")),
            Err(CliError::NoSuchEntry(_))
        ));
        assert!(clear(&store, None).is_ok());
    }
}

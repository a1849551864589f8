use std::path::{Path, PathBuf};

use padforge_cache::GameInstallation;
use padforge_device::{Axis, AxisSet, Capabilities, SimulatedDriver, SlotId};
use serde::Deserialize;
use thiserror::Error;

const CONFIG_DIR: &str = "padforge";
const CONFIG_FILE_NAME: &str = "padforge.yaml";
const DEFAULT_ARCHIVE: &str = "Data.p4k";

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("yaml deserialize error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("invalid axis: {0}")]
    InvalidAxis(String),
    #[error("invalid slot id: {0}")]
    InvalidSlot(u8),
    #[error("no installation configured for environment {0}")]
    UnknownEnvironment(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1 {
    #[allow(dead_code)]
    version: u8,
    #[serde(default)]
    cache_dir: Option<PathBuf>,
    #[serde(default)]
    slots: Vec<SlotConfig>,
    #[serde(default)]
    installations: Vec<InstallationConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SlotConfig {
    pub id: u8,
    #[serde(default)]
    pub buttons: u8,
    #[serde(default)]
    pub discrete_povs: u8,
    #[serde(default)]
    pub continuous_povs: u8,
    #[serde(default)]
    pub axes: Vec<String>,
    /// Simulate a slot another process holds.
    #[serde(default)]
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InstallationConfig {
    pub environment: String,
    pub root: PathBuf,
    #[serde(default = "default_archive")]
    pub archive: PathBuf,
    pub version: String,
}

fn default_archive() -> PathBuf {
    PathBuf::from(DEFAULT_ARCHIVE)
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Config {
    pub cache_dir: Option<PathBuf>,
    pub slots: Vec<SlotConfig>,
    pub installations: Vec<InstallationConfig>,
}

/// A config with a version.
#[derive(Debug, Clone, Deserialize)]
struct VersionedConfig {
    version: u8,
}

/// Parse yaml config.
pub(crate) fn parse_config(input: &str) -> Result<Config, ConfigError> {
    let raw: VersionedConfig = serde_yaml::from_str(input)?;
    match raw.version {
        1 => {
            let config: ConfigV1 = serde_yaml::from_str(input)?;
            Ok(Config {
                cache_dir: config.cache_dir,
                slots: config.slots,
                installations: config.installations,
            })
        }
        other => Err(ConfigError::UnsupportedVersion(other)),
    }
}

impl Config {
    /// Load `path`, or the default config file when `path` is `None`.
    /// A missing default file yields the default config.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_owned(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read_to_string(&path) {
            Ok(input) => parse_config(&input),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::Io(path, e)),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(CONFIG_DIR).join(CONFIG_FILE_NAME))
    }

    /// Simulated driver laid out like the configured slots. Without any
    /// slots configured, two full-featured sticks are exposed.
    pub fn driver(&self) -> Result<SimulatedDriver, ConfigError> {
        if self.slots.is_empty() {
            let stick = Capabilities {
                buttons: 32,
                discrete_povs: 0,
                continuous_povs: 1,
                axes: AxisSet::all(),
            };
            return Ok(SimulatedDriver::new()
                .with_slot(slot_id(1)?, stick)
                .with_slot(slot_id(2)?, stick));
        }

        let mut driver = SimulatedDriver::new();
        for slot in &self.slots {
            let id = slot_id(slot.id)?;
            let capabilities = slot.capabilities()?;
            driver = if slot.busy {
                driver.with_foreign_slot(id, capabilities)
            } else {
                driver.with_slot(id, capabilities)
            };
        }
        Ok(driver)
    }

    pub fn installation(&self, environment: &str) -> Result<GameInstallation, ConfigError> {
        self.installations
            .iter()
            .find(|i| i.environment.eq_ignore_ascii_case(environment))
            .map(|i| GameInstallation::new(&i.environment, &i.root, &i.archive, &i.version))
            .ok_or_else(|| ConfigError::UnknownEnvironment(environment.to_owned()))
    }
}

impl SlotConfig {
    fn capabilities(&self) -> Result<Capabilities, ConfigError> {
        let axes = self
            .axes
            .iter()
            .map(|a| parse_axis(a))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Capabilities {
            buttons: self.buttons,
            discrete_povs: self.discrete_povs,
            continuous_povs: self.continuous_povs,
            axes: AxisSet::new(&axes),
        })
    }
}

fn slot_id(id: u8) -> Result<SlotId, ConfigError> {
    SlotId::new(id).ok_or(ConfigError::InvalidSlot(id))
}

fn parse_axis(input: &str) -> Result<Axis, ConfigError> {
    Axis::ALL
        .into_iter()
        .find(|a| a.name().eq_ignore_ascii_case(input))
        .ok_or_else(|| ConfigError::InvalidAxis(input.to_owned()))
}

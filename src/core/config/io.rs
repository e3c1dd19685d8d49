use crate::core::config::data::{path_display, Config};
use crate::core::constants::{APP_NAME, CONFIG_PATH_ENV};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Errors that can occur when loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to serialize or write the configuration file.
    Write {
        path: PathBuf,
        source: Box<dyn StdError + Send + Sync>,
    },

    /// No platform configuration directory could be determined.
    NoConfigDir,
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }

    fn write(path: &Path, source: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        ConfigError::Write {
            path: path.to_path_buf(),
            source: source.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write config at {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::NoConfigDir => {
                write!(
                    f,
                    "Could not determine a configuration directory; set {CONFIG_PATH_ENV}"
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Write { source, .. } => Some(source.as_ref()),
            ConfigError::NoConfigDir => None,
        }
    }
}

/// Directory that holds the temp file for an atomic save. It must be on the
/// same filesystem as the target so the final rename succeeds.
fn staging_dir(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

impl Config {
    /// Load from `config_path`; a missing file yields the defaults.
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    /// Write atomically through a temp file in the target directory.
    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let parent = staging_dir(config_path);
        fs::create_dir_all(parent).map_err(|err| ConfigError::write(config_path, err))?;

        let contents =
            toml::to_string_pretty(self).map_err(|err| ConfigError::write(config_path, err))?;
        let mut temp_file =
            NamedTempFile::new_in(parent).map_err(|err| ConfigError::write(config_path, err))?;

        temp_file
            .write_all(contents.as_bytes())
            .and_then(|_| temp_file.as_file_mut().sync_all())
            .map_err(|err| ConfigError::write(config_path, err))?;
        temp_file
            .persist(config_path)
            .map_err(|err| ConfigError::write(config_path, err.error))?;
        Ok(())
    }

    /// `$MINDCHAT_CONFIG` if set, else `config.toml` in the platform config dir.
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let proj_dirs =
            ProjectDirs::from("org", APP_NAME, APP_NAME).ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

use crate::core::config::data::{ColorScheme, Config};
use crate::core::config::io::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

#[derive(Default)]
struct ConfigCacheState {
    config: Option<Config>,
    modified: Option<SystemTime>,
}

/// Settings file handle. Reads are cached and refreshed when the file's
/// modification time changes on disk.
pub struct ConfigStore {
    path: PathBuf,
    state: Mutex<ConfigCacheState>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(ConfigCacheState::default()),
        }
    }

    /// Store at [`Config::default_config_path`].
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(Config::default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        Self::refresh(&self.path, &mut state)?;
        Ok(state.config.clone().unwrap_or_default())
    }

    pub fn persist(&self, config: Config) -> Result<(), ConfigError> {
        config.save_to_path(&self.path)?;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.modified = Self::modified_time(&self.path);
        state.config = Some(config);
        Ok(())
    }

    /// Load, apply `mutator`, and persist the result.
    pub fn mutate<F, T>(&self, mutator: F) -> Result<T, ConfigError>
    where
        F: FnOnce(&mut Config) -> T,
    {
        let mut working = self.load()?;
        let result = mutator(&mut working);
        self.persist(working)?;
        Ok(result)
    }

    pub fn color_scheme(&self) -> Result<ColorScheme, ConfigError> {
        Ok(self.load()?.color_scheme())
    }

    pub fn set_color_scheme(&self, scheme: ColorScheme) -> Result<(), ConfigError> {
        self.mutate(|config| config.theme = Some(scheme))
    }

    /// Flip between light and dark and return the new scheme.
    pub fn toggle_color_scheme(&self) -> Result<ColorScheme, ConfigError> {
        self.mutate(|config| {
            let next = config.color_scheme().toggle();
            config.theme = Some(next);
            next
        })
    }

    fn refresh(path: &Path, state: &mut ConfigCacheState) -> Result<(), ConfigError> {
        let disk_modified = Self::modified_time(path);
        if state.config.is_none() || state.modified != disk_modified {
            let config = Config::load_from_path(path)?;
            state.modified = disk_modified;
            state.config = Some(config);
        }
        Ok(())
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).ok()?.modified().ok()
    }
}

//! Settings management for CLI set/unset commands.
//!
//! Each configurable key has a [`SettingHandler`]. The API key lives in the
//! secret store; everything else lives in the config file.

pub mod error;
pub mod handlers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use std::error::Error;

use crate::core::config::ConfigStore;
use crate::core::constants::API_KEY_SECRET;
use crate::core::config::data::path_display;
use crate::core::secrets::SecretStore;

/// Stores available to setting handlers during set/unset operations.
pub struct SetContext<'a> {
    pub config: &'a ConfigStore,
    pub secrets: &'a dyn SecretStore,
}

/// Trait for handling a configuration setting.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the value. Returns a success message to display.
    fn set(&self, value: &str, ctx: &SetContext<'_>) -> Result<String, SettingError>;

    /// Clear the value. Returns a success message to display.
    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError>;
}

/// Apply `mindchat set <key> <value>`.
pub fn apply_set(
    key: &str,
    value: &str,
    ctx: &SetContext<'_>,
) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    handler.set(value, ctx)
}

/// Apply `mindchat unset <key>`.
pub fn apply_unset(key: &str, ctx: &SetContext<'_>) -> Result<String, SettingError> {
    let registry = SettingRegistry::new();
    let handler = registry
        .get(key)
        .ok_or_else(|| SettingError::UnknownKey(key.to_string()))?;
    handler.unset(ctx)
}

pub fn run_set(
    key: &str,
    value: &str,
    secrets: &dyn SecretStore,
    config: &ConfigStore,
) -> Result<(), Box<dyn Error>> {
    let ctx = SetContext { config, secrets };
    report(apply_set(key, value, &ctx))
}

pub fn run_unset(
    key: &str,
    secrets: &dyn SecretStore,
    config: &ConfigStore,
) -> Result<(), Box<dyn Error>> {
    let ctx = SetContext { config, secrets };
    report(apply_unset(key, &ctx))
}

pub fn show_settings(secrets: &dyn SecretStore, config: &ConfigStore) -> Result<(), Box<dyn Error>> {
    let api_key = match secrets.get(API_KEY_SECRET) {
        Ok(key) => key,
        Err(err) => {
            eprintln!("⚠️  Could not read the API key: {err}");
            None
        }
    };
    println!("Config file: {}", path_display(config.path()));
    config.load()?.print_all(api_key.as_deref());
    Ok(())
}

fn report(result: Result<String, SettingError>) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            err.print();
            std::process::exit(err.exit_code());
        }
    }
}

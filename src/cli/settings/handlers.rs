//! Handlers for each settable key.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::data::{ColorScheme, Config};
use crate::core::constants::API_KEY_SECRET;
use crate::core::secrets::mask_secret;
use crate::utils::url::normalize_base_url;

fn success_set(key: &str, value: &str) -> String {
    format!("✅ Set {key} to: {value}")
}

fn success_unset(key: &str) -> String {
    format!("✅ Unset {key}")
}

fn mutate_config<F>(ctx: &SetContext<'_>, f: F) -> Result<(), SettingError>
where
    F: FnOnce(&mut Config),
{
    ctx.config
        .mutate(f)
        .map_err(|e| SettingError::ConfigError(e.to_string()))
}

fn require_value(
    value: &str,
    hint: &'static str,
    example: &'static str,
) -> Result<String, SettingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SettingError::MissingArgs { hint, example });
    }
    Ok(trimmed.to_string())
}

/// `api-key`, kept in the secret store rather than the config file.
pub struct ApiKeyHandler;

impl SettingHandler for ApiKeyHandler {
    fn key(&self) -> &'static str {
        "api-key"
    }

    fn set(&self, value: &str, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let key = require_value(
            value,
            "To store your Gemini API key, pass it after the setting name:",
            "mindchat set api-key AIza...",
        )?;
        ctx.secrets
            .set(API_KEY_SECRET, &key)
            .map_err(|e| SettingError::SecretError(e.to_string()))?;
        Ok(success_set("api-key", &mask_secret(&key)))
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        ctx.secrets
            .delete(API_KEY_SECRET)
            .map_err(|e| SettingError::SecretError(e.to_string()))?;
        Ok(success_unset("api-key"))
    }
}

pub struct ThemeHandler;

impl SettingHandler for ThemeHandler {
    fn key(&self) -> &'static str {
        "theme"
    }

    fn set(&self, value: &str, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let name = require_value(
            value,
            "To set a theme, specify light or dark:",
            "mindchat set theme dark",
        )?;
        let scheme = name
            .parse::<ColorScheme>()
            .map_err(|reason| SettingError::InvalidValue {
                key: "theme",
                reason,
            })?;
        mutate_config(ctx, |config| config.theme = Some(scheme))?;
        Ok(success_set("theme", scheme.as_str()))
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config(ctx, |config| config.theme = None)?;
        Ok(success_unset("theme"))
    }
}

pub struct ModelHandler;

impl SettingHandler for ModelHandler {
    fn key(&self) -> &'static str {
        "model"
    }

    fn set(&self, value: &str, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let model = require_value(
            value,
            "To set the model, specify its name:",
            "mindchat set model gemini-2.0-flash",
        )?;
        let model = model
            .strip_prefix("models/")
            .unwrap_or(&model)
            .to_string();
        let message = success_set("model", &model);
        mutate_config(ctx, move |config| config.model = Some(model))?;
        Ok(message)
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config(ctx, |config| config.model = None)?;
        Ok(success_unset("model"))
    }
}

pub struct BaseUrlHandler;

impl SettingHandler for BaseUrlHandler {
    fn key(&self) -> &'static str {
        "base-url"
    }

    fn set(&self, value: &str, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        let url = require_value(
            value,
            "To point at a different API host, pass its base URL:",
            "mindchat set base-url https://generativelanguage.googleapis.com/v1beta",
        )?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingError::InvalidValue {
                key: "base-url",
                reason: "must start with http:// or https://".to_string(),
            });
        }
        let url = normalize_base_url(&url);
        let message = success_set("base-url", &url);
        mutate_config(ctx, move |config| config.base_url = Some(url))?;
        Ok(message)
    }

    fn unset(&self, ctx: &SetContext<'_>) -> Result<String, SettingError> {
        mutate_config(ctx, |config| config.base_url = None)?;
        Ok(success_unset("base-url"))
    }
}

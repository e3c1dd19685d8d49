//! Shared constants used across the application

/// Keyring service name and config directory application name.
pub const APP_NAME: &str = "mindchat";

/// Name under which the Gemini credential is stored.
pub const API_KEY_SECRET: &str = "gemini_api_key";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Overrides the location of `config.toml`.
pub const CONFIG_PATH_ENV: &str = "MINDCHAT_CONFIG";

pub const MISSING_CREDENTIAL_MESSAGE: &str =
    "Please set your API key in settings to use the chat.";

pub const GENERIC_API_FAILURE: &str = "Failed to get response from Gemini API";

pub const MALFORMED_RESPONSE_MESSAGE: &str = "Invalid response format from API";

pub const UNKNOWN_FAILURE_MESSAGE: &str = "An unknown error occurred";

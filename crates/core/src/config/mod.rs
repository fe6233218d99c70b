mod loader;
mod types;
mod validate;

pub use loader::{
    load_config_from_env, load_settings_from_str, parse_env_overrides, parse_headers,
    resolve_config, ENV_OVERRIDES_VAR, SETTINGS_FILE_VAR, WATCHLIST_HEADERS_VAR,
    WATCHLIST_URL_VAR,
};
pub use types::*;
pub use validate::validate_config;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    MissingVariable(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

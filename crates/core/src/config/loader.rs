use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::warn;

use super::{
    types::{Config, Settings, WatchlistConfig},
    ConfigError,
};

/// `|==|`-delimited `KEY=VALUE` overrides layered over the environment.
pub const ENV_OVERRIDES_VAR: &str = "A4KSCRAPERS_ENV";
/// Watchlist endpoint (required).
pub const WATCHLIST_URL_VAR: &str = "A4KSCRAPERS_TRAKT_API_URL";
/// `;`-delimited `KEY=VALUE` request headers (required).
pub const WATCHLIST_HEADERS_VAR: &str = "A4KSCRAPERS_TRAKT_HEADERS";
/// Optional TOML settings file.
pub const SETTINGS_FILE_VAR: &str = "CACHEWARM_CONFIG";

const OVERRIDE_SEPARATOR: &str = "|==|";
const HEADER_SEPARATOR: char = ';';

/// Environment variables mapped onto settings keys.
const STRING_SETTINGS: &[(&str, &str)] = &[
    ("CACHEWARM_CACHE_PATH", "cache.path"),
    ("CACHEWARM_JACKETT_URL", "scrapers.jackett.url"),
    ("CACHEWARM_JACKETT_API_KEY", "scrapers.jackett.api_key"),
    ("CACHEWARM_METRICS_FILE", "metrics.textfile"),
];
const TIMEOUT_SETTING: (&str, &str) = ("CACHEWARM_HTTP_TIMEOUT_SECS", "http.timeout_secs");

/// Resolve configuration from the current process environment.
///
/// The environment is snapshotted once; nothing here writes back to it.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let env: HashMap<String, String> = std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect();
    resolve_config(&env)
}

/// Resolve configuration from an environment snapshot.
///
/// Layering order: environment, then `A4KSCRAPERS_ENV` overrides. Every
/// later read (watchlist variables, settings file, `CACHEWARM_*` keys) sees
/// the layered view.
pub fn resolve_config(env: &HashMap<String, String>) -> Result<Config, ConfigError> {
    let env_overrides = env
        .get(ENV_OVERRIDES_VAR)
        .map(|raw| parse_env_overrides(raw))
        .unwrap_or_default();

    let mut layered = env.clone();
    layered.extend(
        env_overrides
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );

    let url = required(&layered, WATCHLIST_URL_VAR)?;
    let headers = parse_headers(required(&layered, WATCHLIST_HEADERS_VAR)?);
    let settings = load_settings(&layered)?;

    Ok(Config {
        watchlist: WatchlistConfig {
            url: url.to_string(),
            headers,
        },
        env_overrides,
        http: settings.http,
        cache: settings.cache,
        scrapers: settings.scrapers,
        metrics: settings.metrics,
    })
}

/// Load settings from a TOML string (useful for testing)
pub fn load_settings_from_str(toml_str: &str) -> Result<Settings, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse `KEY=VALUE|==|KEY=VALUE` overrides.
///
/// Splits on the first `=` only. Empty segments are ignored; segments
/// without `=` are dropped with a warning.
pub fn parse_env_overrides(raw: &str) -> BTreeMap<String, String> {
    let mut overrides = BTreeMap::new();
    for segment in raw.split(OVERRIDE_SEPARATOR) {
        if segment.is_empty() {
            continue;
        }
        match segment.split_once('=') {
            Some((key, value)) => {
                overrides.insert(key.to_string(), value.to_string());
            }
            None => warn!(segment = %segment, "Ignoring override without '='"),
        }
    }
    overrides
}

/// Parse `KEY=VALUE;KEY=VALUE` headers over a JSON content-type base.
///
/// Pairs without `=` are skipped silently.
pub fn parse_headers(raw: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::from([(
        "Content-Type".to_string(),
        "application/json".to_string(),
    )]);
    for pair in raw.split(HEADER_SEPARATOR) {
        if let Some((key, value)) = pair.split_once('=') {
            headers.insert(key.to_string(), value.to_string());
        }
    }
    headers
}

fn required<'a>(env: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ConfigError> {
    env.get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
}

fn load_settings(env: &HashMap<String, String>) -> Result<Settings, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(Settings::default()));

    if let Some(path) = env.get(SETTINGS_FILE_VAR) {
        let path = Path::new(path);
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        figment = figment.merge(Toml::file(path));
    }

    for (var, key) in STRING_SETTINGS {
        if let Some(value) = env.get(*var).filter(|v| !v.is_empty()) {
            figment = figment.merge(Serialized::default(key, value.clone()));
        }
    }

    let (var, key) = TIMEOUT_SETTING;
    if let Some(value) = env.get(var).filter(|v| !v.is_empty()) {
        let secs: u32 = value
            .parse()
            .map_err(|_| ConfigError::ParseError(format!("{} must be an integer: {}", var, value)))?;
        figment = figment.merge(Serialized::default(key, secs));
    }

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `STREAM_URL`: `https://<key>:<secret>@<location>.stream-io-api.com/?app_id=<id>`
//! - `STREAM_API_KEY`: API key (overrides the one in `STREAM_URL`)
//! - `STREAM_API_SECRET`: Shared secret, for server-side use
//! - `STREAM_USER_TOKEN`: Pre-issued user token, when no secret is set
//! - `STREAM_APP_ID`: Application id, needed for realtime channels
//! - `STREAM_LOCATION`: Data-center prefix, e.g. `us-east`
//! - `STREAM_GROUP`: Routing tag sent as the `location` query parameter
//! - `STREAM_EXPIRE_TOKENS`: Embed issued-at in minted tokens (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./stream.json` or `./stream.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names relative to the executable location

use std::path::{Path, PathBuf};

use feedstream_core::request::{Environment, ProcessEnvironment};
use feedstream_domain::constants::API_HOST_SUFFIX;
use feedstream_domain::{ClientConfig, Credential, FeedError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] = ["stream.json", "stream.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the API key or
/// credential is missing there, falls back to loading from a config file.
///
/// # Errors
/// Returns `FeedError::Configuration` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from the process environment
///
/// # Errors
/// Returns `FeedError::Configuration` if no API key or no credential is set,
/// or `STREAM_URL` is malformed.
pub fn load_from_env() -> Result<ClientConfig> {
    load_from_environment(&ProcessEnvironment)
}

/// Load configuration from an arbitrary variable source
///
/// See the module documentation for the variables read.
///
/// # Errors
/// Same as [`load_from_env`].
pub fn load_from_environment(env: &dyn Environment) -> Result<ClientConfig> {
    let from_url = match env.var("STREAM_URL").filter(|v| !v.is_empty()) {
        Some(raw) => Some(parse_stream_url(&raw)?),
        None => None,
    };

    let api_key = env
        .var("STREAM_API_KEY")
        .or_else(|| from_url.as_ref().map(|parts| parts.api_key.clone()))
        .ok_or_else(|| missing("STREAM_API_KEY"))?;

    let credential = if let Some(secret) = env.var("STREAM_API_SECRET") {
        Credential::Secret(secret)
    } else if let Some(parts) = from_url.as_ref() {
        Credential::Secret(parts.secret.clone())
    } else if let Some(token) = env.var("STREAM_USER_TOKEN") {
        Credential::UserToken(token)
    } else {
        return Err(missing("STREAM_API_SECRET or STREAM_USER_TOKEN"));
    };

    let mut config = match credential {
        Credential::Secret(secret) => ClientConfig::server(api_key, secret),
        Credential::UserToken(token) => ClientConfig::client(api_key, token),
    };

    let app_id = env.var("STREAM_APP_ID").or_else(|| from_url.as_ref().map(|p| p.app_id.clone()));
    if let Some(app_id) = app_id {
        config = config.app_id(app_id);
    }

    let location =
        env.var("STREAM_LOCATION").or_else(|| from_url.as_ref().and_then(|p| p.location.clone()));
    if let Some(location) = location {
        config = config.location(location);
    }

    if let Some(group) = env.var("STREAM_GROUP") {
        config = config.group(group);
    }

    config = config.expire_tokens(env_bool(env, "STREAM_EXPIRE_TOKENS", false));

    config.validate()?;
    Ok(config)
}

/// Parts of a `STREAM_URL` connection string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrlParts {
    pub api_key: String,
    pub secret: String,
    pub app_id: String,
    pub location: Option<String>,
}

/// Parse a `STREAM_URL` connection string.
///
/// The first host label names the location unless it is one of the generic
/// hosted names; a trailing `-api` on it is dropped.
///
/// # Errors
/// Returns `FeedError::Configuration` if the URL has no key, secret or
/// numeric `app_id`.
pub fn parse_stream_url(raw: &str) -> Result<StreamUrlParts> {
    let url = Url::parse(raw)
        .map_err(|e| FeedError::Configuration(format!("Invalid STREAM_URL: {e}")))?;

    let api_key = url.username();
    let secret = url.password().unwrap_or_default();
    if api_key.is_empty() || secret.is_empty() {
        return Err(FeedError::Configuration("STREAM_URL is missing the key or secret".into()));
    }

    let app_id = url
        .query_pairs()
        .find(|(name, _)| *name == "app_id")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| FeedError::Configuration("STREAM_URL is missing a numeric app_id".into()))?;

    let generic = ["api", "getstream", "stream-io-api"];
    let location = url
        .host_str()
        .filter(|host| host.ends_with(API_HOST_SUFFIX) && *host != API_HOST_SUFFIX)
        .and_then(|host| host.split('.').next())
        .map(|label| label.strip_suffix("-api").unwrap_or(label))
        .filter(|label| !label.is_empty() && !generic.contains(label))
        .map(str::to_string);

    Ok(StreamUrlParts {
        api_key: api_key.to_string(),
        secret: secret.to_string(),
        app_id,
        location,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FeedError::Configuration` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FeedError::Configuration(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FeedError::Configuration(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FeedError::Configuration(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FeedError::Configuration(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FeedError::Configuration(format!("Invalid JSON format: {}", e))),
        _ => Err(FeedError::Configuration(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn missing(key: &str) -> FeedError {
    FeedError::Configuration(format!("Missing required environment variable: {}", key))
}

/// Parse boolean from an environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(env: &dyn Environment, key: &str, default: bool) -> bool {
    env.var(key)
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

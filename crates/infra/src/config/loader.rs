//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! Environment variables are read first. When they carry no credentials the
//! loader looks for a JSON or TOML file instead.
//!
//! ## Environment Variables
//! - `ENVATO_PERSONAL_TOKEN`: Personal token (or set `ENVATO_CLIENT_ID`)
//! - `ENVATO_CLIENT_ID`: OAuth application id
//! - `ENVATO_CLIENT_SECRET`: OAuth application secret
//! - `ENVATO_REDIRECT_URI`: OAuth redirect URI
//! - `ENVATO_SESSION`: Stored OAuth session JSON
//! - `ENVATO_BASE_URI`: API base URI
//! - `ENVATO_USER_AGENT`: User agent sent with every request
//! - `ENVATO_TIMEOUT_SECS`: Request timeout in seconds
//! - `ENVATO_MAX_ATTEMPTS`: Connection attempts per request
//!
//! ## File Locations
//! `config.{json,toml}` and `envato.{json,toml}` are looked up in the working
//! directory, its parent and grandparent, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use envato_domain::{ApiConfig, AuthConfig, EnvatoConfig, EnvatoError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If no credentials are
/// set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `EnvatoError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<EnvatoConfig> {
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

/// Load configuration from environment variables
///
/// Either `ENVATO_PERSONAL_TOKEN` or `ENVATO_CLIENT_ID` must be set; every
/// other variable is optional and falls back to the defaults.
///
/// # Errors
/// Returns `EnvatoError::Config` if no credentials are set or a numeric
/// variable does not parse.
pub fn load_from_env() -> Result<EnvatoConfig> {
    let auth = AuthConfig {
        personal_token: env_opt("ENVATO_PERSONAL_TOKEN"),
        client_id: env_opt("ENVATO_CLIENT_ID"),
        client_secret: env_opt("ENVATO_CLIENT_SECRET"),
        redirect_uri: env_opt("ENVATO_REDIRECT_URI"),
        session: env_opt("ENVATO_SESSION"),
    };
    if !auth.has_credentials() {
        return Err(EnvatoError::Config(
            "Missing required environment variable: ENVATO_PERSONAL_TOKEN or ENVATO_CLIENT_ID"
                .to_string(),
        ));
    }

    let defaults = ApiConfig::default();
    let api = ApiConfig {
        base_uri: env_opt("ENVATO_BASE_URI").unwrap_or(defaults.base_uri),
        user_agent: env_opt("ENVATO_USER_AGENT").unwrap_or(defaults.user_agent),
        timeout_seconds: env_parse("ENVATO_TIMEOUT_SECS", "timeout")?
            .unwrap_or(defaults.timeout_seconds),
        max_attempts: env_parse("ENVATO_MAX_ATTEMPTS", "max attempts")?
            .unwrap_or(defaults.max_attempts),
        http: defaults.http,
    };

    Ok(EnvatoConfig { api, auth })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `EnvatoError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<EnvatoConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(EnvatoError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            EnvatoError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| EnvatoError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<EnvatoConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| EnvatoError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| EnvatoError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(EnvatoError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`config.{json,toml}`, `envato.{json,toml}`)
/// 2. Its parent and grandparent, same names
/// 3. The executable's directory, same layout
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    ["", "..", "../.."]
        .into_iter()
        .map(|up| dir.join(up))
        .flat_map(|base| {
            ["config.json", "config.toml", "envato.json", "envato.toml"]
                .into_iter()
                .map(move |name| base.join(name))
        })
        .collect()
}

/// Optional environment variable; blank values count as unset.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `EnvatoError::Config` if the variable is set but invalid.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| EnvatoError::Config(format!("Invalid {} in {}: {}", what, key, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 9] = [
        "ENVATO_PERSONAL_TOKEN",
        "ENVATO_CLIENT_ID",
        "ENVATO_CLIENT_SECRET",
        "ENVATO_REDIRECT_URI",
        "ENVATO_SESSION",
        "ENVATO_BASE_URI",
        "ENVATO_USER_AGENT",
        "ENVATO_TIMEOUT_SECS",
        "ENVATO_MAX_ATTEMPTS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn temp_config(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_load_from_env_personal_token() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ENVATO_PERSONAL_TOKEN", "personal");
        std::env::set_var("ENVATO_TIMEOUT_SECS", "12");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.auth.personal_token.as_deref(), Some("personal"));
        assert_eq!(config.api.timeout_seconds, 12);
        assert_eq!(config.api.base_uri, "https://api.envato.com/");
        assert_eq!(config.api.max_attempts, 1);

        clear_env();
    }

    #[test]
    fn test_load_from_env_oauth_application() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ENVATO_CLIENT_ID", "app");
        std::env::set_var("ENVATO_CLIENT_SECRET", "secret");
        std::env::set_var("ENVATO_REDIRECT_URI", "https://example.com/cb");
        std::env::set_var("ENVATO_BASE_URI", "https://sandbox.example.com/");
        std::env::set_var("ENVATO_MAX_ATTEMPTS", "3");

        let config = load_from_env().expect("config from env");
        assert!(config.auth.personal_token.is_none());
        assert_eq!(config.auth.client_id.as_deref(), Some("app"));
        assert_eq!(config.auth.redirect_uri.as_deref(), Some("https://example.com/cb"));
        assert_eq!(config.api.base_uri, "https://sandbox.example.com/");
        assert_eq!(config.api.max_attempts, 3);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_credentials() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ENVATO_PERSONAL_TOKEN", "   ");
        let err = load_from_env().unwrap_err();
        assert!(matches!(err, EnvatoError::Config(_)), "Should be a Config error");

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("ENVATO_PERSONAL_TOKEN", "personal");
        std::env::set_var("ENVATO_TIMEOUT_SECS", "soon");

        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("ENVATO_TIMEOUT_SECS"));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let path = temp_config(
            r#"{
                "api": {
                    "user_agent": "my-app/1.0",
                    "http": { "Headers": { "X-Trace": "1" }, "timeout": 5 }
                },
                "auth": { "personal_token": "from-file" }
            }"#,
            "json",
        );

        let config = load_from_file(Some(path.clone())).expect("config from JSON");
        assert_eq!(config.auth.personal_token.as_deref(), Some("from-file"));
        assert_eq!(config.api.user_agent, "my-app/1.0");
        assert_eq!(config.api.http.headers().get("x-trace").map(String::as_str), Some("1"));
        assert!(config.api.http.option("timeout").is_some());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let path = temp_config(
            r#"
[api]
base_uri = "https://sandbox.example.com/"
timeout_seconds = 10

[auth]
client_id = "app"
client_secret = "secret"
redirect_uri = "https://example.com/cb"
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).expect("config from TOML");
        assert_eq!(config.api.base_uri, "https://sandbox.example.com/");
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.auth.client_id.as_deref(), Some("app"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(EnvatoError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = temp_config(r#"{ "this is": "not valid json" "#, "json");
        assert!(load_from_file(Some(path.clone())).is_err(), "Should fail with invalid JSON");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_defaults() {
        let config = parse_config("{}", Path::new("config.json")).expect("empty JSON is valid");
        assert_eq!(config.api.timeout_seconds, 30);
        assert!(config.api.http.is_empty());
        assert!(!config.auth.has_credentials());
    }

    #[test]
    fn test_candidates_cover_both_names_at_every_level() {
        let dir = Path::new("/srv/app");
        let candidates = candidates_in(dir);

        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], dir.join("config.json"));
        assert!(candidates.contains(&dir.join("..").join("envato.toml")));
        assert!(candidates.contains(&dir.join("../..").join("envato.json")));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}

//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Attempt to load from environment variables
//! 2. If incomplete, fall back to a config file
//! 3. Probe several paths for the file
//! 4. Support JSON and TOML formats
//!
//! ## Environment Variables
//! - `ALMANAC_DB_PATH`: Database file path (required)
//! - `ALMANAC_DB_POOL_SIZE`: Connection pool size (required)
//! - `ALMANAC_BROADCAST_ENABLED`: Publish live progress (true/false)
//! - `ALMANAC_LOG_TO_DATABASE`: Persist structured sync logs (true/false)
//!
//! Source sections are only read from files; an environment-only
//! configuration has every source disabled.
//!
//! ## File Locations
//! 1. `./config.{toml,json}` and `./almanac.{toml,json}`
//! 2. The same names one and two directories up
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use almanac_domain::config::{Config, DatabaseConfig, SyncConfig};
use almanac_domain::{AlmanacError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] = ["config.toml", "config.json", "almanac.toml", "almanac.json"];

/// Load configuration, preferring environment variables over files.
///
/// # Errors
/// Returns `AlmanacError::Config` if neither source yields a valid
/// configuration.
pub fn load() -> Result<Config> {
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

/// Load configuration from `ALMANAC_*` environment variables.
///
/// # Errors
/// Returns `AlmanacError::Config` if a required variable is missing or
/// unparseable.
pub fn load_from_env() -> Result<Config> {
    let path = env_var("ALMANAC_DB_PATH")?;
    let pool_size = env_var("ALMANAC_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| AlmanacError::Config(format!("Invalid pool size: {e}")))
    })?;

    let defaults = SyncConfig::default();
    Ok(Config {
        database: DatabaseConfig { path, pool_size },
        sync: SyncConfig {
            broadcast_enabled: env_bool("ALMANAC_BROADCAST_ENABLED", defaults.broadcast_enabled),
            log_to_database: env_bool("ALMANAC_LOG_TO_DATABASE", defaults.log_to_database),
            ..defaults
        },
        sources: Default::default(),
    })
}

/// Load configuration from a file, probing standard locations when `path`
/// is `None`. The format follows the file extension.
///
/// # Errors
/// Returns `AlmanacError::Config` if no file is found, it cannot be read,
/// or it does not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(AlmanacError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            AlmanacError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| AlmanacError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Reject configurations that would only fail once a sync starts.
///
/// # Errors
/// Returns `AlmanacError::Config` naming the first offending setting.
pub fn validate(config: &Config) -> Result<()> {
    if config.database.pool_size == 0 {
        return Err(AlmanacError::Config("database.pool_size must be at least 1".into()));
    }

    let sources = &config.sources;
    let endpoints = [
        ("fitness", sources.fitness.as_ref().map(|s| s.base_url.as_str())),
        ("workouts", sources.workouts.as_ref().map(|s| s.base_url.as_str())),
        ("scrobbles", sources.scrobbles.as_ref().map(|s| s.base_url.as_str())),
        ("playlists", sources.playlists.as_ref().map(|s| s.base_url.as_str())),
        ("listening_stats", sources.listening_stats.as_ref().map(|s| s.base_url.as_str())),
        ("books", sources.books.as_ref().map(|s| s.base_url.as_str())),
    ];
    for (section, base_url) in endpoints {
        if let Some(base_url) = base_url {
            check_http_url(&format!("sources.{section}.base_url"), base_url)?;
        }
    }

    if let Some(feeds) = &sources.feeds {
        for url in &feeds.urls {
            check_http_url("sources.feeds.urls", url)?;
        }
    }
    Ok(())
}

fn check_http_url(setting: &str, raw: &str) -> Result<()> {
    let parsed = Url::parse(raw)
        .map_err(|e| AlmanacError::Config(format!("{setting}: invalid URL '{raw}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AlmanacError::Config(format!("{setting}: unsupported scheme '{other}'"))),
    }
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AlmanacError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AlmanacError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AlmanacError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| AlmanacError::Config(format!("Missing required environment variable: {key}")))
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive).
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 4] = [
        "ALMANAC_DB_PATH",
        "ALMANAC_DB_POOL_SIZE",
        "ALMANAC_BROADCAST_ENABLED",
        "ALMANAC_LOG_TO_DATABASE",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().unwrap();

        for value in ["1", "true", "yes", "on", "TRUE"] {
            std::env::set_var("ALMANAC_TEST_BOOL", value);
            assert!(env_bool("ALMANAC_TEST_BOOL", false), "{value} should be true");
        }
        for value in ["0", "false", "no", "off"] {
            std::env::set_var("ALMANAC_TEST_BOOL", value);
            assert!(!env_bool("ALMANAC_TEST_BOOL", true), "{value} should be false");
        }

        std::env::remove_var("ALMANAC_TEST_BOOL");
        assert!(env_bool("ALMANAC_TEST_BOOL", true));
        assert!(!env_bool("ALMANAC_TEST_BOOL", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("ALMANAC_DB_PATH", "/tmp/almanac-test.db");
        std::env::set_var("ALMANAC_DB_POOL_SIZE", "3");
        std::env::set_var("ALMANAC_BROADCAST_ENABLED", "yes");
        std::env::set_var("ALMANAC_LOG_TO_DATABASE", "off");

        let config = load_from_env().unwrap();
        clear_env();

        assert_eq!(config.database.path, "/tmp/almanac-test.db");
        assert_eq!(config.database.pool_size, 3);
        assert!(config.sync.broadcast_enabled);
        assert!(!config.sync.log_to_database);
        assert_eq!(config.sync.broadcast_capacity, 64);
        assert!(config.sources.scrobbles.is_none());
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, AlmanacError::Config(msg) if msg.contains("ALMANAC_DB_PATH")));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("ALMANAC_DB_PATH", "/tmp/almanac-test.db");
        std::env::set_var("ALMANAC_DB_POOL_SIZE", "eight");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(AlmanacError::Config(_))));
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "almanac.toml",
            r#"
[database]
path = "data/almanac.db"
pool_size = 2

[sync]
broadcast_enabled = true

[sources.scrobbles]
base_url = "https://scrobbles.example/2.0/"
api_key = "key"
user = "listener"

[sources.feeds]
urls = ["https://blog.example/rss.xml"]
"#,
        );

        let config = load_from_file(Some(path)).unwrap();
        assert_eq!(config.database.path, "data/almanac.db");
        assert!(config.sync.broadcast_enabled);
        assert!(config.sync.log_to_database);

        let scrobbles = config.sources.scrobbles.unwrap();
        assert_eq!(scrobbles.user, "listener");
        assert_eq!(scrobbles.page_size, 50);
        assert_eq!(config.sources.feeds.unwrap().urls.len(), 1);
        assert!(config.sources.books.is_none());
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "config.json",
            r#"{
                "database": { "path": "json.db", "pool_size": 4 },
                "sources": {
                    "books": {
                        "base_url": "https://books.example",
                        "api_key": "key",
                        "user_id": "42"
                    }
                }
            }"#,
        );

        let config = load_from_file(Some(path)).unwrap();
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(
            config.sources.books.unwrap().shelves,
            vec!["read", "currently-reading", "to-read"]
        );
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/almanac.toml")));
        assert!(matches!(result, Err(AlmanacError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "config.json", r#"{ "database": "#);
        assert!(matches!(load_from_file(Some(path)), Err(AlmanacError::Config(_))));
    }

    #[test]
    fn test_load_from_file_rejects_bad_urls() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "almanac.toml",
            r#"
[sources.feeds]
urls = ["https://blog.example/rss.xml", "ftp://files.example/feed.xml"]
"#,
        );

        let err = load_from_file(Some(path)).unwrap_err();
        assert!(matches!(err, AlmanacError::Config(msg) if msg.contains("ftp")));
    }

    #[test]
    fn test_validate_checks_pool_size_and_base_urls() {
        let mut config = Config::default();
        assert!(validate(&config).is_ok());

        config.database.pool_size = 0;
        assert!(validate(&config).is_err());
        config.database.pool_size = 2;

        config.sources.playlists = Some(almanac_domain::config::PlaylistsConfig {
            base_url: "not a url".into(),
            access_token: "tok".into(),
            page_size: 50,
        });
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, AlmanacError::Config(msg) if msg.contains("sources.playlists")));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("database: {}", Path::new("almanac.yaml"));
        assert!(matches!(result, Err(AlmanacError::Config(msg)) if msg.contains("yaml")));
    }
}

//! Runtime configuration.
//!
//! Each setting is resolved as: command-line flag, then environment, then
//! the YAML config file (`~/.pb/config.yaml` unless `--config` is given),
//! then the built-in default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_USER_ID: u64 = 1;
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_KEEP_UNUSED_SECS: u64 = 60;

pub const BASE_URL_ENV: &str = "API_BASE_URL";
pub const USER_ID_ENV: &str = "PB_USER_ID";

const CONFIG_FILE: &str = "config.yaml";
const LOG_FILE: &str = "pb.log";

/// `~/.pb`, or `./.pb` when no home directory is known.
pub fn pb_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pb")
}

/// Contents of the YAML config file. Every key is optional.
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub user_id: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub search_debounce_ms: Option<u64>,
    pub cache_keep_unused_secs: Option<u64>,
}

impl FileConfig {
    /// Read a config file. A missing file is only an error when `required`.
    pub fn load(path: &Path, required: bool) -> AppResult<Self> {
        if !path.exists() {
            if required {
                return Err(AppError::Config(format!("config file {} not found", path.display())));
            }
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Settings given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub user_id: Option<u64>,
    pub log_file: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Settings read from the environment.
#[derive(Debug, Default, Clone)]
pub struct EnvVars {
    pub base_url: Option<String>,
    pub user_id: Option<String>,
}

impl EnvVars {
    pub fn from_process() -> Self {
        EnvVars {
            base_url: std::env::var(BASE_URL_ENV).ok().filter(|v| !v.is_empty()),
            user_id: std::env::var(USER_ID_ENV).ok().filter(|v| !v.is_empty()),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub base_url: String,
    /// The "current user" for the priority pages.
    pub user_id: u64,
    pub log_file: PathBuf,
    pub search_debounce: Duration,
    pub cache_keep_unused: Duration,
    /// The config file that was consulted, whether or not it existed.
    pub config_path: PathBuf,
}

impl AppConfig {
    /// Resolve from the process environment and the config file.
    pub fn load(overrides: &Overrides) -> AppResult<Self> {
        let (path, required) = match &overrides.config {
            Some(path) => (path.clone(), true),
            None => (pb_dir().join(CONFIG_FILE), false),
        };
        let file = FileConfig::load(&path, required)?;
        let mut config = Self::resolve(overrides, &EnvVars::from_process(), &file)?;
        config.config_path = path;
        Ok(config)
    }

    pub fn resolve(overrides: &Overrides, env: &EnvVars, file: &FileConfig) -> AppResult<Self> {
        let env_user = env
            .user_id
            .as_deref()
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| AppError::Config(format!("{} must be a number, got '{}'", USER_ID_ENV, raw)))
            })
            .transpose()?;

        let user_id = overrides
            .user_id
            .or(env_user)
            .or(file.user_id)
            .unwrap_or(DEFAULT_USER_ID);
        if user_id == 0 {
            return Err(AppError::Config("user id must be positive".into()));
        }

        let base_url = overrides
            .base_url
            .clone()
            .or_else(|| env.base_url.clone())
            .or_else(|| file.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(AppConfig {
            base_url,
            user_id,
            log_file: overrides
                .log_file
                .clone()
                .or_else(|| file.log_file.clone())
                .unwrap_or_else(|| pb_dir().join(LOG_FILE)),
            search_debounce: Duration::from_millis(file.search_debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)),
            cache_keep_unused: Duration::from_secs(
                file.cache_keep_unused_secs.unwrap_or(DEFAULT_KEEP_UNUSED_SECS),
            ),
            config_path: pb_dir().join(CONFIG_FILE),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::resolve(&Overrides::default(), &EnvVars::default(), &FileConfig::default()).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.user_id, 1);
        assert_eq!(config.search_debounce, Duration::from_millis(500));
        assert_eq!(config.cache_keep_unused, Duration::from_secs(60));
        assert!(config.log_file.ends_with("pb.log"));
    }

    #[test]
    fn flag_beats_env_beats_file() {
        let file = FileConfig {
            base_url: Some("http://file".into()),
            user_id: Some(3),
            ..Default::default()
        };
        let env = EnvVars {
            base_url: Some("http://env".into()),
            user_id: Some("4".into()),
        };
        let config = AppConfig::resolve(&Overrides::default(), &env, &file).unwrap();
        assert_eq!(config.base_url, "http://env");
        assert_eq!(config.user_id, 4);

        let flags = Overrides {
            base_url: Some("http://flag".into()),
            user_id: Some(5),
            ..Default::default()
        };
        let config = AppConfig::resolve(&flags, &env, &file).unwrap();
        assert_eq!(config.base_url, "http://flag");
        assert_eq!(config.user_id, 5);

        let config = AppConfig::resolve(&Overrides::default(), &EnvVars::default(), &file).unwrap();
        assert_eq!(config.base_url, "http://file");
        assert_eq!(config.user_id, 3);
    }

    #[test]
    fn bad_user_ids_are_rejected() {
        let env = EnvVars {
            user_id: Some("abc".into()),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&Overrides::default(), &env, &FileConfig::default()).is_err());
        let flags = Overrides {
            user_id: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&flags, &EnvVars::default(), &FileConfig::default()).is_err());
    }

    #[test]
    fn reads_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://api.test:9000\nsearch_debounce_ms: 250\ncache_keep_unused_secs: 5").unwrap();
        let loaded = FileConfig::load(file.path(), true).unwrap();
        assert_eq!(loaded.base_url.as_deref(), Some("http://api.test:9000"));
        assert_eq!(loaded.search_debounce_ms, Some(250));

        let config = AppConfig::resolve(&Overrides::default(), &EnvVars::default(), &loaded).unwrap();
        assert_eq!(config.search_debounce, Duration::from_millis(250));
        assert_eq!(config.cache_keep_unused, Duration::from_secs(5));
    }

    #[test]
    fn missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert_eq!(FileConfig::load(&missing, false).unwrap(), FileConfig::default());
        assert!(matches!(FileConfig::load(&missing, true), Err(AppError::Config(_))));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "user_id: [1, 2]\n").unwrap();
        assert!(matches!(FileConfig::load(&bad, false), Err(AppError::Config(_))));
    }
}

//! Run configuration.
//!
//! Configuration is loaded once at startup from a TOML file at:
//! 1. The path given with `--config`
//! 2. `$MBOXSPLIT_CONFIG` (environment variable)
//! 3. `./mboxsplit.toml`
//! 4. `~/.config/mboxsplit/config.toml` (Linux/macOS)
//!    `%APPDATA%\mboxsplit\config.toml` (Windows)
//! 5. Built-in defaults
//!
//! Keys accept both `snake_case` and the `camelCase` spelling
//! (`mboxPath`, `resultPath`, `groupedMessagesNumber`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "MBOXSPLIT_CONFIG";

/// Config file looked up in the working directory.
const LOCAL_CONFIG_FILE: &str = "mboxsplit.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input archive.
    #[serde(alias = "mboxPath")]
    pub mbox_path: PathBuf,
    /// Root directory receiving the `messages-<n>` folders.
    #[serde(alias = "resultPath")]
    pub result_path: PathBuf,
    /// Number of messages per batch (must be at least 1).
    #[serde(alias = "groupedMessagesNumber")]
    pub grouped_messages_number: usize,
    /// Maximum framed message size in bytes (default: 268435456 = 256 MB).
    pub max_message_size: usize,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for the log file.
    pub cache_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mbox_path: PathBuf::new(),
            result_path: PathBuf::from("result"),
            grouped_messages_number: 100,
            max_message_size: 256 * 1024 * 1024, // 256 MB
            log_level: "info".to_string(),
            cache_dir: None,
        }
    }
}

impl Config {
    /// Check the values the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        if self.mbox_path.as_os_str().is_empty() {
            return Err(ExtractError::InvalidConfig(
                "mbox_path is not set".to_string(),
            ));
        }
        if self.grouped_messages_number == 0 {
            return Err(ExtractError::InvalidConfig(
                "grouped_messages_number must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(ExtractError::InvalidConfig(
                "max_message_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration from `explicit` or the standard locations.
///
/// An explicitly requested file must exist and parse. Files found in the
/// standard locations fall back to defaults on error, with a warning.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return read_config_file(path);
    }

    if let Some(path) = config_file_path() {
        if path.exists() {
            match read_config_file(&path) {
                Ok(cfg) => return Ok(cfg),
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to load config, using defaults"
                    );
                }
            }
        }
    }
    Ok(Config::default())
}

/// Read and parse one TOML config file.
pub fn read_config_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::FileNotFound(path.to_path_buf())
        } else {
            ExtractError::io(path, e)
        }
    })?;
    let cfg = toml::from_str::<Config>(&contents)
        .map_err(|e| ExtractError::InvalidConfig(format!("{}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

/// Determine the config file path (env var, then working dir, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(env_path));
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir().map(|d| d.join("mboxsplit").join("config.toml"))
}

/// Return the cache directory used for the log file.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mboxsplit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.result_path, PathBuf::from("result"));
        assert_eq!(cfg.grouped_messages_number, 100);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_camel_case_keys() {
        let raw = r#"
mboxPath = "all.mbox"
resultPath = "out"
groupedMessagesNumber = 2
"#;
        let cfg: Config = toml::from_str(raw).expect("parse");
        assert_eq!(cfg.mbox_path, PathBuf::from("all.mbox"));
        assert_eq!(cfg.result_path, PathBuf::from("out"));
        assert_eq!(cfg.grouped_messages_number, 2);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg: Config = toml::from_str("mbox_path = \"a.mbox\"").expect("parse partial");
        assert_eq!(cfg.mbox_path, PathBuf::from("a.mbox"));
        assert_eq!(cfg.grouped_messages_number, 100);
        assert_eq!(cfg.max_message_size, 256 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let cfg = Config {
            mbox_path: PathBuf::from("a.mbox"),
            grouped_messages_number: 0,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_requires_mbox_path() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.toml");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(ExtractError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_read_config_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cfg.toml");
        std::fs::write(&path, "mbox_path = \"x.mbox\"\ngrouped_messages_number = 7\n").unwrap();
        let cfg = load_config(Some(&path)).unwrap();
        assert_eq!(cfg.grouped_messages_number, 7);
    }
}

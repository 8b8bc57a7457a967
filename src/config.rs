//! Configuration file loading.
//!
//! The file is optional TOML. Every key is optional; command-line flags
//! override file values, which override built-in defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Application directory name used under config and documents folders.
pub const APP_DIR_NAME: &str = "clipfetch";

/// Fallback destination when no documents directory is known.
pub const FALLBACK_OUTPUT_DIR: &str = "downloads";

/// Errors raised while reading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected {expected}")]
    Invalid {
        /// Key name.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

impl VerbositySetting {
    /// Returns the log filter directive this setting maps to.
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Default => "info",
            Self::Verbose => "debug",
            Self::Quiet => "error",
            Self::Debug => "trace",
        }
    }
}

/// TOML-backed file configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Destination folder for materialized downloads.
    pub output_dir: Option<PathBuf>,
    /// Path or name of the yt-dlp executable.
    pub ytdlp_path: Option<PathBuf>,
    /// Chat completions endpoint URL.
    pub chat_endpoint: Option<String>,
    /// Chat model identifier.
    pub chat_model: Option<String>,
    /// Environment variable holding the chat API key.
    pub chat_api_key_env: Option<String>,
    /// Chat request timeout in seconds.
    pub chat_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for bad TOML and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validates config values against runtime constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(secs) = self.chat_timeout_secs
            && !(1..=3600).contains(&secs)
        {
            return Err(ConfigError::Invalid {
                field: "chat_timeout_secs",
                value: secs.to_string(),
                expected: "range 1..=3600",
            });
        }
        if let Some(endpoint) = self.chat_endpoint.as_deref()
            && url::Url::parse(endpoint).is_err()
        {
            return Err(ConfigError::Invalid {
                field: "chat_endpoint",
                value: endpoint.to_string(),
                expected: "an absolute URL",
            });
        }
        if let Some(name) = self.chat_api_key_env.as_deref()
            && (name.is_empty() || name.contains('='))
        {
            return Err(ConfigError::Invalid {
                field: "chat_api_key_env",
                value: name.to_string(),
                expected: "a non-empty environment variable name",
            });
        }
        if self.chat_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "chat_model",
                value: String::new(),
                expected: "a non-empty model name",
            });
        }
        Ok(())
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    /// Resolved config path if a base directory is known.
    pub path: Option<PathBuf>,
    /// Parsed file config when a config file exists and was valid.
    pub config: Option<FileConfig>,
    /// Indicates whether configuration was loaded from disk.
    pub loaded_from_file: bool,
}

impl LoadedConfig {
    /// Returns the file config, or an empty one when no file was loaded.
    #[must_use]
    pub fn file_config(&self) -> FileConfig {
        self.config.clone().unwrap_or_default()
    }
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/clipfetch/config.toml`
/// 2. `$HOME/.config/clipfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR_NAME).join("config.toml"));
    }
    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR_NAME)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but is unreadable or invalid.
pub fn load_default_file_config() -> Result<LoadedConfig, ConfigError> {
    load_config_at(resolve_default_config_path())
}

/// Loads config from `path` if it exists.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file exists but is unreadable or invalid.
pub fn load_config_at(path: Option<PathBuf>) -> Result<LoadedConfig, ConfigError> {
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig::default());
    };
    if !path_ref.exists() {
        debug!(path = %path_ref.display(), "No config file; using defaults");
        return Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        });
    }

    let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
        path: path_ref.to_path_buf(),
        source,
    })?;
    let config = FileConfig::from_toml_str(path_ref, &text)?;
    debug!(path = %path_ref.display(), "Loaded config file");
    Ok(LoadedConfig {
        path,
        config: Some(config),
        loaded_from_file: true,
    })
}

/// Returns the default destination folder for materialized downloads.
///
/// `<documents>/clipfetch`, or `./downloads` when the platform has no
/// documents directory.
#[must_use]
pub fn default_output_dir() -> PathBuf {
    dirs::document_dir().map_or_else(
        || PathBuf::from(FALLBACK_OUTPUT_DIR),
        |docs| docs.join(APP_DIR_NAME),
    )
}

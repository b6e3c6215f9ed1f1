use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the MedAssist backend (without the `/api/...` suffix)
    pub server_url: Option<String>,
    /// Upper bound on a query or health request, in seconds; 0 waits forever
    pub request_timeout_secs: Option<u64>,
}

/// Errors that can occur when loading or saving configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as valid TOML.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Failed to serialize or persist the configuration file.
    Write { path: PathBuf, detail: String },

    /// The platform offers no configuration directory.
    NoConfigDir,

    /// `set`/`unset` was given a key or value this config does not accept.
    InvalidSetting { key: String, detail: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read config at {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config at {}: {}", path.display(), source)
            }
            ConfigError::Write { path, detail } => {
                write!(f, "Failed to write config at {}: {}", path.display(), detail)
            }
            ConfigError::NoConfigDir => write!(f, "Failed to determine config directory"),
            ConfigError::InvalidSetting { key, detail } => {
                write!(f, "Invalid setting '{key}': {detail}")
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Keys accepted by `medassist set` / `medassist unset`.
pub const SETTING_KEYS: &[&str] = &["server-url", "request-timeout"];

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(&Self::get_config_path()?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(&Self::get_config_path()?)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        let write_error = |detail: String| ConfigError::Write {
            path: config_path.to_path_buf(),
            detail,
        };

        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir).map_err(|err| write_error(err.to_string()))?;
        }

        let contents = toml::to_string_pretty(self).map_err(|err| write_error(err.to_string()))?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir),
            None => NamedTempFile::new(),
        }
        .map_err(|err| write_error(err.to_string()))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|err| write_error(err.to_string()))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|err| write_error(err.to_string()))?;
        temp_file
            .persist(config_path)
            .map_err(|err| write_error(err.to_string()))?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs =
            ProjectDirs::from("org", "hemav", "medassist").ok_or(ConfigError::NoConfigDir)?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn effective_server_url(&self) -> &str {
        self.server_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "server-url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(ConfigError::InvalidSetting {
                        key: key.to_string(),
                        detail: "expected an http:// or https:// URL".to_string(),
                    });
                }
                self.server_url = Some(value.to_string());
            }
            "request-timeout" => {
                let secs = value
                    .parse::<u64>()
                    .map_err(|err| ConfigError::InvalidSetting {
                        key: key.to_string(),
                        detail: format!("expected whole seconds: {err}"),
                    })?;
                self.request_timeout_secs = Some(secs);
            }
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "server-url" => self.server_url = None,
            "request-timeout" => self.request_timeout_secs = None,
            other => return Err(unknown_key(other)),
        }
        Ok(())
    }

    pub fn print_all(&self) {
        println!("MedAssist configuration:");
        println!(
            "  server-url: {}{}",
            self.effective_server_url(),
            if self.server_url.is_none() {
                " (default)"
            } else {
                ""
            }
        );
        match self.request_timeout() {
            Some(timeout) => println!("  request-timeout: {}s", timeout.as_secs()),
            None => println!("  request-timeout: disabled"),
        }
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        detail: format!("expected one of: {}", SETTING_KEYS.join(", ")),
    }
}

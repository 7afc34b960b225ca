//! Configuration loading and root folder resolution
//!
//! Priority order for every setting:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or broken config file never stops startup: it is logged and
//! the defaults apply.

use crate::clock::DEFAULT_ROLLOVER_HOUR;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "BIGBOARD_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DB_FILE_NAME: &str = "big_board.db";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    /// tracing filter directive, e.g. `"info"` or `"bigboard_server=debug"`
    pub log_level: Option<String>,
    /// Hour (0-24) at which the board flips to tomorrow; 24 disables it
    pub rollover_hour: Option<u32>,
}

impl TomlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `explicit` if given, else the platform config file. Problems are
    /// logged and yield an empty config.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
            Some(path) => path,
            None => {
                info!("No config file found, using defaults");
                return Self::default();
            }
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Configured rollover hour, validated
    pub fn rollover_hour(&self) -> Result<u32> {
        match self.rollover_hour {
            None => Ok(DEFAULT_ROLLOVER_HOUR),
            Some(hour) if hour <= 24 => Ok(hour),
            Some(hour) => Err(Error::Config(format!(
                "rollover_hour must be between 0 and 24, got {}",
                hour
            ))),
        }
    }
}

/// Resolve the root folder holding the database
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml: &TomlConfig,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Database file inside `root_folder`
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DB_FILE_NAME)
}

/// Platform config file location, if one exists
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("bigboard").join("config.toml"));
    if let Some(path) = user_config.filter(|p| p.exists()) {
        return Some(path);
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/bigboard/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/bigboard (or /var/lib/bigboard for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("bigboard"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/bigboard"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/bigboard
        dirs::data_dir()
            .map(|d| d.join("bigboard"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/bigboard"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\bigboard
        dirs::data_local_dir()
            .map(|d| d.join("bigboard"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\bigboard"))
    } else {
        PathBuf::from("./bigboard_data")
    }
}

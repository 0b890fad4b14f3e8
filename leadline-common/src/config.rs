//! Configuration loading and root folder resolution
//!
//! The root folder holds the service database (`leadline.db`). Resolution
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`LEADLINE_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_ENV_VAR: &str = "LEADLINE_ROOT";

/// Environment variable naming the listen port
pub const PORT_ENV_VAR: &str = "LEADLINE_PORT";

/// Default listen port for the List Distribution service
pub const DEFAULT_PORT: u16 = 5740;

/// Resolve the root folder following the 4-tier priority order
pub fn resolve_root_folder(cli_arg: Option<&str>) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = locate_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Resolve the listen port: CLI argument, then environment, then default
pub fn resolve_port(cli_arg: Option<u16>) -> u16 {
    if let Some(port) = cli_arg {
        return port;
    }

    if let Ok(value) = std::env::var(PORT_ENV_VAR) {
        if let Ok(port) = value.parse::<u16>() {
            return port;
        }
    }

    DEFAULT_PORT
}

/// Create the root folder if it does not exist yet
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    Ok(())
}

/// Path of the service database inside the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("leadline.db")
}

/// Locate the configuration file for the platform
fn locate_config_file() -> Result<PathBuf> {
    // ~/.config/leadline/config.toml first, then /etc/leadline/config.toml
    if let Some(path) = dirs::config_dir().map(|d| d.join("leadline").join("config.toml")) {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/leadline/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("leadline"))
        .unwrap_or_else(|| PathBuf::from("./leadline_data"))
}

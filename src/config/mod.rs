mod settings;

pub use settings::{Config, DataSettings, LedgerSettings};

use crate::error::{LedgerError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// Get the config directory path (~/.batchbook/)
pub fn config_dir() -> Result<PathBuf> {
    // First try XDG-style directories
    if let Some(proj_dirs) = ProjectDirs::from("", "", "batchbook") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    // Fallback to ~/.batchbook/
    let home = dirs_home().ok_or_else(|| {
        LedgerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".batchbook"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if path.starts_with("~/") {
        if let Some(home) = dirs_home() {
            return home.join(&path[2..]);
        }
    }
    PathBuf::from(path)
}

/// Load the main config.toml
pub fn load_config(config_dir: &PathBuf) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(LedgerError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| LedgerError::ConfigParse { path, source: e })
}

/// Resolve the ledger data file path. Relative paths live inside the config
/// directory; absolute paths and ~ paths are used as given.
pub fn data_file_path(config: &Config, config_dir: &PathBuf) -> PathBuf {
    let expanded = expand_path(&config.data.file);
    if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    }
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[ledger]
currency = "USD"
currency_symbol = "$"

[data]
# Ledger document holding the four record collections. Relative paths
# live inside the config directory.
file = "ledger.json"
"#;

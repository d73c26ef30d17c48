//! Platform-aware path resolution for usage-sync.
//!
//! - Linux: `$XDG_CONFIG_HOME/usage-sync` or `~/.config/usage-sync`
//! - macOS: `$XDG_CONFIG_HOME/usage-sync` or
//!   `~/Library/Application Support/usage-sync`

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;

const APP_NAME: &str = "usage-sync";

/// Returns the configuration directory.
///
/// `$XDG_CONFIG_HOME` wins on every platform when set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Ok(PathBuf::from(xdg).join(APP_NAME));
        }
    }
    platform_config_dir()
        .map(|base| base.join(APP_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        dirs::config_dir()
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::home_dir().map(|home| home.join(".config"))
    }
}

/// Returns `config_dir()/config.toml`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Expands a leading `~` to the home directory.
///
/// Paths without a leading `~`, and every path when the home directory is
/// unknown, are returned unchanged.
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        (None, Some(home)) if path == "~" => home,
        _ => PathBuf::from(path),
    }
}

/// `mkdir -p` with mode 0700.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    }
    Ok(())
}

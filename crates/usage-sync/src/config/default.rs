//! Default configuration template and `config init`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::xdg;

/// Commented TOML template. Every value must match `Config::default()`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# usage-sync configuration
#
# All values below are the built-in defaults.
# Location: $XDG_CONFIG_HOME/usage-sync/config.toml

# ==============================================================================
# Engine
# ==============================================================================

[engine]

# Time between periodic refresh cycles.
# Examples: "60s", "2m", "5m"
refresh_interval = "60s"

# Give up on a usage request after this long.
# A timed-out request is reported like any other network failure.
request_timeout = "10s"

# Claude Code's local stats cache. Tilde (~) is expanded.
stats_path = "~/.claude/stats-cache.json"

# Secure-storage entry Claude Code keeps its OAuth credential under.
credential_service = "Claude Code-credentials"

# ==============================================================================
# Logging
# ==============================================================================

[logging]

# Options: "error", "warn", "info", "debug", "trace"
# The USAGE_SYNC_LOG environment variable overrides this.
level = "info"

# Append logs to this file. Empty string means stderr.
file = ""
"#;

/// Writes the template to the default location.
///
/// An existing file is an error unless `force` is set, in which case it is
/// moved to `config.toml.backup` first. Returns the written path.
pub fn create_default_config(force: bool) -> Result<PathBuf, ConfigError> {
    let path = xdg::config_path()?;
    write_template(&path, force)?;
    Ok(path)
}

fn write_template(path: &Path, force: bool) -> Result<(), ConfigError> {
    let write_error = |source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    if path.exists() {
        if !force {
            return Err(ConfigError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        let backup = path.with_extension("toml.backup");
        fs::rename(path, &backup).map_err(|source| ConfigError::WriteError {
            path: backup.clone(),
            source,
        })?;
        tracing::info!(backup = %backup.display(), "backed up existing config");
    }

    if let Some(parent) = path.parent() {
        xdg::ensure_dir(parent).map_err(write_error)?;
    }
    fs::write(path, DEFAULT_CONFIG_TEMPLATE).map_err(write_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(write_error)?;
    }

    Ok(())
}

//! Default values for archive-hub configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Name of the instance used when no configuration file exists.
pub const DEFAULT_INSTANCE_NAME: &str = "mathhub";

/// Hosting URL of the default instance.
pub const DEFAULT_REMOTE: &str = "https://gl.mathhub.info";

/// Entries requested per page from a remote listing.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "ARCHIVE_HUB_CONFIG";

/// Returns the default configuration file path.
///
/// Uses the platform-appropriate configuration directory:
/// - Linux: `~/.config/archive-hub/config.toml`
/// - macOS: `~/Library/Application Support/archive-hub/config.toml`
/// - Windows: `{FOLDERID_RoamingAppData}\archive-hub\config.toml`
///
/// Falls back to `.archive-hub/config.toml` in the current directory if the
/// platform directory cannot be determined.
pub fn default_config_path() -> PathBuf {
    config_path_in(dirs::config_dir())
}

fn config_path_in(config_dir: Option<PathBuf>) -> PathBuf {
    match config_dir {
        Some(dir) => dir.join("archive-hub").join("config.toml"),
        None => PathBuf::from(".archive-hub").join("config.toml"),
    }
}

/// Returns the default data root for the instance called `instance`.
///
/// Archives of that instance are installed below this directory as
/// `<group>/<name>`.
pub fn default_data_root(instance: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".archive-hub-data"))
        .join("archive-hub")
        .join(instance)
}

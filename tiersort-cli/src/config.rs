/// Config file loading and creation for the tiersort CLI.
///
/// Config lives at ~/.config/tiersort/config.toml.
/// All fields are optional. CLI flags override config values.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tiersort_core::{EloConfig, Format, TournamentConfig};

use crate::bail;

/// Session file used when neither `--session` nor the config names one.
pub const DEFAULT_SESSION_FILE: &str = "tiersort-session.json";

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TiersortConfig {
    pub session_file: Option<PathBuf>,
    pub group_format: Option<Format>,
    pub final_format: Option<Format>,
    pub finalists_per_group: Option<usize>,
    pub k_factor: Option<f64>,
}

impl TiersortConfig {
    /// Tournament knobs with anything unset left at the engine default.
    pub fn tournament(&self) -> TournamentConfig {
        let defaults = TournamentConfig::default();
        TournamentConfig {
            group_format: self.group_format.unwrap_or(defaults.group_format),
            final_format: self.final_format.unwrap_or(defaults.final_format),
            finalists_per_group: self.finalists_per_group.unwrap_or(defaults.finalists_per_group),
        }
    }

    pub fn elo(&self) -> EloConfig {
        let defaults = EloConfig::default();
        EloConfig {
            k_factor: self.k_factor.unwrap_or(defaults.k_factor),
            ..defaults
        }
    }
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# tiersort configuration
# All values here can be overridden by CLI flags.

# Where progress is saved between runs (relative to the working directory)
# session_file = \"tiersort-session.json\"

# How tournament groups and the final are ordered: \"merge-sort\" or \"round-robin\"
# group_format = \"merge-sort\"
# final_format = \"merge-sort\"

# Items promoted from each group (ties at the cut are promoted too)
# finalists_per_group = 3

# Maximum rating swing per verdict in rate mode
# k_factor = 32.0
";

/// Returns the default config path: ~/.config/tiersort/config.toml
pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| bail("HOME environment variable not set"));
    PathBuf::from(home).join(".config").join("tiersort").join("config.toml")
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> TiersortConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content)
            .unwrap_or_else(|e| bail(format!("Failed to parse config at {}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => TiersortConfig::default(),
        Err(e) => bail(format!("Failed to read config at {}: {e}", path.display())),
    }
}

fn parse_config(content: &str) -> Result<TiersortConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Create the default config file at `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) {
    if path.exists() {
        bail(format!("Config file already exists at {}", path.display()));
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| bail(format!("Failed to create directory {}: {e}", parent.display())));
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .unwrap_or_else(|e| bail(format!("Failed to write config to {}: {e}", path.display())));
}

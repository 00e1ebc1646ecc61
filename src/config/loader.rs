//! Configuration loading from file system

use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::DEFAULT_CONFIG_PATH;
use super::types::Config;

/// Path of the config file (~/.stack/config.json)
pub fn config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DEFAULT_CONFIG_PATH).as_ref())
}

/// Load configuration from ~/.stack/config.json
///
/// Returns Config::default() if the file is missing or unusable.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

/// Load configuration from an explicit path.
///
/// Never fails: every problem is logged and answered with defaults.
#[instrument(name = "load_config")]
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let contents = match std::fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(error = %e, path = %config_path.display(), "Failed to read config, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(contents.trim()) {
        Ok(config) => {
            info!(path = %config_path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            let error_hint = if e.to_string().contains("missing field `modifiers`")
                || e.to_string().contains("missing field `key`")
            {
                "\n\nHint: The 'hotkey' field requires 'modifiers' (array) and 'key' (string). Example:\n\
                \"hotkey\": {\n\
                  \"modifiers\": [\"alt\"],  // \"meta\", \"ctrl\", \"alt\", \"shift\"\n\
                  \"key\": \"KeyS\"          // KeyA..KeyZ\n\
                }"
            } else {
                ""
            };

            warn!(
                error = %e,
                path = %config_path.display(),
                hint = %error_hint,
                "Failed to parse config JSON, using defaults"
            );
            Config::default()
        }
    }
}

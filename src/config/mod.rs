//! Configuration module - user preferences for the capture daemon
//!
//! - `defaults` - All default constant values
//! - `types` - Configuration struct definitions (Config, HotkeyConfig)
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_FOCUS_RETRY_ATTEMPTS, DEFAULT_FOCUS_RETRY_DELAY_MS, DEFAULT_HOTKEY_KEY,
    DEFAULT_HOTKEY_MODIFIERS, DEFAULT_PERMISSION_POLL_INTERVAL_MS,
};
pub use loader::{config_path, load_config, load_config_from};
pub use types::{Config, HotkeyConfig};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default capture hotkey: Option+S on macOS, Alt+S elsewhere
pub const DEFAULT_HOTKEY_MODIFIERS: &[&str] = &["alt"];
pub const DEFAULT_HOTKEY_KEY: &str = "KeyS";

/// Focus claim policy: one immediate attempt plus one after a UI frame
pub const DEFAULT_FOCUS_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_FOCUS_RETRY_DELAY_MS: u64 = 16;

/// How often a missing or revoked permission is re-checked
pub const DEFAULT_PERMISSION_POLL_INTERVAL_MS: u64 = 2000;

/// Config file location (tilde-expanded at load time)
pub const DEFAULT_CONFIG_PATH: &str = "~/.stack/config.json";

/// Notes file location (tilde-expanded at load time)
pub const DEFAULT_NOTES_PATH: &str = "~/.stack/db/notes.sqlite";

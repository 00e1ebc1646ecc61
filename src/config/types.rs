//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::defaults::*;

// ============================================
// HOTKEY CONFIG
// ============================================

/// A key combination as written in config.json.
///
/// `modifiers` uses "meta" / "ctrl" / "alt" / "shift"; `key` uses
/// W3C key codes ("KeyS").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotkeyConfig {
    pub modifiers: Vec<String>,
    pub key: String,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        HotkeyConfig {
            modifiers: DEFAULT_HOTKEY_MODIFIERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            key: DEFAULT_HOTKEY_KEY.to_string(),
        }
    }
}

impl HotkeyConfig {
    /// Human-readable form, e.g. "alt+KeyS"
    pub fn display(&self) -> String {
        let mut parts = self.modifiers.clone();
        parts.push(self.key.clone());
        parts.join("+")
    }
}

// ============================================
// MAIN CONFIG
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub hotkey: HotkeyConfig,
    /// Total focus-claim attempts per overlay show (default: 2)
    #[serde(default = "default_focus_retry_attempts")]
    pub focus_retry_attempts: u32,
    /// Delay between focus-claim attempts in milliseconds (default: 16)
    #[serde(default = "default_focus_retry_delay_ms")]
    pub focus_retry_delay_ms: u64,
    /// Permission re-check interval in milliseconds (default: 2000)
    #[serde(default = "default_permission_poll_interval_ms")]
    pub permission_poll_interval_ms: u64,
    /// Override for the notes file (default: ~/.stack/db/notes.sqlite)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes_path: Option<String>,
}

fn default_focus_retry_attempts() -> u32 {
    DEFAULT_FOCUS_RETRY_ATTEMPTS
}
fn default_focus_retry_delay_ms() -> u64 {
    DEFAULT_FOCUS_RETRY_DELAY_MS
}
fn default_permission_poll_interval_ms() -> u64 {
    DEFAULT_PERMISSION_POLL_INTERVAL_MS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            hotkey: HotkeyConfig::default(),
            focus_retry_attempts: DEFAULT_FOCUS_RETRY_ATTEMPTS,
            focus_retry_delay_ms: DEFAULT_FOCUS_RETRY_DELAY_MS,
            permission_poll_interval_ms: DEFAULT_PERMISSION_POLL_INTERVAL_MS,
            notes_path: None,
        }
    }
}

impl Config {
    /// Focus attempts, never less than one
    pub fn get_focus_retry_attempts(&self) -> u32 {
        self.focus_retry_attempts.max(1)
    }

    pub fn get_focus_retry_delay(&self) -> Duration {
        Duration::from_millis(self.focus_retry_delay_ms)
    }

    /// Poll interval, clamped to at least 100ms so a typo can't spin the CPU
    pub fn get_permission_poll_interval(&self) -> Duration {
        Duration::from_millis(self.permission_poll_interval_ms.max(100))
    }

    pub fn get_notes_path(&self) -> PathBuf {
        let raw = self.notes_path.as_deref().unwrap_or(DEFAULT_NOTES_PATH);
        PathBuf::from(shellexpand::tilde(raw).as_ref())
    }
}

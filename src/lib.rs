#![allow(unexpected_cfgs)]

//! stack - global quick capture
//!
//! A background process listens for one system-wide hotkey, pops a
//! non-activating input overlay above whatever is focused, and stores what
//! was typed as a categorized note.

pub mod app;
pub mod capture;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod focus;
pub mod hotkeys;
pub mod logging;
pub mod notes;
pub mod overlay;
pub mod permissions;
pub mod platform;

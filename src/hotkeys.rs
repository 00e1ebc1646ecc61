//! Global hotkey registration.
//!
//! `HotkeyRegistry` owns at most one system-wide binding. The OS side sits
//! behind [`HotkeyBackend`]; production uses [`GlobalHotkeyBackend`], which
//! wraps `global_hotkey::GlobalHotKeyManager` and a single listener thread.
//! Match callbacks run on that listener thread and must only post to the UI
//! queue.

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    Error as GlobalHotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::HotkeyConfig;
use crate::debug_panic;
use crate::error::HotkeyError;
use crate::{logging, permissions};

/// Invoked on the listener thread for each key-down of the binding
pub type MatchCallback = Arc<dyn Fn() + Send + Sync>;

// =============================================================================
// Binding
// =============================================================================

const LETTER_KEYS: [(&str, Code); 26] = [
    ("KeyA", Code::KeyA),
    ("KeyB", Code::KeyB),
    ("KeyC", Code::KeyC),
    ("KeyD", Code::KeyD),
    ("KeyE", Code::KeyE),
    ("KeyF", Code::KeyF),
    ("KeyG", Code::KeyG),
    ("KeyH", Code::KeyH),
    ("KeyI", Code::KeyI),
    ("KeyJ", Code::KeyJ),
    ("KeyK", Code::KeyK),
    ("KeyL", Code::KeyL),
    ("KeyM", Code::KeyM),
    ("KeyN", Code::KeyN),
    ("KeyO", Code::KeyO),
    ("KeyP", Code::KeyP),
    ("KeyQ", Code::KeyQ),
    ("KeyR", Code::KeyR),
    ("KeyS", Code::KeyS),
    ("KeyT", Code::KeyT),
    ("KeyU", Code::KeyU),
    ("KeyV", Code::KeyV),
    ("KeyW", Code::KeyW),
    ("KeyX", Code::KeyX),
    ("KeyY", Code::KeyY),
    ("KeyZ", Code::KeyZ),
];

/// Modifier names in display order
const MODIFIER_NAMES: [(&str, Modifiers); 4] = [
    ("meta", Modifiers::META),
    ("ctrl", Modifiers::CONTROL),
    ("alt", Modifiers::ALT),
    ("shift", Modifiers::SHIFT),
];

/// One or more modifiers plus one letter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    modifiers: Modifiers,
    code: Code,
    letter: char,
}

impl HotkeyBinding {
    pub fn from_config(config: &HotkeyConfig) -> Result<Self, HotkeyError> {
        let mut modifiers = Modifiers::empty();
        for name in &config.modifiers {
            let flag = MODIFIER_NAMES
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
                .map(|(_, flag)| *flag)
                .ok_or_else(|| {
                    HotkeyError::InvalidBinding(format!(
                        "unknown modifier '{}' (expected meta, ctrl, alt or shift)",
                        name
                    ))
                })?;
            modifiers |= flag;
        }
        if modifiers.is_empty() {
            return Err(HotkeyError::InvalidBinding(format!(
                "'{}' needs at least one modifier",
                config.display()
            )));
        }

        let index = LETTER_KEYS
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(config.key.trim()))
            .ok_or_else(|| {
                HotkeyError::InvalidBinding(format!(
                    "unsupported key '{}' (expected KeyA..KeyZ)",
                    config.key
                ))
            })?;

        Ok(Self {
            modifiers,
            code: LETTER_KEYS[index].1,
            letter: (b'A' + index as u8) as char,
        })
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn code(&self) -> Code {
        self.code
    }

    /// e.g. "alt+S", "meta+shift+N"
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = MODIFIER_NAMES
            .iter()
            .filter(|(_, flag)| self.modifiers.contains(*flag))
            .map(|(name, _)| name.to_string())
            .collect();
        parts.push(self.letter.to_string());
        parts.join("+")
    }
}

impl Default for HotkeyBinding {
    /// Option/Alt+S
    fn default() -> Self {
        Self {
            modifiers: Modifiers::ALT,
            code: Code::KeyS,
            letter: 'S',
        }
    }
}

// =============================================================================
// Backend seam
// =============================================================================

/// The OS input layer as seen by the registry
pub trait HotkeyBackend {
    /// Whether the process may intercept keys system-wide.
    fn permission_granted(&self) -> bool;

    /// Start delivering key-downs of `binding` to `on_match`. Returns a
    /// backend id for `uninstall`.
    fn install(&mut self, binding: &HotkeyBinding, on_match: MatchCallback)
        -> Result<u32, HotkeyError>;

    fn uninstall(&mut self, id: u32) -> Result<(), HotkeyError>;
}

// =============================================================================
// Registry
// =============================================================================

/// Proof of one registration. Stale handles are harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyHandle {
    generation: u64,
}

struct Registration {
    handle: HotkeyHandle,
    binding: HotkeyBinding,
    backend_id: u32,
}

pub struct HotkeyRegistry {
    backend: Box<dyn HotkeyBackend>,
    active: Option<Registration>,
    /// Generation for the next handle; never reused within a registry
    next_generation: u64,
}

impl HotkeyRegistry {
    pub fn new(backend: Box<dyn HotkeyBackend>) -> Self {
        Self {
            backend,
            active: None,
            next_generation: 1,
        }
    }

    pub fn check_permission(&self) -> bool {
        self.backend.permission_granted()
    }

    /// Register the one global binding.
    pub fn register(
        &mut self,
        binding: HotkeyBinding,
        on_match: MatchCallback,
    ) -> Result<HotkeyHandle, HotkeyError> {
        if let Some(active) = &self.active {
            let existing = active.binding.display();
            debug_panic!(
                "hotkey {} already registered; unregister before registering {}",
                existing,
                binding.display()
            );
            return Err(HotkeyError::AlreadyRegistered { binding: existing });
        }

        if !self.check_permission() {
            logging::log(
                "HOTKEY",
                &format!("Cannot register {}: permission not granted", binding.display()),
            );
            return Err(HotkeyError::PermissionDenied);
        }

        let backend_id = self.backend.install(&binding, on_match)?;
        let handle = HotkeyHandle {
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.active = Some(Registration {
            handle,
            binding,
            backend_id,
        });

        logging::log(
            "HOTKEY",
            &format!("Registered {} (id: {})", binding.display(), backend_id),
        );
        Ok(handle)
    }

    /// Remove the listener. No-op for stale or already-unregistered handles.
    pub fn unregister(&mut self, handle: HotkeyHandle) {
        match &self.active {
            Some(active) if active.handle == handle => {}
            _ => return,
        }
        if let Some(active) = self.active.take() {
            self.uninstall(active);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.active.is_some()
    }

    pub fn binding(&self) -> Option<HotkeyBinding> {
        self.active.as_ref().map(|a| a.binding)
    }

    fn uninstall(&mut self, registration: Registration) {
        let display = registration.binding.display();
        match self.backend.uninstall(registration.backend_id) {
            Ok(()) => logging::log("HOTKEY", &format!("Unregistered {}", display)),
            // Internal tracking is already cleared; the OS side is best effort
            Err(e) => logging::log(
                "HOTKEY",
                &format!("Warning: failed to unregister {}: {}", display, e),
            ),
        }
    }
}

impl Drop for HotkeyRegistry {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            self.uninstall(active);
        }
    }
}

// =============================================================================
// global-hotkey backend
// =============================================================================

type Route = Arc<Mutex<Option<(u32, MatchCallback)>>>;

/// Production backend over `global_hotkey`.
///
/// NOTE: Must be created on the main thread (Carbon on macOS).
pub struct GlobalHotkeyBackend {
    manager: GlobalHotKeyManager,
    installed: Option<HotKey>,
    route: Route,
}

impl GlobalHotkeyBackend {
    pub fn new() -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| HotkeyError::Os(format!("failed to create hotkey manager: {}", e)))?;
        let route: Route = Arc::new(Mutex::new(None));
        start_listener(route.clone())?;
        Ok(Self {
            manager,
            installed: None,
            route,
        })
    }
}

impl HotkeyBackend for GlobalHotkeyBackend {
    fn permission_granted(&self) -> bool {
        permissions::input_monitoring_granted()
    }

    fn install(
        &mut self,
        binding: &HotkeyBinding,
        on_match: MatchCallback,
    ) -> Result<u32, HotkeyError> {
        let hotkey = HotKey::new(Some(binding.modifiers()), binding.code());
        let id = hotkey.id();

        if let Err(e) = self.manager.register(hotkey) {
            let message = format_hotkey_error(&e, &binding.display());
            logging::log("HOTKEY", &message);
            return Err(HotkeyError::Os(message));
        }

        self.installed = Some(hotkey);
        *self.route.lock() = Some((id, on_match));
        Ok(id)
    }

    fn uninstall(&mut self, id: u32) -> Result<(), HotkeyError> {
        {
            let mut route = self.route.lock();
            if route.as_ref().is_some_and(|(routed, _)| *routed == id) {
                *route = None;
            }
        }

        match self.installed.take() {
            Some(hotkey) if hotkey.id() == id => self
                .manager
                .unregister(hotkey)
                .map_err(|e| HotkeyError::Os(e.to_string())),
            other => {
                self.installed = other;
                Ok(())
            }
        }
    }
}

/// Format a hotkey registration error with helpful context
fn format_hotkey_error(e: &GlobalHotkeyError, shortcut_display: &str) -> String {
    match e {
        GlobalHotkeyError::AlreadyRegistered(hk) => {
            format!(
                "Hotkey '{}' is already registered by another application (ID: {}). \
                 Try a different shortcut or close the conflicting app.",
                shortcut_display,
                hk.id()
            )
        }
        GlobalHotkeyError::FailedToRegister(msg) => {
            format!(
                "System rejected hotkey '{}': {}. This shortcut may be reserved by macOS.",
                shortcut_display, msg
            )
        }
        GlobalHotkeyError::OsError(os_err) => {
            format!(
                "OS error registering '{}': {}. Check system hotkey settings.",
                shortcut_display, os_err
            )
        }
        other => format!(
            "Failed to register hotkey '{}': {}",
            shortcut_display, other
        ),
    }
}

/// One thread draining `GlobalHotKeyEvent::receiver()` for the process.
fn start_listener(route: Route) -> Result<(), HotkeyError> {
    std::thread::Builder::new()
        .name("stack-hotkey".to_string())
        .spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            while let Ok(event) = receiver.recv() {
                // Only respond to key PRESS, not release
                if event.state != HotKeyState::Pressed {
                    continue;
                }

                let callback = match route.lock().as_ref() {
                    Some((id, callback)) if *id == event.id => callback.clone(),
                    _ => {
                        logging::log_debug(
                            "HOTKEY",
                            &format!("Ignoring event for unrouted id={}", event.id),
                        );
                        continue;
                    }
                };
                callback();
            }
            logging::log("HOTKEY", "Hotkey event channel closed, listener exiting");
        })
        .map(|_| ())
        .map_err(|e| HotkeyError::Os(format!("failed to spawn hotkey listener: {}", e)))
}

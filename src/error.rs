use thiserror::Error;
use tracing::error;

/// Error severity for user-facing status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // transient, absorbed
    Warning,  // recoverable
    Error,    // operation failed
    Critical, // requires user action
}

/// Failures of the global hotkey layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("Input monitoring permission has not been granted")]
    PermissionDenied,

    #[error("Hotkey '{binding}' is already registered; unregister it first")]
    AlreadyRegistered { binding: String },

    #[error("Invalid hotkey binding: {0}")]
    InvalidBinding(String),

    #[error("OS rejected hotkey: {0}")]
    Os(String),
}

/// Domain-specific errors for stack
#[derive(Error, Debug)]
pub enum StackError {
    #[error(transparent)]
    Hotkey(#[from] HotkeyError),

    #[error("Overlay input field did not receive keyboard focus after {attempts} attempts")]
    FocusClaimFailure { attempts: u32 },

    #[error("Platform operation failed: {0}")]
    Platform(String),
}

impl StackError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Hotkey(HotkeyError::PermissionDenied) => ErrorSeverity::Critical,
            Self::Hotkey(HotkeyError::AlreadyRegistered { .. }) => ErrorSeverity::Error,
            Self::Hotkey(_) => ErrorSeverity::Warning,
            Self::FocusClaimFailure { .. } => ErrorSeverity::Info,
            Self::Platform(_) => ErrorSeverity::Error,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Hotkey(HotkeyError::PermissionDenied) => {
                "stack needs Accessibility permission to capture ideas from anywhere. \
                 Grant it in System Settings > Privacy & Security > Accessibility."
                    .to_string()
            }
            Self::Hotkey(HotkeyError::Os(msg)) => {
                format!("The capture shortcut could not be registered: {}", msg)
            }
            Self::Hotkey(e) => e.to_string(),
            Self::FocusClaimFailure { .. } => "Click the capture field to start typing".to_string(),
            Self::Platform(msg) => msg.clone(),
        }
    }
}

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use stack_capture::error::ResultExt;
///
/// let store = NoteStore::open(path).log_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }
}

/// Panic in debug mode, log error in release mode.
///
/// Use for contract violations that should crash during development
/// but degrade gracefully in production.
///
/// ```ignore
/// debug_panic!("register() called twice for {}", binding);
/// ```
#[macro_export]
macro_rules! debug_panic {
    ( $($fmt_arg:tt)* ) => {
        if cfg!(debug_assertions) {
            panic!( $($fmt_arg)* );
        } else {
            tracing::error!("IMPOSSIBLE STATE: {}", format_args!($($fmt_arg)*));
        }
    };
}

//! Error taxonomy for the theme engine
//!
//! Extraction failures never reach the UI layer as errors: the synchronizer
//! collapses every one of them to the fallback palette. The taxonomy exists
//! so the collapse can be logged with the right severity and so callers
//! that want diagnostics (the CLI, tests) can inspect what went wrong.

use thiserror::Error;
use tracing::{error, warn};

/// Error severity for logging and user-facing display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,    // Informational
    Warning, // Recoverable, engine continues with a substitute
    Error,   // Operation failed, fallback palette published
}

/// Domain-specific errors for theme extraction and synchronization
#[derive(Error, Debug)]
pub enum ThemeError {
    #[error("Image did not load within {timeout_ms}ms")]
    ImageLoadTimeout { timeout_ms: u64 },

    #[error("Image failed to load: {0}")]
    ImageLoadError(String),

    #[error("Too few opaque pixels to sample: found {found}, need {needed}")]
    InsufficientSamples { found: usize, needed: usize },

    #[error("Malformed color input: {0:?}")]
    MalformedColorInput(String),

    #[error("Persistence write failed: {0}")]
    PersistenceWriteFailure(String),
}

impl ThemeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ImageLoadTimeout { .. } => ErrorSeverity::Error,
            Self::ImageLoadError(_) => ErrorSeverity::Error,
            Self::InsufficientSamples { .. } => ErrorSeverity::Warning,
            Self::MalformedColorInput(_) => ErrorSeverity::Warning,
            Self::PersistenceWriteFailure(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::ImageLoadTimeout { .. } => {
                "The image took too long to load; using the default theme".to_string()
            }
            Self::ImageLoadError(_) => {
                "The image could not be read; using the default theme".to_string()
            }
            Self::InsufficientSamples { .. } => {
                "The image is mostly transparent; using the default theme".to_string()
            }
            Self::MalformedColorInput(value) => {
                format!("'{}' is not a valid color", value)
            }
            Self::PersistenceWriteFailure(_) => {
                "The theme could not be saved; it will reset next session".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ThemeError>;

/// Extension trait for ergonomic error logging on recoverable paths.
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?e,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?e,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

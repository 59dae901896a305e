//! Fatal error taxonomy for act generation.
//!
//! Only conditions that abort a whole run live here. Row-validation misses and
//! empty role resolutions are not errors, and per-act failures are captured as
//! [`crate::model::ActFailure`] entries instead of propagating.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Stable codes for fatal errors, suitable for scripting against the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i32)]
pub enum ErrorCode {
    /// Required input file does not exist
    InputMissing = 10,
    /// Required sheet is absent from a workbook
    SheetMissing = 11,
    /// Template workbook holds no sheet to clone
    TemplateEmpty = 12,
    /// Workbook could not be read within the retry budget
    LoadFailed = 20,
    /// Output could not be written within the retry budget
    SaveFailed = 21,
    /// Invalid configuration
    InvalidConfig = 30,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Get the error category for log fields
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::InputMissing | ErrorCode::SheetMissing | ErrorCode::TemplateEmpty => {
                "input_missing"
            }
            ErrorCode::LoadFailed | ErrorCode::SaveFailed => "persistence",
            ErrorCode::InvalidConfig => "config",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::LoadFailed | ErrorCode::SaveFailed)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.code())
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("required file {path:?} does not exist")]
    InputMissing { path: PathBuf },

    #[error("workbook {path:?} has no sheet named {sheet:?}")]
    SheetMissing { path: PathBuf, sheet: String },

    #[error("template workbook {path:?} contains no sheets")]
    TemplateEmpty { path: PathBuf },

    #[error("failed to load {path:?} after {attempts} attempt(s): {message}")]
    Load {
        path: PathBuf,
        attempts: u32,
        message: String,
    },

    #[error("failed to save {path:?} after {attempts} attempt(s): {message}")]
    Save {
        path: PathBuf,
        attempts: u32,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GenerationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GenerationError::InputMissing { .. } => ErrorCode::InputMissing,
            GenerationError::SheetMissing { .. } => ErrorCode::SheetMissing,
            GenerationError::TemplateEmpty { .. } => ErrorCode::TemplateEmpty,
            GenerationError::Load { .. } => ErrorCode::LoadFailed,
            GenerationError::Save { .. } => ErrorCode::SaveFailed,
            GenerationError::InvalidConfig(_) => ErrorCode::InvalidConfig,
        }
    }

    /// Path the failing operation was working on, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            GenerationError::InputMissing { path }
            | GenerationError::SheetMissing { path, .. }
            | GenerationError::TemplateEmpty { path }
            | GenerationError::Load { path, .. }
            | GenerationError::Save { path, .. } => Some(path),
            GenerationError::InvalidConfig(_) => None,
        }
    }
}

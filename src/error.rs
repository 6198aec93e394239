//! Error types for the screenshot pipeline

use std::path::PathBuf;

use thiserror::Error;

use crate::capture::CaptureStage;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering and capturing a component
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid request (dimensions, scale, malformed data URI)
    #[error("Invalid input: {0}")]
    InputError(String),

    /// A requested style library is not available
    #[error("Dependency not available: {0}")]
    DependencyError(String),

    /// A file (e.g. a webfont) could not be read
    #[error("Failed to read {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The component failed to render
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The browser failed during one of the capture stages
    #[error("Browser automation failed during {stage}: {message}")]
    AutomationError { stage: CaptureStage, message: String },

    /// A bounded stage did not finish in time
    #[error("{stage} timed out after {ms}ms")]
    Timeout { stage: CaptureStage, ms: u64 },
}

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Dependency,
    Io,
    Automation,
}

impl Error {
    pub(crate) fn automation(stage: CaptureStage, err: impl std::fmt::Display) -> Self {
        Error::AutomationError {
            stage,
            message: err.to_string(),
        }
    }

    /// Classify the error. Renderer failures count as input errors since
    /// they stem from the component/props combination the caller supplied.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputError(_) | Error::RenderError(_) => ErrorKind::Input,
            Error::DependencyError(_) => ErrorKind::Dependency,
            Error::IoError { .. } => ErrorKind::Io,
            Error::AutomationError { .. } | Error::Timeout { .. } => ErrorKind::Automation,
        }
    }

    /// The capture stage the error originated from, if any
    pub fn stage(&self) -> Option<CaptureStage> {
        match self {
            Error::AutomationError { stage, .. } | Error::Timeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(Error::InputError("w".into()).kind(), ErrorKind::Input);
        assert_eq!(Error::DependencyError("x".into()).kind(), ErrorKind::Dependency);
        let io = Error::IoError {
            path: PathBuf::from("/nope.ttf"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.to_string().contains("/nope.ttf"));

        let timeout = Error::Timeout { stage: CaptureStage::Navigate, ms: 10 };
        assert_eq!(timeout.kind(), ErrorKind::Automation);
        assert_eq!(timeout.stage(), Some(CaptureStage::Navigate));
    }
}

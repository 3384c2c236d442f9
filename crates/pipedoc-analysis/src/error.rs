//! Analysis-specific error types.

use thiserror::Error;

/// Errors produced while parsing pipeline documents.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The document is not valid JSON, or an expected field has an
    /// incompatible type. `path` identifies the offending location
    /// (`$` for the document root).
    #[error("malformed pipeline document at {path}: {reason}")]
    MalformedPipeline { path: String, reason: String },
}

impl AnalysisError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPipeline {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The JSON path the error was raised at.
    pub fn path(&self) -> &str {
        match self {
            Self::MalformedPipeline { path, .. } => path,
        }
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

impl From<AnalysisError> for pipedoc_core::PipedocError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::MalformedPipeline { path, reason } => {
                pipedoc_core::PipedocError::MalformedPipelineDocument { path, reason }
            }
        }
    }
}

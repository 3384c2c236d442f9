//! Run-level error taxonomy.
//!
//! Component-local failures (a single file, a single activity, a
//! single pattern rule) are isolated where they occur and never reach
//! these variants; only errors that affect the whole processing run
//! are surfaced through `PipedocError`.

use thiserror::Error;

/// Errors surfaced at the processing-run level.
#[derive(Error, Debug)]
pub enum PipedocError {
    /// Declared extension or MIME type is not in the allow-list.
    /// The file is skipped; the batch continues.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The content extractor could not decode or parse a file.
    /// The file is excluded from analysis; the batch continues.
    #[error("Content extraction failed for {file}: {reason}")]
    ContentExtractionFailure { file: String, reason: String },

    /// A pipeline JSON document violated the expected shape.
    /// Carries the JSON path of the offending field.
    #[error("Malformed pipeline document at {path}: {reason}")]
    MalformedPipelineDocument { path: String, reason: String },

    /// Every file in the batch failed extraction. Terminal for the run.
    #[error("No content could be extracted from any input file")]
    NoContentExtracted,

    /// The document renderer failed. Terminal for the run; the partial
    /// metadata set is discarded.
    #[error("Document assembly failed: {0}")]
    DocumentAssemblyFailure(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipedocError {
    pub fn unsupported(ext: impl Into<String>) -> Self {
        Self::UnsupportedFileType(ext.into())
    }

    pub fn extraction(file: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContentExtractionFailure {
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPipelineDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn assembly(msg: impl Into<String>) -> Self {
        Self::DocumentAssemblyFailure(msg.into())
    }

    /// Whether this error aborts the whole run, as opposed to a
    /// single-file failure the batch loop degrades around.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::NoContentExtracted | Self::DocumentAssemblyFailure(_) | Self::Config(_)
        )
    }
}

/// Result type for run-level operations.
pub type Result<T> = std::result::Result<T, PipedocError>;

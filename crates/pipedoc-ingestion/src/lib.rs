//! Document ingestion for pipedoc.
//!
//! Turns heterogeneous input files into plain text the analysis layer
//! can work on:
//!
//! - Multi-format text extraction behind one [`TextExtractor`] trait
//!   (plain text, CSV, pipeline-aware JSON; PDF, Word, and Excel
//!   behind the `pdf`, `docx`, and `xlsx` features)
//! - Zip archive expansion with traversal and size safety checks
//! - Batch reading with extension filtering and content deduplication
//!
//! Extraction failures for individual files are non-fatal: the batch
//! reader logs and skips them, surfacing an error only when nothing in
//! the batch produced text.

pub mod archive;
pub mod batch;
pub mod extractors;

pub use archive::{expand_archive, ExpandedArchive};
pub use batch::{read_batch, ExtractedDocument};
pub use extractors::{
    CsvExtractor, ExtractionResult, ExtractorRegistry, JsonExtractor, PlainTextExtractor,
    TextExtractor,
};

/// Error types for ingestion operations
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Format '{format}' requires the '{feature}' feature")]
    FeatureDisabled {
        format: &'static str,
        feature: &'static str,
    },

    #[error("No content could be extracted from any input")]
    NoContent,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IngestionError {
    /// Lift into the run-level taxonomy, attributed to `file`.
    pub fn into_core(self, file: &str) -> pipedoc_core::PipedocError {
        match self {
            IngestionError::NoContent => pipedoc_core::PipedocError::NoContentExtracted,
            other => pipedoc_core::PipedocError::extraction(file, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestionError::ArchiveError("bad central directory".to_string());
        assert!(err.to_string().contains("Archive error"));
    }

    #[test]
    fn test_into_core_attribution() {
        let err = IngestionError::ExtractionFailed("truncated".to_string());
        let core = err.into_core("report.pdf");
        assert!(core.to_string().contains("report.pdf"));
    }
}

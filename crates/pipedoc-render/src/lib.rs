//! Documentation rendering for pipedoc.
//!
//! Takes the synthesized [`CanonicalMetadata`] and produces the final
//! documentation artifact with a fixed section layout. The shipped
//! renderer targets Markdown; other output formats plug in through the
//! [`DocumentRenderer`] trait.

pub mod markdown;

pub use markdown::MarkdownRenderer;

use chrono::NaiveDate;
use pipedoc_analysis::CanonicalMetadata;

/// Substituted for the data-flow name when no pipeline name was found.
pub const DEFAULT_DATA_FLOW_NAME: &str = "Azure Synapse Data Flow";

/// Error types for rendering operations
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Document assembly failed: {0}")]
    Assembly(String),
}

impl From<RenderError> for pipedoc_core::PipedocError {
    fn from(err: RenderError) -> Self {
        pipedoc_core::PipedocError::assembly(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Presentation inputs that are not part of the synthesized metadata.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Document title; the data-flow name is used when absent.
    pub title: Option<String>,
    /// Author recorded in the change log.
    pub author: String,
    /// Generation date; today when absent.
    pub generated_on: Option<NaiveDate>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: None,
            author: "pipedoc".to_string(),
            generated_on: None,
        }
    }
}

/// A renderer producing one documentation artifact from the
/// synthesized metadata.
pub trait DocumentRenderer {
    fn render(&self, metadata: &CanonicalMetadata, options: &RenderOptions) -> Result<String>;

    /// File extension of the produced artifact, without the dot.
    fn extension(&self) -> &'static str;
}

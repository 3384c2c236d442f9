//! # pipedoc-analysis
//!
//! Pipeline-metadata extraction and name-reconciliation engine.
//!
//! This crate is the algorithmic core of pipedoc. It reconciles
//! free-form reference names against the curated catalog, parses
//! Azure-Data-Factory-style pipeline JSON into typed activity records,
//! applies heuristic pattern rules to free-form document text, and
//! synthesizes per-document analyses into one canonical metadata set.
//!
//! All of it is pure and synchronous: no I/O, no retries, no shared
//! mutable state. Callers own their inputs; the only shared input is
//! the read-only [`pipedoc_core::Catalog`].
//!
//! ## Example
//!
//! ```rust
//! use pipedoc_analysis::{Analyzer, synthesize, SynthesisCaps};
//! use pipedoc_core::Catalog;
//!
//! let analyzer = Analyzer::new(Catalog::builtin());
//! let record = analyzer.analyze("source: AGLPRD reporting tables", "notes.txt");
//! let metadata = synthesize(&[record], &SynthesisCaps::default());
//! assert_eq!(metadata.source_files, vec!["notes.txt"]);
//! ```

pub mod analyzer;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod synthesis;

pub use analyzer::{
    AnalysisRecord, Analyzer, ExtractedFields, PIPELINE_JSON_END, PIPELINE_JSON_START,
};
pub use error::{AnalysisError, Result};
pub use pipeline::{parse_pipeline, parse_pipeline_str, ActivityRecord, ComputeHint};
pub use reconcile::{Reconciler, Reconciliation, CATEGORY_CUTOFF, DB_TYPE_CUTOFF};
pub use synthesis::{synthesize, CanonicalMetadata, SynthesisCaps};

//! Core types, catalog, and configuration for pipedoc.
//!
//! This crate provides the shared building blocks used across the
//! pipedoc workspace: the curated source/sink catalog, the run-level
//! error taxonomy, and application configuration.

pub mod catalog;
pub mod config;
pub mod error;

pub use catalog::{Catalog, CatalogEntry, Category};
pub use self::config::{AppConfig, IngestionConfig, LimitsConfig};
pub use error::{PipedocError, Result};

/// Marker the ingestion layer places before embedded pipeline JSON so
/// downstream analysis takes the structural parsing path.
pub const PIPELINE_JSON_START: &str = "PIPELINE_JSON_START";
/// Closing counterpart of [`PIPELINE_JSON_START`].
pub const PIPELINE_JSON_END: &str = "PIPELINE_JSON_END";

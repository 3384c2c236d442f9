//! Cross-document synthesis.
//!
//! Folds a batch of per-document [`AnalysisRecord`]s into one
//! [`CanonicalMetadata`]. Union semantics per field: the first
//! occurrence of a value (case-insensitive) wins and keeps its
//! spelling, later duplicates are dropped, and each field is capped at
//! its presentation limit. Synthesis never fails; a record that
//! contributes nothing is simply skipped over.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pipedoc_core::LimitsConfig;

use crate::analyzer::AnalysisRecord;

/// Values longer than this are treated as extraction noise.
const MAX_VALUE_LEN: usize = 500;

/// Per-field presentation caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisCaps {
    pub pipeline_names: usize,
    pub sources: usize,
    pub sinks: usize,
    pub transformations: usize,
    pub business_rules: usize,
    pub dependencies: usize,
}

impl Default for SynthesisCaps {
    fn default() -> Self {
        Self {
            pipeline_names: 5,
            sources: 5,
            sinks: 5,
            transformations: 5,
            business_rules: 3,
            dependencies: 5,
        }
    }
}

impl From<&LimitsConfig> for SynthesisCaps {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            pipeline_names: limits.max_pipeline_names,
            sources: limits.max_sources,
            sinks: limits.max_sinks,
            transformations: limits.max_transformations,
            business_rules: limits.max_business_rules,
            dependencies: limits.max_dependencies,
        }
    }
}

/// The deduplicated union of everything the batch produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMetadata {
    pub pipeline_names: Vec<String>,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub transformations: Vec<String>,
    pub business_rules: Vec<String>,
    pub dependencies: Vec<String>,
    /// Filenames of the analyzed documents, in batch order.
    pub source_files: Vec<String>,
}

impl CanonicalMetadata {
    pub fn is_empty(&self) -> bool {
        self.pipeline_names.is_empty()
            && self.sources.is_empty()
            && self.sinks.is_empty()
            && self.transformations.is_empty()
            && self.business_rules.is_empty()
            && self.dependencies.is_empty()
    }
}

/// Fold the batch into one canonical set. Infallible.
pub fn synthesize(records: &[AnalysisRecord], caps: &SynthesisCaps) -> CanonicalMetadata {
    let mut metadata = CanonicalMetadata::default();
    let mut seen = FieldSeen::default();

    for record in records {
        metadata.source_files.push(record.filename.clone());

        merge(
            &mut metadata.pipeline_names,
            &mut seen.pipeline_names,
            &record.fields.pipeline_names,
            caps.pipeline_names,
            &record.filename,
        );
        merge(
            &mut metadata.sources,
            &mut seen.sources,
            &record.fields.sources,
            caps.sources,
            &record.filename,
        );
        merge(
            &mut metadata.sinks,
            &mut seen.sinks,
            &record.fields.sinks,
            caps.sinks,
            &record.filename,
        );
        merge(
            &mut metadata.transformations,
            &mut seen.transformations,
            &record.fields.transformations,
            caps.transformations,
            &record.filename,
        );
        merge(
            &mut metadata.business_rules,
            &mut seen.business_rules,
            &record.fields.business_rules,
            caps.business_rules,
            &record.filename,
        );
        merge(
            &mut metadata.dependencies,
            &mut seen.dependencies,
            &record.fields.dependencies,
            caps.dependencies,
            &record.filename,
        );
    }

    debug!(
        documents = records.len(),
        names = metadata.pipeline_names.len(),
        sources = metadata.sources.len(),
        sinks = metadata.sinks.len(),
        "batch synthesized"
    );
    metadata
}

#[derive(Default)]
struct FieldSeen {
    pipeline_names: HashSet<String>,
    sources: HashSet<String>,
    sinks: HashSet<String>,
    transformations: HashSet<String>,
    business_rules: HashSet<String>,
    dependencies: HashSet<String>,
}

fn merge(
    target: &mut Vec<String>,
    seen: &mut HashSet<String>,
    candidates: &[String],
    cap: usize,
    filename: &str,
) {
    for candidate in candidates {
        let trimmed = candidate.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_VALUE_LEN {
            warn!(filename, len = trimmed.len(), "skipping anomalous value");
            continue;
        }
        if target.len() >= cap {
            return;
        }
        if seen.insert(trimmed.to_lowercase()) {
            target.push(trimmed.to_string());
        }
    }
}

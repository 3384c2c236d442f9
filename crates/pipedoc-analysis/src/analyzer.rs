//! Rule-based document analysis.
//!
//! [`Analyzer::analyze`] turns one extracted document text into an
//! [`AnalysisRecord`]: embedded pipeline JSON (when the sentinel
//! markers are present) is parsed structurally, and everything else
//! falls back to keyword-anchored regex heuristics. The whole path is
//! a pure function of the input text, so analyzing the same document
//! twice yields identical records.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use pipedoc_core::{Catalog, Category};

use crate::pipeline::{parse_pipeline_str, ActivityRecord};
use crate::reconcile::{Reconciler, CATEGORY_CUTOFF};

pub use pipedoc_core::{PIPELINE_JSON_END, PIPELINE_JSON_START};

const MAX_NAMES: usize = 5;
const MAX_SOURCES: usize = 5;
const MAX_SINKS: usize = 5;
const MAX_TRANSFORMATIONS: usize = 5;
const MAX_BUSINESS_RULES: usize = 3;
const MAX_DEPENDENCIES: usize = 5;

lazy_static! {
    static ref SEPARATOR_RUNS: Regex = Regex::new(r"[_\-]+").unwrap();
    static ref REFERENCE_NAME: Regex =
        Regex::new(r#""referenceName"\s*:\s*"([^"]+)""#).unwrap();

    static ref NAME_RULES: Vec<Regex> = compile(&[
        r"(?i)\b(?:pipeline|data\s*flow|dataflow)\b[:\s]+([A-Za-z0-9_\-\s]+)",
        r"(?i)([A-Za-z0-9_\-\s]+)\s*\b(?:pipeline|data\s*flow|dataflow)\b",
        r"(?i)\b(?:name|title)[:\s]+([A-Za-z0-9_\-\s]+(?:pipeline|flow|dashboard))\b",
        r"(?i)([A-Za-z0-9\s\-_&]+\s+dashboard)\b",
        r"(?i)\bdashboard[:\s-]*([A-Za-z0-9\s\-_&]+)",
        r"(?i)([A-Za-z][A-Za-z0-9\s\-_&]*(?:audit|dashboard|pipeline|report)[A-Za-z0-9\s\-_&]*)",
        r"(?i)\b(?:project|system|application)[:\s]+([A-Za-z0-9_\-\s]+)",
    ]);
    static ref COPY_PASTE_NAME: Regex =
        Regex::new(r"(?i)(copy\s+and\s+paste\s+[A-Za-z0-9\s\-_&]+)").unwrap();

    static ref SOURCE_RULES: Vec<Regex> = compile(&[
        r"(?i)\b(?:source|from|input)\b[:\s]+([A-Za-z0-9_\-\.\s]+)",
        r"(?i)\b(?:database|table|file|api)\b[:\s]+([A-Za-z0-9_\-\.\s]+)",
        r"(?i)\b(?:sql\s+server|mysql|postgresql|oracle|csv|excel|json)\b[:\s]*([A-Za-z0-9_\-\.\s]*)",
        r"(?i)([A-Za-z0-9_\-\.]+\.(?:csv|xlsx?|json|xml|sql))\b",
    ]);

    static ref SINK_RULES: Vec<Regex> = compile(&[
        r"(?i)\b(?:sink|destination|output|to)\b[:\s]+([A-Za-z0-9_\-\.\s]+)",
        r"(?i)\b(?:data\s+warehouse|warehouse|mart|lake)\b[:\s]*([A-Za-z0-9_\-\.\s]*)",
        r"(?i)\b(?:azure\s+synapse|synapse|power\s+bi)\b[:\s]*([A-Za-z0-9_\-\.\s]*)",
    ]);

    static ref TRANSFORMATION_RULES: Vec<Regex> = compile(&[
        r"(?i)\b(?:transform|filter|join|aggregate|derive)\b[:\s]+([A-Za-z0-9_\-\s]+)",
        r"(?i)\b(?:calculate|compute|convert|validate)\b[:\s]+([A-Za-z0-9_\-\s]+)",
        r"(?i)([A-Za-z0-9_\-]+)(?:_transform|_filter|_join|_agg)\b",
    ]);

    static ref BUSINESS_RULE_RULES: Vec<Regex> = compile(&[
        r"(?i)\b(?:rule|policy|requirement)\b[:\s]+([^\r\n]+)",
        r"(?i)\b(?:exclude|include|validate|ensure)\b[:\s]+([^\r\n]+)",
        r"(?i)\b(?:must|should|shall)\b[:\s]+([^\r\n]+)",
    ]);

    static ref DEPENDENCY_RULES: Vec<Regex> = compile(&[
        r"(?i)\b(?:depends\s+on|requires|needs)\b[:\s]+([A-Za-z0-9_\-\.\s]+)",
        r"(?i)\b(?:upstream|downstream)\b[:\s]+([A-Za-z0-9_\-\.\s]+)",
        r"(?i)\b(?:etl|elt|pipeline)\b[:\s]+([A-Za-z0-9_\-\.\s]+)",
    ]);
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Per-field extraction results, first-appearance order, capped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub pipeline_names: Vec<String>,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    pub transformations: Vec<String>,
    pub business_rules: Vec<String>,
    pub dependencies: Vec<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.pipeline_names.is_empty()
            && self.sources.is_empty()
            && self.sinks.is_empty()
            && self.transformations.is_empty()
            && self.business_rules.is_empty()
            && self.dependencies.is_empty()
    }
}

/// Outcome of analyzing a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub filename: String,
    /// Archive the file came out of, when it was unpacked from one.
    pub source_archive: Option<String>,
    pub fields: ExtractedFields,
    /// The analyzed text, owned, so a record stands on its own after
    /// the extracted document is dropped.
    pub raw_content: String,
    /// Human-readable digest of what was found.
    pub summary: String,
    /// Structured activities, present only when embedded pipeline
    /// JSON parsed successfully.
    pub activities: Vec<ActivityRecord>,
}

/// Rule-based analyzer over extracted document text.
pub struct Analyzer {
    reconciler: Reconciler,
}

impl Analyzer {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            reconciler: Reconciler::new(catalog),
        }
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Analyze one document. Never fails: a document that matches
    /// nothing produces empty fields and a summary saying so.
    #[instrument(skip(self, text), fields(content_len = text.len()))]
    pub fn analyze(&self, text: &str, filename: &str) -> AnalysisRecord {
        let (json_sources, json_sinks, activities) = self.extract_embedded_pipeline(text);

        let lower = text.to_lowercase();

        let pipeline_names = self.extract_pipeline_names(text);
        let sources = if json_sources.is_empty() {
            collect(&SOURCE_RULES, &lower, 2, 30, MAX_SOURCES, trimmed)
        } else {
            json_sources
        };
        let sinks = if json_sinks.is_empty() {
            collect(&SINK_RULES, &lower, 2, 30, MAX_SINKS, trimmed)
        } else {
            json_sinks
        };
        let transformations = collect(
            &TRANSFORMATION_RULES,
            &lower,
            3,
            40,
            MAX_TRANSFORMATIONS,
            title_cased,
        );
        let business_rules = collect(&BUSINESS_RULE_RULES, text, 10, 200, MAX_BUSINESS_RULES, trimmed);
        let dependencies = collect(&DEPENDENCY_RULES, &lower, 3, 30, MAX_DEPENDENCIES, title_cased);

        let fields = ExtractedFields {
            pipeline_names,
            sources,
            sinks,
            transformations,
            business_rules,
            dependencies,
        };

        let summary = build_summary(filename, &fields);
        debug!(
            names = fields.pipeline_names.len(),
            sources = fields.sources.len(),
            sinks = fields.sinks.len(),
            activities = activities.len(),
            "document analyzed"
        );

        AnalysisRecord {
            filename: filename.to_string(),
            source_archive: None,
            fields,
            raw_content: text.to_string(),
            summary,
            activities,
        }
    }

    fn extract_pipeline_names(&self, text: &str) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen = HashSet::new();

        for rule in NAME_RULES.iter() {
            for caps in rule.captures_iter(text) {
                let Some(m) = caps.get(1) else { continue };
                let clean = normalize_separators(m.as_str());
                if clean.len() > 3 && clean.len() < 80 {
                    push_unique(&mut names, &mut seen, clean, MAX_NAMES);
                }
            }
        }

        for caps in COPY_PASTE_NAME.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let clean = title_case(m.as_str());
                if clean.len() > 10 {
                    push_unique(&mut names, &mut seen, clean, MAX_NAMES);
                }
            }
        }

        names
    }

    /// Sentinel-delimited pipeline JSON: source set, sink set,
    /// structured activities. Structured sources keep catalog
    /// categories; everything on an activity's output side is a sink.
    fn extract_embedded_pipeline(
        &self,
        text: &str,
    ) -> (Vec<String>, Vec<String>, Vec<ActivityRecord>) {
        let mut sources = Vec::new();
        let mut sinks = Vec::new();
        let mut seen_sources = HashSet::new();
        let mut seen_sinks = HashSet::new();

        let Some(json_text) = embedded_json_span(text) else {
            return (sources, sinks, Vec::new());
        };

        match parse_pipeline_str(json_text, &self.reconciler) {
            Ok(activities) => {
                for activity in &activities {
                    if let Some(reference) = &activity.source_reference {
                        let resolved = self.reconciler.reconcile(reference, CATEGORY_CUTOFF);
                        trace!(reference, canonical = %resolved.canonical_name, "input resolved");
                        if resolved.is_cataloged() && resolved.category == Category::Sink {
                            push_unique(
                                &mut sinks,
                                &mut seen_sinks,
                                resolved.canonical_name,
                                MAX_SINKS,
                            );
                        } else {
                            push_unique(
                                &mut sources,
                                &mut seen_sources,
                                resolved.canonical_name,
                                MAX_SOURCES,
                            );
                        }
                    }
                    if let Some(reference) = &activity.sink_reference {
                        let resolved = self.reconciler.reconcile(reference, CATEGORY_CUTOFF);
                        push_unique(
                            &mut sinks,
                            &mut seen_sinks,
                            resolved.canonical_name,
                            MAX_SINKS,
                        );
                    }
                }
                (sources, sinks, activities)
            }
            Err(err) => {
                debug!(path = err.path(), %err, "embedded pipeline JSON rejected, scanning references");
                for caps in REFERENCE_NAME.captures_iter(text) {
                    let Some(m) = caps.get(1) else { continue };
                    let resolved = self.reconciler.reconcile(m.as_str(), CATEGORY_CUTOFF);
                    if resolved.is_cataloged() && resolved.category == Category::Sink {
                        push_unique(
                            &mut sinks,
                            &mut seen_sinks,
                            resolved.canonical_name,
                            MAX_SINKS,
                        );
                    } else {
                        push_unique(
                            &mut sources,
                            &mut seen_sources,
                            resolved.canonical_name,
                            MAX_SOURCES,
                        );
                    }
                }
                (sources, sinks, Vec::new())
            }
        }
    }
}

/// Locate the balanced JSON object between the sentinel markers.
fn embedded_json_span(text: &str) -> Option<&str> {
    let start = text.find(PIPELINE_JSON_START)?;
    let end = text.find(PIPELINE_JSON_END)?;
    if end <= start {
        return None;
    }
    let section = &text[start..end];
    let open = section.find('{')?;
    balanced_json_span(&section[open..])
}

/// Depth scan over raw bytes; quoted braces are not special-cased.
fn balanced_json_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn collect(
    rules: &[Regex],
    text: &str,
    min_len: usize,
    max_len: usize,
    cap: usize,
    normalize: fn(&str) -> String,
) -> Vec<String> {
    let mut values = Vec::new();
    let mut seen = HashSet::new();
    for rule in rules {
        for caps in rule.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let clean = normalize(m.as_str());
            if clean.len() > min_len && clean.len() < max_len {
                push_unique(&mut values, &mut seen, clean, cap);
            }
        }
    }
    values
}

/// Case-insensitive first-appearance dedup with a hard cap.
fn push_unique(values: &mut Vec<String>, seen: &mut HashSet<String>, value: String, cap: usize) {
    if values.len() >= cap {
        return;
    }
    let key = value.to_lowercase();
    if seen.insert(key) {
        values.push(value);
    }
}

/// Collapse `_`/`-` runs and surplus whitespace into single spaces.
fn normalize_separators(raw: &str) -> String {
    let replaced = SEPARATOR_RUNS.replace_all(raw.trim(), " ");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trimmed(raw: &str) -> String {
    raw.trim().to_string()
}

/// Separator normalization followed by word capitalization, so
/// `nightly_oracle_refresh` becomes `Nightly Oracle Refresh`.
fn title_cased(raw: &str) -> String {
    title_case(&normalize_separators(raw))
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn build_summary(filename: &str, fields: &ExtractedFields) -> String {
    if fields.is_empty() {
        return format!(
            "Analysis of {filename}: no significant pipeline information found; \
             manual review recommended."
        );
    }

    let mut parts = vec![format!("Analysis of {filename}:")];
    let mut section = |label: &str, values: &[String]| {
        if !values.is_empty() {
            parts.push(format!("{label}: {}", values.join(", ")));
        }
    };
    section("Pipeline names", &fields.pipeline_names);
    section("Data sources", &fields.sources);
    section("Data destinations", &fields.sinks);
    section("Transformations", &fields.transformations);
    section("Business rules", &fields.business_rules);
    section("Dependencies", &fields.dependencies);
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyzer() -> Analyzer {
        Analyzer::new(Catalog::builtin())
    }

    fn wrapped(json: &str) -> String {
        format!("{PIPELINE_JSON_START}\n{json}\n{PIPELINE_JSON_END}")
    }

    #[test]
    fn test_prose_degrades_gracefully() {
        let text = "Meeting notes. Attendees reviewed the quarterly agenda \
                    and approved the hiring plan. Next meeting occurs in March.";
        let record = analyzer().analyze(text, "minutes.txt");

        assert!(record.fields.is_empty());
        assert!(record.activities.is_empty());
        assert!(record.summary.contains("no significant"));
        // The record keeps the analyzed text even when nothing matched.
        assert_eq!(record.raw_content, text);
    }

    #[test]
    fn test_embedded_json_sources_and_sinks() {
        let text = wrapped(
            r#"{"properties": {"activities": [{
                "name": "CopyA", "type": "Copy",
                "inputs": [{"referenceName": "AGLPRD"}],
                "outputs": [{"referenceName": "AzureDataLakeStorage1"}]
            }]}}"#,
        );
        let record = analyzer().analyze(&text, "pipeline.json");

        assert_eq!(record.fields.sources, vec!["AGLPRD"]);
        assert_eq!(record.fields.sinks, vec!["AzureDataLakeStorage1"]);
        assert_eq!(record.activities.len(), 1);
        assert_eq!(record.activities[0].source_type, "Oracle");
    }

    #[test]
    fn test_json_takes_priority_over_heuristics() {
        let text = format!(
            "source: legacyfeed\n{}",
            wrapped(
                r#"{"properties": {"activities": [{
                    "name": "CopyA", "type": "Copy",
                    "inputs": [{"referenceName": "AGLPRD"}]
                }]}}"#
            )
        );
        let record = analyzer().analyze(&text, "mixed.txt");

        // Structured sources win; the free-text candidate is dropped.
        assert_eq!(record.fields.sources, vec!["AGLPRD"]);
    }

    #[test]
    fn test_output_reference_is_always_a_sink() {
        // AGLPRD is cataloged as a source, but appearing in outputs
        // makes it a sink.
        let text = wrapped(
            r#"{"properties": {"activities": [{
                "name": "CopyA", "type": "Copy",
                "outputs": [{"referenceName": "AGLPRD"}]
            }]}}"#,
        );
        let record = analyzer().analyze(&text, "pipeline.json");

        assert!(record.fields.sources.is_empty());
        assert_eq!(record.fields.sinks, vec!["AGLPRD"]);
    }

    #[test]
    fn test_malformed_embedded_json_falls_back_to_reference_scan() {
        let text = format!(
            "{PIPELINE_JSON_START}\n{{\"properties\": {{\"activities\": \"oops\"}}}}\n\
             \"referenceName\": \"AGLPRD\"\n\
             \"referenceName\": \"AzureDataLakeStorage1\"\n{PIPELINE_JSON_END}"
        );
        let record = analyzer().analyze(&text, "broken.json");

        assert_eq!(record.fields.sources, vec!["AGLPRD"]);
        assert_eq!(record.fields.sinks, vec!["AzureDataLakeStorage1"]);
        assert!(record.activities.is_empty());
    }

    #[test]
    fn test_brace_scanner_ignores_trailing_noise() {
        let text = format!(
            "prefix text {PIPELINE_JSON_START} header {{\"properties\": \
             {{\"activities\": []}}}} trailing {PIPELINE_JSON_END} suffix"
        );
        let record = analyzer().analyze(&text, "padded.json");
        // The span parsed cleanly even with noise around it.
        assert!(record.fields.sources.is_empty());
        assert!(record.activities.is_empty());
    }

    #[test]
    fn test_heuristic_field_extraction() {
        let text = "Pipeline: Inpatient_Admissions\n\
                    Source: AGLPRD extract, loaded nightly\n\
                    Destination: reporting warehouse, refreshed daily\n\
                    Transform: aggregate monthly totals\n\
                    Rule: exclude test patients from all extracts\n\
                    Depends on: nightly_oracle_refresh\n";
        let record = analyzer().analyze(text, "notes.txt");

        assert!(record
            .fields
            .pipeline_names
            .iter()
            .any(|n| n.contains("Inpatient Admissions")));
        assert!(!record.fields.sources.is_empty());
        assert!(!record.fields.sinks.is_empty());
        assert!(!record.fields.transformations.is_empty());
        assert!(record.fields.business_rules[0].contains("exclude test patients"));
        assert!(record
            .fields
            .dependencies
            .iter()
            .any(|d| d.contains("Nightly Oracle Refresh")));
    }

    #[test]
    fn test_field_length_windows() {
        // Below and above the business-rule window: both rejected.
        let text = "Rule: short\nPolicy: x\n";
        let record = analyzer().analyze(text, "rules.txt");
        assert!(record.fields.business_rules.is_empty());

        let long_rule = format!("Rule: {}", "x".repeat(250));
        let record = analyzer().analyze(&long_rule, "rules.txt");
        assert!(record.fields.business_rules.is_empty());
    }

    #[test]
    fn test_caps_and_dedup() {
        let mut text = String::new();
        for i in 0..10 {
            text.push_str(&format!("Rule: records older than {i} years are excluded from loads\n"));
        }
        text.push_str("Rule: records older than 0 years are excluded from loads\n");

        let record = analyzer().analyze(&text, "rules.txt");
        assert_eq!(record.fields.business_rules.len(), 3);
        let unique: HashSet<_> = record.fields.business_rules.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let text = format!(
            "Pipeline: Admissions Flow\n{}",
            wrapped(
                r#"{"properties": {"activities": [{
                    "name": "CopyA", "type": "Copy",
                    "inputs": [{"referenceName": "AGLPRD"}],
                    "outputs": [{"referenceName": "Sink1"}]
                }]}}"#
            )
        );
        let a = analyzer();
        let first = a.analyze(&text, "doc.txt");
        let second = a.analyze(&text, "doc.txt");
        assert_eq!(first, second);
    }
}

//! Markdown rendering of the fixed documentation template.
//!
//! Section numbering follows the established template: sections 1-4,
//! then 6 and 7. Section 5 is reserved for the manually-maintained
//! security and access chapter and is intentionally absent from
//! generated output.

use chrono::Local;
use tracing::debug;

use pipedoc_analysis::CanonicalMetadata;
use pipedoc_core::Catalog;

use crate::{DocumentRenderer, RenderOptions, Result, DEFAULT_DATA_FLOW_NAME};

const MAX_TABLE_SOURCES: usize = 3;
const MAX_TABLE_SINKS: usize = 3;

/// Renders the documentation template as Markdown.
pub struct MarkdownRenderer {
    catalog: Catalog,
}

impl MarkdownRenderer {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    fn data_flow_name<'a>(&self, metadata: &'a CanonicalMetadata) -> &'a str {
        metadata
            .pipeline_names
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_DATA_FLOW_NAME)
    }

    /// Type and format columns for a source row, catalog first, then
    /// name heuristics.
    fn source_columns(&self, name: &str) -> (&'static str, String) {
        if let Some(entry) = self.catalog.get_ignore_case(name) {
            let kind = if entry.system_type.contains("Lake") {
                "Data Lake"
            } else {
                "Database"
            };
            return (kind, entry.system_type.clone());
        }
        let lower = name.to_lowercase();
        if [".csv", "excel", ".xlsx"].iter().any(|f| lower.contains(f)) {
            ("File", "Excel/CSV".to_string())
        } else if ["api", "service", "endpoint"].iter().any(|f| lower.contains(f)) {
            ("API", "REST API".to_string())
        } else {
            ("Database", "SQL Server".to_string())
        }
    }

    fn sink_columns(&self, name: &str) -> (&'static str, String) {
        if let Some(entry) = self.catalog.get_ignore_case(name) {
            let kind = if entry.system_type.contains("Lake") {
                "Data Lake"
            } else {
                "Data Warehouse"
            };
            return (kind, entry.system_type.clone());
        }
        let lower = name.to_lowercase();
        if lower.contains("power bi") || lower.contains("powerbi") {
            ("BI Platform", "Dataset".to_string())
        } else if lower.contains("dashboard") {
            ("Dashboard", "Aggregated Data".to_string())
        } else {
            ("Data Warehouse", "Parquet".to_string())
        }
    }

    fn sources_and_sinks_table(&self, metadata: &CanonicalMetadata) -> String {
        let mut rows = Vec::new();

        for name in metadata.sources.iter().take(MAX_TABLE_SOURCES) {
            let (kind, format) = self.source_columns(name);
            rows.push(format!(
                "| {name} | {kind} | As specified in source documentation | {format} | \
                 Data source identified from uploaded documentation |"
            ));
        }
        for name in metadata.sinks.iter().take(MAX_TABLE_SINKS) {
            let (kind, format) = self.sink_columns(name);
            rows.push(format!(
                "| {name} | {kind} | As specified in destination documentation | {format} | \
                 Data destination identified from uploaded documentation |"
            ));
        }

        if rows.is_empty() {
            let name = self.data_flow_name(metadata);
            rows.push(format!(
                "| {name} Source | Database | To be specified from documentation | SQL Server | \
                 Primary data source, requires manual specification |"
            ));
            rows.push(format!(
                "| {name} Destination | Data Warehouse | Azure Synapse | Parquet | \
                 Primary destination, requires manual specification |"
            ));
        }

        let mut table = String::from(
            "| Source/Sink Name | Type | Location | Format | Description/Notes |\n\
             |---|---|---|---|---|\n",
        );
        table.push_str(&rows.join("\n"));
        table
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, metadata: &CanonicalMetadata, options: &RenderOptions) -> Result<String> {
        let data_flow_name = self.data_flow_name(metadata);
        let title = options
            .title
            .as_deref()
            .unwrap_or(data_flow_name);
        let date = options
            .generated_on
            .unwrap_or_else(|| Local::now().date_naive())
            .format("%Y-%m-%d");

        let mut out = String::new();
        let mut push = |line: &str| {
            out.push_str(line);
            out.push('\n');
        };

        push(&format!("# {title} - Documentation"));
        push("");

        // 1. General Information
        push("## 1. General Information");
        push("");
        push("### Data Flow Name");
        push("");
        push(&format!("**Data Flow Name: {data_flow_name}**"));
        push("");
        push("### Data Flow Screenshot");
        push("");
        push("[Screenshot placeholder - insert the actual data flow screenshot here]");
        push("");
        if !metadata.source_files.is_empty() {
            push("### Source Documents");
            push("");
            for file in &metadata.source_files {
                push(&format!("- {file}"));
            }
            push("");
        }

        // 2. Source(s) and Sink(s)
        push("## 2. Source(s) and Sink(s)");
        push("");
        push(&self.sources_and_sinks_table(metadata));
        push("");

        // 3. Data Flow Logic & Business Rules
        push("## 3. Data Flow Logic & Business Rules");
        push("");
        push("### Step-by-Step Breakdown");
        push("");
        if metadata.transformations.is_empty() {
            push("No transformation steps identified from the provided documentation.");
        } else {
            for (i, transform) in metadata.transformations.iter().enumerate() {
                push(&format!("**Step {}:** {transform}", i + 1));
            }
        }
        push("");
        push("### Key Transformations/Business Rules");
        push("");
        if metadata.business_rules.is_empty() {
            push("No business rules identified from the provided documentation.");
        } else {
            for (i, rule) in metadata.business_rules.iter().enumerate() {
                push(&format!("**Rule {}:** {rule}", i + 1));
            }
        }
        push("");

        // 4. Dependencies & Related Assets
        push("## 4. Dependencies & Related Assets");
        push("");
        push("### Upstream Dependencies");
        push("");
        let (upstream, downstream): (Vec<_>, Vec<_>) = metadata
            .dependencies
            .iter()
            .partition(|d| !d.to_lowercase().contains("downstream"));
        if upstream.is_empty() {
            push("No upstream dependencies identified from the provided documentation.");
        } else {
            for dep in upstream {
                push(&format!("- {dep}"));
            }
        }
        push("");
        push("### Downstream Dependencies");
        push("");
        if downstream.is_empty() {
            push("No downstream dependencies identified from the provided documentation.");
        } else {
            for dep in downstream {
                push(&format!("- {dep}"));
            }
        }
        push("");

        // 6. Performance & Maintenance
        push("## 6. Performance & Maintenance");
        push("");
        push("### Integration Runtime");
        push("");
        push(
            "Auto-resolve integration runtime (default). Update this section if a \
             self-hosted runtime or specific compute sizing is in use.",
        );
        push("");
        push("### Known Issues/Considerations");
        push("");
        push("No specific issues identified from the provided documentation.");
        push("");

        // 7. Change Log
        push("## 7. Change Log");
        push("");
        push("| Version | Date | Author | Changes Made |");
        push("|---|---|---|---|");
        push(&format!(
            "| 1.0 | {date} | {} | Initial version generated from uploaded documentation. |",
            options.author
        ));

        debug!(
            data_flow_name,
            sources = metadata.sources.len(),
            sinks = metadata.sinks.len(),
            bytes = out.len(),
            "rendered markdown document"
        );
        Ok(out)
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn metadata() -> CanonicalMetadata {
        CanonicalMetadata {
            pipeline_names: vec!["Inpatient Admissions Flow".into()],
            sources: vec!["AGLPRD".into(), "monthly.csv".into()],
            sinks: vec!["AzureDataLakeStorage1".into()],
            transformations: vec!["Aggregate Monthly Totals".into()],
            business_rules: vec!["Exclude test patients from all extracts".into()],
            dependencies: vec!["Nightly Oracle Refresh".into(), "Downstream Power Bi Reports".into()],
            source_files: vec!["pipeline.json".into(), "notes.txt".into()],
        }
    }

    fn render(metadata: &CanonicalMetadata) -> String {
        let renderer = MarkdownRenderer::new(Catalog::builtin());
        let options = RenderOptions {
            generated_on: NaiveDate::from_ymd_opt(2026, 8, 30),
            ..RenderOptions::default()
        };
        renderer.render(metadata, &options).unwrap()
    }

    #[test]
    fn test_section_ordering() {
        let doc = render(&metadata());
        let sections = [
            "## 1. General Information",
            "## 2. Source(s) and Sink(s)",
            "## 3. Data Flow Logic & Business Rules",
            "## 4. Dependencies & Related Assets",
            "## 6. Performance & Maintenance",
            "## 7. Change Log",
        ];
        let mut last = 0;
        for section in sections {
            let pos = doc.find(section).unwrap_or_else(|| panic!("missing {section}"));
            assert!(pos > last, "{section} out of order");
            last = pos;
        }
        // Section 5 is reserved, never generated.
        assert!(!doc.contains("## 5."));
    }

    #[test]
    fn test_catalog_typed_table_rows() {
        let doc = render(&metadata());
        assert!(doc.contains("| AGLPRD | Database | As specified in source documentation | Oracle |"));
        assert!(doc.contains("| monthly.csv | File |"));
        assert!(doc
            .contains("| AzureDataLakeStorage1 | Data Lake |"));
    }

    #[test]
    fn test_change_log_seed_row() {
        let doc = render(&metadata());
        assert!(doc.contains(
            "| 1.0 | 2026-08-30 | pipedoc | Initial version generated from uploaded documentation. |"
        ));
    }

    #[test]
    fn test_default_data_flow_name() {
        let empty = CanonicalMetadata::default();
        let doc = render(&empty);
        assert!(doc.contains(&format!("**Data Flow Name: {DEFAULT_DATA_FLOW_NAME}**")));
        // Placeholder table rows carry the default label too.
        assert!(doc.contains(&format!("| {DEFAULT_DATA_FLOW_NAME} Source |")));
    }

    #[test]
    fn test_dependency_partition() {
        let doc = render(&metadata());
        let upstream_pos = doc.find("### Upstream Dependencies").unwrap();
        let downstream_pos = doc.find("### Downstream Dependencies").unwrap();
        let oracle_pos = doc.find("- Nightly Oracle Refresh").unwrap();
        let powerbi_pos = doc.find("- Downstream Power Bi Reports").unwrap();
        assert!(upstream_pos < oracle_pos && oracle_pos < downstream_pos);
        assert!(downstream_pos < powerbi_pos);
    }

    #[test]
    fn test_title_override() {
        let renderer = MarkdownRenderer::new(Catalog::builtin());
        let options = RenderOptions {
            title: Some("Custom Title".into()),
            ..RenderOptions::default()
        };
        let doc = renderer.render(&metadata(), &options).unwrap();
        assert!(doc.starts_with("# Custom Title - Documentation"));
        assert_eq!(renderer.extension(), "md");
    }
}

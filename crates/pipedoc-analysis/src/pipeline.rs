//! Pipeline-definition JSON parsing.
//!
//! Walks an Azure-Data-Factory-style pipeline document
//! (`properties.activities[]`) and extracts one [`ActivityRecord`] per
//! activity. Parsing is a pure, synchronous, one-shot transformation:
//! a document without an activities array yields an empty list, while
//! a document whose fields have incompatible types fails with a
//! [`AnalysisError::MalformedPipeline`] carrying the offending path.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::reconcile::{Reconciler, DB_TYPE_CUTOFF};

/// One pipeline step, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Declared activity identifier; not required to be unique.
    pub name: String,
    /// Activity kind, e.g. `Copy` or `ExecuteDataFlow`.
    pub activity_type: String,
    /// Raw `inputs[0].referenceName`, pre-reconciliation.
    pub source_reference: Option<String>,
    /// Raw `outputs[0].referenceName`, pre-reconciliation.
    pub sink_reference: Option<String>,
    /// Resolved catalog type for the source, or `"Unknown"`.
    pub source_type: String,
    /// Resolved catalog type for the sink, or `"Unknown"`.
    pub sink_type: String,
    /// Names of activities this one waits on. Informational only;
    /// carries no execution semantics.
    pub depends_on: Vec<String>,
    /// `policy.timeout`, passed through verbatim.
    pub timeout: Option<String>,
    /// `policy.retry`, passed through verbatim.
    pub retry_count: Option<i64>,
    /// Reader query from `typeProperties.source`, whichever of
    /// `oracleReaderQuery`, `sqlReaderQuery`, or `query` is present.
    pub source_query: Option<String>,
    /// `typeProperties.dataflow.referenceName`.
    pub dataflow_reference: Option<String>,
    /// `typeProperties.staging.linkedService.referenceName`.
    pub staging_reference: Option<String>,
    /// `typeProperties.compute` hints, when present.
    pub compute: Option<ComputeHint>,
}

/// Optional compute sizing attached to data-flow activities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeHint {
    pub core_count: Option<i64>,
    pub compute_type: Option<String>,
}

/// Parse a pipeline document that arrived as text.
pub fn parse_pipeline_str(text: &str, reconciler: &Reconciler) -> Result<Vec<ActivityRecord>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| AnalysisError::malformed("$", e.to_string()))?;
    parse_pipeline(&value, reconciler)
}

/// Parse an already-decoded pipeline document.
///
/// A document without `properties.activities` yields `Ok(vec![])`.
pub fn parse_pipeline(doc: &Value, reconciler: &Reconciler) -> Result<Vec<ActivityRecord>> {
    let Some(properties) = doc.get("properties") else {
        return Ok(Vec::new());
    };
    if !properties.is_object() {
        return Err(AnalysisError::malformed("properties", "expected object"));
    }

    let Some(activities) = properties.get("activities") else {
        return Ok(Vec::new());
    };
    let activities = activities
        .as_array()
        .ok_or_else(|| AnalysisError::malformed("properties.activities", "expected array"))?;

    let mut records = Vec::with_capacity(activities.len());
    for (i, activity) in activities.iter().enumerate() {
        let path = format!("properties.activities[{i}]");
        let activity = activity
            .as_object()
            .ok_or_else(|| AnalysisError::malformed(&path, "expected object"))?;

        let name = str_field(activity.get("name")).unwrap_or_default();
        let activity_type = str_field(activity.get("type")).unwrap_or_default();

        let source_reference =
            first_reference(activity.get("inputs"), &format!("{path}.inputs"))?;
        let sink_reference =
            first_reference(activity.get("outputs"), &format!("{path}.outputs"))?;

        let mut source_type = source_reference
            .as_deref()
            .map(|r| reconciler.reconcile(r, DB_TYPE_CUTOFF).system_type)
            .unwrap_or_else(|| "Unknown".to_string());
        let mut sink_type = sink_reference
            .as_deref()
            .map(|r| reconciler.reconcile(r, DB_TYPE_CUTOFF).system_type)
            .unwrap_or_else(|| "Unknown".to_string());

        let depends_on = depends_on(activity.get("dependsOn"), &format!("{path}.dependsOn"))?;

        let policy = activity.get("policy");
        let timeout = str_field(policy.and_then(|p| p.get("timeout")));
        let retry_count = policy.and_then(|p| p.get("retry")).and_then(Value::as_i64);

        let type_props = activity.get("typeProperties");

        // The declared connector type fills in only when a reference
        // is present but the catalog could not resolve it.
        if source_reference.is_some() && source_type == "Unknown" {
            if let Some(declared) = str_field(
                type_props
                    .and_then(|t| t.get("source"))
                    .and_then(|s| s.get("type")),
            ) {
                if let Some(label) = connector_type_label(&declared) {
                    source_type = label.to_string();
                }
            }
        }
        if sink_reference.is_some() && sink_type == "Unknown" {
            if let Some(declared) = str_field(
                type_props
                    .and_then(|t| t.get("sink"))
                    .and_then(|s| s.get("type")),
            ) {
                if let Some(label) = connector_type_label(&declared) {
                    sink_type = label.to_string();
                }
            }
        }

        let source_query = type_props
            .and_then(|t| t.get("source"))
            .and_then(|s| {
                s.get("oracleReaderQuery")
                    .or_else(|| s.get("sqlReaderQuery"))
                    .or_else(|| s.get("query"))
            })
            .and_then(Value::as_str)
            .map(str::to_string);

        let dataflow_reference = str_field(
            type_props
                .and_then(|t| t.get("dataflow"))
                .and_then(|d| d.get("referenceName")),
        );

        let staging_reference = str_field(
            type_props
                .and_then(|t| t.get("staging"))
                .and_then(|s| s.get("linkedService"))
                .and_then(|l| l.get("referenceName")),
        );

        let compute = type_props.and_then(|t| t.get("compute")).map(|c| ComputeHint {
            core_count: c.get("coreCount").and_then(Value::as_i64),
            compute_type: str_field(c.get("computeType")),
        });

        records.push(ActivityRecord {
            name,
            activity_type,
            source_reference,
            sink_reference,
            source_type,
            sink_type,
            depends_on,
            timeout,
            retry_count,
            source_query,
            dataflow_reference,
            staging_reference,
            compute,
        });
    }

    debug!(activity_count = records.len(), "parsed pipeline document");
    Ok(records)
}

fn str_field(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

/// `inputs[0].referenceName` / `outputs[0].referenceName`.
fn first_reference(value: Option<&Value>, path: &str) -> Result<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .ok_or_else(|| AnalysisError::malformed(path, "expected array"))?;
    Ok(items
        .first()
        .and_then(|item| item.get("referenceName"))
        .and_then(Value::as_str)
        .map(str::to_string))
}

fn depends_on(value: Option<&Value>, path: &str) -> Result<Vec<String>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| AnalysisError::malformed(path, "expected array"))?;
    Ok(items
        .iter()
        .filter_map(|item| item.get("activity"))
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

/// Fixed lookup from Data Factory connector type names to the
/// human-readable labels used in rendered documentation.
fn connector_type_label(declared: &str) -> Option<&'static str> {
    match declared {
        "OracleSource" | "OracleSink" => Some("Oracle"),
        "SqlSource" | "SqlServerSource" | "AzureSqlSource" | "SqlSink" | "SqlServerSink"
        | "AzureSqlSink" => Some("SQL Server"),
        "ParquetSource" | "ParquetSink" => Some("Parquet File"),
        "DelimitedTextSource" | "DelimitedTextSink" => Some("Delimited Text"),
        "AzureBlobFSSource" | "AzureBlobFSSink" | "AzureDataLakeStoreSource"
        | "AzureDataLakeStoreSink" => Some("Azure Data Lake Storage Gen2"),
        "JsonSource" | "JsonSink" => Some("JSON"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipedoc_core::Catalog;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn reconciler() -> Reconciler {
        Reconciler::new(Catalog::builtin())
    }

    #[test]
    fn test_parse_totality() {
        let r = reconciler();

        assert_eq!(parse_pipeline(&json!({}), &r).unwrap(), vec![]);
        assert_eq!(
            parse_pipeline(&json!({"properties": {"activities": []}}), &r).unwrap(),
            vec![]
        );
        assert_eq!(
            parse_pipeline(&json!({"properties": {}}), &r).unwrap(),
            vec![]
        );
    }

    #[test]
    fn test_parse_basic_extraction() {
        let doc = json!({
            "properties": {
                "activities": [{
                    "name": "CopyA",
                    "type": "Copy",
                    "inputs": [{"referenceName": "AGLPRD"}],
                    "outputs": [{"referenceName": "Sink1"}]
                }]
            }
        });

        let records = parse_pipeline(&doc, &reconciler()).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.name, "CopyA");
        assert_eq!(record.activity_type, "Copy");
        assert_eq!(record.source_reference.as_deref(), Some("AGLPRD"));
        assert_eq!(record.source_type, "Oracle");
        assert_eq!(record.sink_reference.as_deref(), Some("Sink1"));
    }

    #[test]
    fn test_parse_policy_and_depends_on() {
        let doc = json!({
            "properties": {
                "activities": [{
                    "name": "B",
                    "type": "Copy",
                    "dependsOn": [{"activity": "A", "dependencyConditions": ["Succeeded"]}],
                    "policy": {"timeout": "7.00:00:00", "retry": 2}
                }]
            }
        });

        let records = parse_pipeline(&doc, &reconciler()).unwrap();
        assert_eq!(records[0].depends_on, vec!["A"]);
        assert_eq!(records[0].timeout.as_deref(), Some("7.00:00:00"));
        assert_eq!(records[0].retry_count, Some(2));
    }

    #[test]
    fn test_parse_type_properties() {
        let doc = json!({
            "properties": {
                "activities": [{
                    "name": "CopyOracle",
                    "type": "Copy",
                    "inputs": [{"referenceName": "NotInCatalogAtAll"}],
                    "typeProperties": {
                        "source": {
                            "type": "OracleSource",
                            "oracleReaderQuery": "SELECT * FROM ADMISSIONS"
                        },
                        "sink": {"type": "ParquetSink"},
                        "staging": {"linkedService": {"referenceName": "StagingLake"}},
                        "compute": {"coreCount": 16, "computeType": "General"}
                    }
                }]
            }
        });

        let records = parse_pipeline(&doc, &reconciler()).unwrap();
        let record = &records[0];

        // Reconciliation failed, so the declared connector type fills in.
        assert_eq!(record.source_type, "Oracle");
        // No outputs: the sink type stays unresolved even though the
        // connector declares one.
        assert_eq!(record.sink_reference, None);
        assert_eq!(record.sink_type, "Unknown");
        assert_eq!(
            record.source_query.as_deref(),
            Some("SELECT * FROM ADMISSIONS")
        );
        assert_eq!(record.staging_reference.as_deref(), Some("StagingLake"));
        let compute = record.compute.as_ref().unwrap();
        assert_eq!(compute.core_count, Some(16));
        assert_eq!(compute.compute_type.as_deref(), Some("General"));
    }

    #[test]
    fn test_parse_dataflow_reference() {
        let doc = json!({
            "properties": {
                "activities": [{
                    "name": "RunFlow",
                    "type": "ExecuteDataFlow",
                    "typeProperties": {"dataflow": {"referenceName": "InpatientFlow"}}
                }]
            }
        });

        let records = parse_pipeline(&doc, &reconciler()).unwrap();
        assert_eq!(records[0].dataflow_reference.as_deref(), Some("InpatientFlow"));
    }

    #[test]
    fn test_parse_malformed_activities() {
        let doc = json!({"properties": {"activities": "not-an-array"}});
        let err = parse_pipeline(&doc, &reconciler()).unwrap_err();
        assert_eq!(err.path(), "properties.activities");
    }

    #[test]
    fn test_parse_malformed_activity_entry() {
        let doc = json!({"properties": {"activities": [42]}});
        let err = parse_pipeline(&doc, &reconciler()).unwrap_err();
        assert_eq!(err.path(), "properties.activities[0]");
    }

    #[test]
    fn test_parse_malformed_inputs() {
        let doc = json!({
            "properties": {"activities": [{"name": "A", "type": "Copy", "inputs": {}}]}
        });
        let err = parse_pipeline(&doc, &reconciler()).unwrap_err();
        assert_eq!(err.path(), "properties.activities[0].inputs");
    }

    #[test]
    fn test_parse_str_invalid_json() {
        let err = parse_pipeline_str("{not json", &reconciler()).unwrap_err();
        assert_eq!(err.path(), "$");
    }

    #[test]
    fn test_connector_type_label() {
        assert_eq!(connector_type_label("OracleSource"), Some("Oracle"));
        assert_eq!(connector_type_label("SqlSink"), Some("SQL Server"));
        assert_eq!(connector_type_label("SomethingElse"), None);
    }
}

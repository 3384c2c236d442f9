//! Text extractors for the supported document formats.
//!
//! Every format goes through the same async [`TextExtractor`] trait;
//! the [`ExtractorRegistry`] dispatches on the content type guessed
//! from the filename. Binary formats (PDF, Word, Excel) are compiled
//! in only with their cargo feature; without it the registry still
//! resolves them, to an extractor that fails with a typed
//! feature-disabled error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use pipedoc_core::{PIPELINE_JSON_END, PIPELINE_JSON_START};

use crate::{IngestionError, Result};

/// Result of text extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text content
    pub text: String,
    /// Detected content type
    pub content_type: String,
    /// Character encoding used
    pub encoding: String,
    /// Whether extraction was complete or truncated
    pub complete: bool,
    /// Warnings during extraction
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn new(text: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            content_type: content_type.into(),
            encoding: "utf-8".to_string(),
            complete: true,
            warnings: Vec::new(),
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn partial(mut self) -> Self {
        self.complete = false;
        self
    }
}

/// Trait for document text extractors
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from document content
    async fn extract(&self, content: &[u8], filename: Option<&str>) -> Result<ExtractionResult>;

    /// Content types (or fragments of them) this extractor handles
    fn supported_types(&self) -> Vec<&'static str>;

    /// Check if this extractor can handle the content type
    fn can_handle(&self, content_type: &str) -> bool {
        self.supported_types()
            .iter()
            .any(|&t| content_type.starts_with(t) || content_type.contains(t))
    }

    /// Get extractor name
    fn name(&self) -> &'static str;
}

/// Decode bytes as UTF-8, falling back to Windows-1252.
fn decode_text(content: &[u8]) -> (String, &'static str) {
    match std::str::from_utf8(content) {
        Ok(s) => (s.to_string(), "utf-8"),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(content);
            if had_errors {
                (decoded.into_owned(), "windows-1252-lossy")
            } else {
                (decoded.into_owned(), "windows-1252")
            }
        }
    }
}

/// Plain text extractor, also the registry fallback.
pub struct PlainTextExtractor {
    /// Maximum content size to process
    max_size: usize,
}

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self {
            max_size: 10 * 1024 * 1024,
        }
    }

    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, content: &[u8], _filename: Option<&str>) -> Result<ExtractionResult> {
        if content.len() > self.max_size {
            return Err(IngestionError::ExtractionFailed(format!(
                "content too large: {} bytes (max {})",
                content.len(),
                self.max_size
            )));
        }

        let (text, encoding) = decode_text(content);
        let mut result = ExtractionResult::new(text, "text/plain");
        result.encoding = encoding.to_string();

        debug!(encoding = %encoding, size = content.len(), "extracted plain text");
        Ok(result)
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/plain", "text/x-"]
    }

    fn name(&self) -> &'static str {
        "plain_text"
    }
}

/// CSV extractor: header plus the first rows, one ` | `-joined line
/// per record.
pub struct CsvExtractor {
    /// Rows rendered after the header
    max_rows: usize,
}

impl CsvExtractor {
    pub fn new() -> Self {
        Self { max_rows: 100 }
    }

    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows;
        self
    }
}

impl Default for CsvExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for CsvExtractor {
    async fn extract(&self, content: &[u8], filename: Option<&str>) -> Result<ExtractionResult> {
        let (decoded, encoding) = decode_text(content);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let mut lines = Vec::new();
        let mut truncated = false;
        for (i, record) in reader.records().enumerate() {
            // Line 0 is the header; cap applies to data rows.
            if i > self.max_rows {
                truncated = true;
                break;
            }
            match record {
                Ok(record) => {
                    lines.push(
                        record
                            .iter()
                            .map(str::trim)
                            .collect::<Vec<_>>()
                            .join(" | "),
                    );
                }
                Err(e) => {
                    warn!(filename, row = i, error = %e, "skipping unparseable CSV row");
                }
            }
        }

        let mut result = ExtractionResult::new(lines.join("\n"), "text/csv");
        result.encoding = encoding.to_string();
        if truncated {
            result = result
                .partial()
                .with_warning(format!("truncated after {} rows", self.max_rows));
        }

        debug!(filename, rows = lines.len(), truncated, "extracted CSV");
        Ok(result)
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["text/csv", "application/csv"]
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// JSON extractor, pipeline-aware: documents shaped like a pipeline
/// definition (a top-level `properties` object) are wrapped in the
/// sentinel markers so analysis parses them structurally. Anything
/// else passes through as text.
pub struct JsonExtractor;

impl JsonExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for JsonExtractor {
    async fn extract(&self, content: &[u8], filename: Option<&str>) -> Result<ExtractionResult> {
        let text = std::str::from_utf8(content)
            .map_err(|e| IngestionError::EncodingError(format!("invalid UTF-8 in JSON: {e}")))?;

        let parsed: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| IngestionError::ExtractionFailed(format!("invalid JSON: {e}")))?;

        let is_pipeline = parsed
            .get("properties")
            .is_some_and(serde_json::Value::is_object);

        let output = if is_pipeline {
            let name = filename.unwrap_or("pipeline");
            debug!(filename, "wrapping pipeline definition for structural analysis");
            format!(
                "Pipeline definition: {name}\n{PIPELINE_JSON_START}\n{text}\n{PIPELINE_JSON_END}"
            )
        } else {
            text.to_string()
        };

        Ok(ExtractionResult::new(output, "application/json"))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["application/json", "text/json"]
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// PDF extractor (requires the `pdf` feature).
#[cfg(feature = "pdf")]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, content: &[u8], filename: Option<&str>) -> Result<ExtractionResult> {
        let text = pdf_extract::extract_text_from_mem(content)
            .map_err(|e| IngestionError::ExtractionFailed(format!("PDF extraction: {e}")))?;
        debug!(filename, chars = text.len(), "extracted PDF text");
        Ok(ExtractionResult::new(text, "application/pdf"))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["application/pdf"]
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

/// Word document extractor (requires the `docx` feature).
#[cfg(feature = "docx")]
pub struct DocxExtractor;

#[cfg(feature = "docx")]
#[async_trait]
impl TextExtractor for DocxExtractor {
    async fn extract(&self, content: &[u8], filename: Option<&str>) -> Result<ExtractionResult> {
        use docx_rs::{DocumentChild, ParagraphChild, RunChild};

        let docx = docx_rs::read_docx(content)
            .map_err(|e| IngestionError::ExtractionFailed(format!("DOCX parsing: {e}")))?;

        let mut paragraphs = Vec::new();
        for child in docx.document.children.iter() {
            if let DocumentChild::Paragraph(para) = child {
                let text: String = para
                    .children
                    .iter()
                    .filter_map(|pc| {
                        if let ParagraphChild::Run(run) = pc {
                            Some(
                                run.children
                                    .iter()
                                    .filter_map(|rc| {
                                        if let RunChild::Text(t) = rc {
                                            Some(t.text.clone())
                                        } else {
                                            None
                                        }
                                    })
                                    .collect::<Vec<_>>()
                                    .join(""),
                            )
                        } else {
                            None
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("");
                if !text.is_empty() {
                    paragraphs.push(text);
                }
            }
        }

        debug!(filename, paragraphs = paragraphs.len(), "extracted DOCX text");
        Ok(ExtractionResult::new(
            paragraphs.join("\n"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["wordprocessingml", "msword"]
    }

    fn name(&self) -> &'static str {
        "docx"
    }
}

/// Spreadsheet extractor (requires the `xlsx` feature).
#[cfg(feature = "xlsx")]
pub struct XlsxExtractor {
    max_rows_per_sheet: usize,
}

#[cfg(feature = "xlsx")]
impl XlsxExtractor {
    pub fn new() -> Self {
        Self {
            max_rows_per_sheet: 100,
        }
    }
}

#[cfg(feature = "xlsx")]
impl Default for XlsxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "xlsx")]
#[async_trait]
impl TextExtractor for XlsxExtractor {
    async fn extract(&self, content: &[u8], filename: Option<&str>) -> Result<ExtractionResult> {
        use calamine::Reader;

        let cursor = std::io::Cursor::new(content.to_vec());
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| IngestionError::ExtractionFailed(format!("workbook open: {e}")))?;

        let mut lines = Vec::new();
        for sheet in workbook.sheet_names().to_owned() {
            let range = workbook
                .worksheet_range(&sheet)
                .map_err(|e| IngestionError::ExtractionFailed(format!("sheet {sheet}: {e}")))?;
            lines.push(format!("Sheet: {sheet}"));
            for row in range.rows().take(self.max_rows_per_sheet) {
                lines.push(
                    row.iter()
                        .map(|cell| cell.to_string())
                        .collect::<Vec<_>>()
                        .join(" | "),
                );
            }
        }

        debug!(filename, lines = lines.len(), "extracted spreadsheet text");
        Ok(ExtractionResult::new(
            lines.join("\n"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ))
    }

    fn supported_types(&self) -> Vec<&'static str> {
        vec!["spreadsheetml", "ms-excel"]
    }

    fn name(&self) -> &'static str {
        "xlsx"
    }
}

/// Stand-in registered when a binary format's feature is compiled out.
struct DisabledExtractor {
    format: &'static str,
    feature: &'static str,
    types: &'static [&'static str],
}

#[async_trait]
impl TextExtractor for DisabledExtractor {
    async fn extract(&self, _content: &[u8], _filename: Option<&str>) -> Result<ExtractionResult> {
        Err(IngestionError::FeatureDisabled {
            format: self.format,
            feature: self.feature,
        })
    }

    fn supported_types(&self) -> Vec<&'static str> {
        self.types.to_vec()
    }

    fn name(&self) -> &'static str {
        self.format
    }
}

/// Registry dispatching extraction by content type.
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn TextExtractor>>,
    default_extractor: Arc<dyn TextExtractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
            default_extractor: Arc::new(PlainTextExtractor::new()),
        }
    }

    /// Create with all shipped extractors registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(JsonExtractor::new()));
        registry.register(Arc::new(CsvExtractor::new()));

        #[cfg(feature = "pdf")]
        registry.register(Arc::new(PdfExtractor));
        #[cfg(not(feature = "pdf"))]
        registry.register(Arc::new(DisabledExtractor {
            format: "pdf",
            feature: "pdf",
            types: &["application/pdf"],
        }));

        #[cfg(feature = "docx")]
        registry.register(Arc::new(DocxExtractor));
        #[cfg(not(feature = "docx"))]
        registry.register(Arc::new(DisabledExtractor {
            format: "docx",
            feature: "docx",
            types: &["wordprocessingml", "msword"],
        }));

        #[cfg(feature = "xlsx")]
        registry.register(Arc::new(XlsxExtractor::new()));
        #[cfg(not(feature = "xlsx"))]
        registry.register(Arc::new(DisabledExtractor {
            format: "xlsx",
            feature: "xlsx",
            types: &["spreadsheetml", "ms-excel"],
        }));

        registry.register(Arc::new(PlainTextExtractor::new()));
        registry
    }

    /// Register an extractor
    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.push(extractor);
    }

    /// Get extractor for content type
    pub fn get_extractor(&self, content_type: &str) -> Arc<dyn TextExtractor> {
        for extractor in &self.extractors {
            if extractor.can_handle(content_type) {
                return extractor.clone();
            }
        }
        self.default_extractor.clone()
    }

    /// Get extractor by filename
    pub fn get_by_filename(&self, filename: &str) -> Arc<dyn TextExtractor> {
        let content_type = mime_guess::from_path(filename)
            .first_or_text_plain()
            .to_string();
        self.get_extractor(&content_type)
    }

    /// List all registered extractors
    pub fn list(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_plain_text_utf8() {
        let result = PlainTextExtractor::new()
            .extract(b"Nightly load notes", None)
            .await
            .unwrap();
        assert_eq!(result.text, "Nightly load notes");
        assert_eq!(result.encoding, "utf-8");
    }

    #[tokio::test]
    async fn test_plain_text_windows_1252_fallback() {
        // 0xE9 is e-acute in Windows-1252 and invalid standalone UTF-8.
        let result = PlainTextExtractor::new()
            .extract(b"caf\xe9 records", None)
            .await
            .unwrap();
        assert_eq!(result.text, "caf\u{e9} records");
        assert!(result.encoding.starts_with("windows-1252"));
    }

    #[tokio::test]
    async fn test_plain_text_size_limit() {
        let extractor = PlainTextExtractor::new().with_max_size(4);
        let err = extractor.extract(b"too long", None).await.unwrap_err();
        assert!(matches!(err, IngestionError::ExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_csv_row_formatting() {
        let content = b"name,type\nAGLPRD,Oracle\nDataprd,SQL Server\n";
        let result = CsvExtractor::new().extract(content, None).await.unwrap();
        assert_eq!(
            result.text,
            "name | type\nAGLPRD | Oracle\nDataprd | SQL Server"
        );
        assert!(result.complete);
    }

    #[tokio::test]
    async fn test_csv_row_cap() {
        let mut content = String::from("id\n");
        for i in 0..200 {
            content.push_str(&format!("{i}\n"));
        }
        let result = CsvExtractor::new()
            .with_max_rows(10)
            .extract(content.as_bytes(), None)
            .await
            .unwrap();
        // Header plus ten data rows.
        assert_eq!(result.text.lines().count(), 11);
        assert!(!result.complete);
    }

    #[tokio::test]
    async fn test_json_pipeline_wrapping() {
        let content = br#"{"name": "pl1", "properties": {"activities": []}}"#;
        let result = JsonExtractor::new()
            .extract(content, Some("pl1.json"))
            .await
            .unwrap();
        assert!(result.text.contains(PIPELINE_JSON_START));
        assert!(result.text.contains(PIPELINE_JSON_END));
        assert!(result.text.contains("pl1.json"));
    }

    #[tokio::test]
    async fn test_json_non_pipeline_passthrough() {
        let content = br#"{"notes": "monthly refresh"}"#;
        let result = JsonExtractor::new().extract(content, None).await.unwrap();
        assert!(!result.text.contains(PIPELINE_JSON_START));
        assert!(result.text.contains("monthly refresh"));
    }

    #[tokio::test]
    async fn test_json_rejects_invalid() {
        let err = JsonExtractor::new()
            .extract(b"{broken", None)
            .await
            .unwrap_err();
        assert!(matches!(err, IngestionError::ExtractionFailed(_)));
    }

    #[test]
    fn test_registry_dispatch_by_filename() {
        let registry = ExtractorRegistry::with_defaults();
        assert_eq!(registry.get_by_filename("rows.csv").name(), "csv");
        assert_eq!(registry.get_by_filename("pipeline.json").name(), "json");
        assert_eq!(registry.get_by_filename("notes.txt").name(), "plain_text");
        // Unknown types fall back to plain text.
        assert_eq!(registry.get_by_filename("blob.unknown").name(), "plain_text");
    }

    #[cfg(not(feature = "pdf"))]
    #[tokio::test]
    async fn test_pdf_disabled_without_feature() {
        let registry = ExtractorRegistry::with_defaults();
        let extractor = registry.get_by_filename("report.pdf");
        let err = extractor.extract(b"%PDF-1.4", None).await.unwrap_err();
        assert!(matches!(
            err,
            IngestionError::FeatureDisabled { format: "pdf", .. }
        ));
    }
}

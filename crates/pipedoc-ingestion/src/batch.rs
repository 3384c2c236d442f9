//! Batch reading of input files.
//!
//! One pass over the inputs: archives are expanded, extensions are
//! checked against the configured allow-list, each surviving file goes
//! through the extractor registry, and duplicate content is dropped by
//! fingerprint. Individual failures are logged and skipped; only a
//! batch where nothing survives is an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use pipedoc_core::IngestionConfig;

use crate::archive::expand_archive;
use crate::extractors::ExtractorRegistry;
use crate::{IngestionError, Result};

/// One successfully extracted input document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub filename: String,
    /// Set when the file was unpacked from an archive.
    pub source_archive: Option<String>,
    pub text: String,
}

/// Read a batch of input paths into extracted documents.
///
/// Returns `IngestionError::NoContent` only when no input produced
/// any text at all.
pub async fn read_batch(
    paths: &[PathBuf],
    config: &IngestionConfig,
    registry: &ExtractorRegistry,
) -> Result<Vec<ExtractedDocument>> {
    let mut documents = Vec::new();
    let mut fingerprints = HashSet::new();

    for path in paths {
        if extension(path).as_deref() == Some("zip") {
            read_archive(path, config, registry, &mut documents, &mut fingerprints).await;
        } else {
            read_file(path, None, config, registry, &mut documents, &mut fingerprints).await;
        }
    }

    if documents.is_empty() {
        return Err(IngestionError::NoContent);
    }

    info!(
        inputs = paths.len(),
        documents = documents.len(),
        "batch extraction complete"
    );
    Ok(documents)
}

async fn read_archive(
    path: &Path,
    config: &IngestionConfig,
    registry: &ExtractorRegistry,
    documents: &mut Vec<ExtractedDocument>,
    fingerprints: &mut HashSet<String>,
) {
    let archive_name = display_name(path);
    // Expansion is synchronous; archives are small enough that
    // blocking here is acceptable for a CLI workload.
    let expanded = match expand_archive(path, config.max_archive_entry_bytes()) {
        Ok(expanded) => expanded,
        Err(e) => {
            warn!(archive = %archive_name, error = %e, "skipping unreadable archive");
            return;
        }
    };

    for file in expanded.files() {
        read_file(
            file,
            Some(&archive_name),
            config,
            registry,
            documents,
            fingerprints,
        )
        .await;
    }
}

async fn read_file(
    path: &Path,
    source_archive: Option<&str>,
    config: &IngestionConfig,
    registry: &ExtractorRegistry,
    documents: &mut Vec<ExtractedDocument>,
    fingerprints: &mut HashSet<String>,
) {
    let filename = display_name(path);

    let Some(ext) = extension(path) else {
        warn!(file = %filename, "skipping file without extension");
        return;
    };
    if !config.is_allowed_extension(&ext) {
        warn!(file = %filename, extension = %ext, "skipping unsupported file type");
        return;
    }

    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(file = %filename, error = %e, "skipping unreadable file");
            return;
        }
    };
    if content.len() as u64 > config.max_file_size_bytes() {
        warn!(
            file = %filename,
            size = content.len(),
            "skipping file over the size limit"
        );
        return;
    }

    let extractor = registry.get_by_filename(&filename);
    let result = match extractor.extract(&content, Some(&filename)).await {
        Ok(result) => result,
        Err(e) => {
            warn!(file = %filename, extractor = extractor.name(), error = %e, "extraction failed");
            return;
        }
    };
    if result.text.trim().is_empty() {
        debug!(file = %filename, "extraction produced no text");
        return;
    }

    let fingerprint = hex::encode(Sha256::digest(result.text.as_bytes()));
    if !fingerprints.insert(fingerprint) {
        debug!(file = %filename, "skipping duplicate content");
        return;
    }

    documents.push(ExtractedDocument {
        filename,
        source_archive: source_archive.map(str::to_string),
        text: result.text,
    });
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use pretty_assertions::assert_eq;

    fn config() -> IngestionConfig {
        IngestionConfig {
            allowed_extensions: ["zip", "json", "txt", "csv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size_mb: 50,
            max_archive_entry_mb: 100,
        }
    }

    #[tokio::test]
    async fn test_reads_supported_files() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        let csv = dir.path().join("rows.csv");
        std::fs::write(&txt, "pipeline notes").unwrap();
        std::fs::write(&csv, "a,b\n1,2\n").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let docs = read_batch(&[txt, csv], &config(), &registry).await.unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].filename, "notes.txt");
        assert!(docs[0].source_archive.is_none());
        assert_eq!(docs[1].text, "a | b\n1 | 2");
    }

    #[tokio::test]
    async fn test_unsupported_extension_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("tool.exe");
        let txt = dir.path().join("notes.txt");
        std::fs::write(&exe, "binary").unwrap();
        std::fs::write(&txt, "real notes").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let docs = read_batch(&[exe, txt], &config(), &registry).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "notes.txt");
    }

    #[tokio::test]
    async fn test_duplicate_content_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "same content").unwrap();
        std::fs::write(&b, "same content").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let docs = read_batch(&[a, b], &config(), &registry).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "a.txt");
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("tool.exe");
        std::fs::write(&exe, "binary").unwrap();

        let registry = ExtractorRegistry::with_defaults();
        let err = read_batch(&[exe], &config(), &registry).await.unwrap_err();
        assert!(matches!(err, IngestionError::NoContent));
    }

    #[tokio::test]
    async fn test_archive_expansion() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("bundle.zip");
        {
            let file = std::fs::File::create(&zip_path).unwrap();
            let mut writer = zip::ZipWriter::new(file);
            let options = zip::write::FileOptions::default();
            writer.start_file("inner.txt", options).unwrap();
            writer.write_all(b"from the archive").unwrap();
            writer.finish().unwrap();
        }

        let registry = ExtractorRegistry::with_defaults();
        let docs = read_batch(&[zip_path], &config(), &registry)
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "inner.txt");
        assert_eq!(docs[0].source_archive.as_deref(), Some("bundle.zip"));
        assert_eq!(docs[0].text, "from the archive");
    }
}

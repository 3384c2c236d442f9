//! `pipedoc inspect` - analyze one file and show what would be used.

use std::path::Path;

use anyhow::{Context, Result};

use pipedoc_analysis::Analyzer;
use pipedoc_core::AppConfig;
use pipedoc_ingestion::{read_batch, ExtractorRegistry};

use crate::output;

pub async fn run(file: &Path, catalog_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let catalog = super::load_catalog(catalog_path, config.catalog_path.as_deref())?;

    let registry = ExtractorRegistry::with_defaults();
    let documents = read_batch(&[file.to_path_buf()], &config.ingestion, &registry)
        .await
        .map_err(|e| anyhow::Error::new(e.into_core(&file.display().to_string())))?;

    let analyzer = Analyzer::new(catalog);
    for doc in &documents {
        // Archives expand to several documents; label each one.
        output::key_value("Document", &doc.filename);
        let record = analyzer.analyze(&doc.text, &doc.filename);
        println!("{}", serde_json::to_string_pretty(&record)?);
    }
    Ok(())
}

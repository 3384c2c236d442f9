//! `pipedoc generate` - the end-to-end documentation run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use pipedoc_analysis::{synthesize, Analyzer, SynthesisCaps};
use pipedoc_core::AppConfig;
use pipedoc_ingestion::{read_batch, ExtractorRegistry};
use pipedoc_render::{DocumentRenderer, MarkdownRenderer, RenderOptions};

use crate::output;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    inputs: &[PathBuf],
    output: &Path,
    catalog_path: Option<&Path>,
    title: Option<String>,
    author: String,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let catalog = super::load_catalog(catalog_path, config.catalog_path.as_deref())?;

    let registry = ExtractorRegistry::with_defaults();
    let documents = read_batch(inputs, &config.ingestion, &registry)
        .await
        .map_err(|e| anyhow::Error::new(e.into_core("input batch")))?;
    output::info(&format!("Extracted {} document(s)", documents.len()));

    let timeout = Duration::from_secs(
        timeout_secs.unwrap_or(config.limits.analysis_timeout_secs),
    );
    let analyzer = Arc::new(Analyzer::new(catalog.clone()));

    let progress = ProgressBar::new(documents.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );

    let mut records = Vec::with_capacity(documents.len());
    for doc in documents {
        progress.set_message(doc.filename.clone());
        let filename = doc.filename.clone();

        // The analysis itself is CPU-bound; run it off the reactor so
        // the timeout can actually fire.
        let analyzer = Arc::clone(&analyzer);
        let task = tokio::task::spawn_blocking(move || {
            let mut record = analyzer.analyze(&doc.text, &doc.filename);
            record.source_archive = doc.source_archive;
            record
        });

        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(record)) => records.push(record),
            Ok(Err(e)) => {
                warn!(file = %filename, error = %e, "analysis task failed, document excluded");
            }
            Err(_) => {
                warn!(
                    file = %filename,
                    timeout_secs = timeout.as_secs(),
                    "analysis timed out, document excluded"
                );
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let metadata = synthesize(&records, &SynthesisCaps::from(&config.limits));

    let renderer = MarkdownRenderer::new(catalog);
    let options = RenderOptions {
        title,
        author,
        generated_on: None,
    };
    let document = renderer
        .render(&metadata, &options)
        .context("rendering document")?;

    tokio::fs::write(output, &document)
        .await
        .with_context(|| format!("writing {}", output.display()))?;

    output::success(&format!("Documentation written to {}", output.display()));
    if metadata.is_empty() {
        output::warning("No pipeline metadata identified; the document contains placeholders");
    } else {
        if !metadata.pipeline_names.is_empty() {
            output::key_value("Data flow", &metadata.pipeline_names.join(", "));
        }
        if !metadata.sources.is_empty() {
            output::key_value("Sources", &metadata.sources.join(", "));
        }
        if !metadata.sinks.is_empty() {
            output::key_value("Sinks", &metadata.sinks.join(", "));
        }
    }
    Ok(())
}

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub ingestion: IngestionConfig,
    pub limits: LimitsConfig,
    /// Optional path to a catalog JSON file; the builtin catalog is
    /// used when absent.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_env("PIPEDOC")
    }

    /// Load configuration from environment with a custom prefix.
    pub fn load_from_env(prefix: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default(
                "ingestion.allowed_extensions",
                vec![
                    "zip", "json", "docx", "doc", "txt", "pdf", "xlsx", "xls", "csv",
                ],
            )?
            .set_default("ingestion.max_file_size_mb", 50)?
            .set_default("ingestion.max_archive_entry_mb", 100)?
            .set_default("limits.analysis_timeout_secs", 30)?
            .set_default("limits.max_sources", 5)?
            .set_default("limits.max_sinks", 5)?
            .set_default("limits.max_pipeline_names", 5)?
            .set_default("limits.max_transformations", 5)?
            .set_default("limits.max_business_rules", 3)?
            .set_default("limits.max_dependencies", 5)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::load_from_env("PIPEDOC_DEFAULT_UNSET")
            .expect("default configuration must deserialize")
    }
}

/// File-intake configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Lowercase extensions (without dot) accepted for processing.
    pub allowed_extensions: Vec<String>,
    /// Files larger than this are rejected before extraction.
    pub max_file_size_mb: u64,
    /// Zip entries larger than this are skipped during expansion.
    pub max_archive_entry_mb: u64,
}

impl IngestionConfig {
    pub fn is_allowed_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.allowed_extensions.iter().any(|e| e == &ext)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    pub fn max_archive_entry_bytes(&self) -> u64 {
        self.max_archive_entry_mb * 1024 * 1024
    }
}

/// Presentation caps and per-document limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Upper bound on per-document analysis time.
    pub analysis_timeout_secs: u64,
    pub max_sources: usize,
    pub max_sinks: usize,
    pub max_pipeline_names: usize,
    pub max_transformations: usize,
    pub max_business_rules: usize,
    pub max_dependencies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert!(config.ingestion.is_allowed_extension("json"));
        assert!(config.ingestion.is_allowed_extension(".CSV"));
        assert!(!config.ingestion.is_allowed_extension("exe"));
        assert_eq!(config.ingestion.max_file_size_mb, 50);
        assert_eq!(config.limits.max_business_rules, 3);
        assert!(config.catalog_path.is_none());
    }

    #[test]
    fn test_size_conversion() {
        let config = AppConfig::default();
        assert_eq!(
            config.ingestion.max_file_size_bytes(),
            50 * 1024 * 1024
        );
    }
}

//! The curated catalog of known data-source and sink names.
//!
//! The catalog is read-only configuration for a processing run. It is
//! injected into the reconciler and analyzer as a constructor argument
//! rather than held in module-level state, so tests and alternate
//! deployments can substitute their own catalogs.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Whether a catalog entry represents a place data is read from or
/// written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Source,
    Sink,
    /// No catalog match; carried on reconciliation results, never
    /// stored in a catalog file.
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Source => write!(f, "source"),
            Category::Sink => write!(f, "sink"),
            Category::Unknown => write!(f, "unknown"),
        }
    }
}

/// A known data source or sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical name, used verbatim in rendered output.
    pub name: String,
    /// Human-readable system type, e.g. "Oracle" or "SQL Server".
    pub system_type: String,
    pub category: Category,
}

impl CatalogEntry {
    pub fn new(
        name: impl Into<String>,
        system_type: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            name: name.into(),
            system_type: system_type.into(),
            category,
        }
    }
}

/// An ordered collection of catalog entries.
///
/// Declaration order is significant: the reconciler breaks similarity
/// ties in favor of the earliest entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The default catalog shipped with pipedoc.
    pub fn builtin() -> Self {
        let oracle = |name: &str| CatalogEntry::new(name, "Oracle", Category::Source);
        let sql_server = |name: &str| CatalogEntry::new(name, "SQL Server", Category::Source);

        Self::new(vec![
            oracle("agilist_datalab_test"),
            oracle("AGILIST"),
            oracle("AGILIST_DATALAB"),
            oracle("AGILIST_DELV"),
            oracle("AGLPRD"),
            oracle("AGLPRD_IM_ATM"),
            oracle("AGLPRDDLV"),
            oracle("AGLPRDIMSTAGE"),
            oracle("BOXI"),
            oracle("prdpi"),
            sql_server("Dataprd"),
            sql_server("ResusApp"),
            sql_server("SPHDSQLPRD11"),
            CatalogEntry::new(
                "AzureDataLakeStorage1",
                "Azure Data Lake Storage Gen2",
                Category::Sink,
            ),
        ])
    }

    /// Load a catalog from a JSON file of the form
    /// `{"entries": [{"name": ..., "system_type": ..., "category": ...}]}`.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&data).map_err(|e| {
            crate::PipedocError::Config(config::ConfigError::Message(format!(
                "invalid catalog file {}: {}",
                path.as_ref().display(),
                e
            )))
        })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Case-insensitive lookup; first declaration wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = Catalog::builtin();

        let entry = catalog.get("AGLPRD").unwrap();
        assert_eq!(entry.system_type, "Oracle");
        assert_eq!(entry.category, Category::Source);

        let entry = catalog.get("AzureDataLakeStorage1").unwrap();
        assert_eq!(entry.category, Category::Sink);

        assert!(catalog.get("aglprd").is_none());
        assert!(catalog.get_ignore_case("aglprd").is_some());
    }

    #[test]
    fn test_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"entries": [{{"name": "WH1", "system_type": "SQL Server", "category": "sink"}}]}}"#
        )
        .unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("WH1").unwrap().category, Category::Sink);
    }

    #[test]
    fn test_catalog_from_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(Catalog::from_file(file.path()).is_err());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Source.to_string(), "source");
        assert_eq!(Category::Sink.to_string(), "sink");
        assert_eq!(Category::Unknown.to_string(), "unknown");
    }
}

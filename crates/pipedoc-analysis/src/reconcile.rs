//! Name reconciliation against the curated catalog.
//!
//! Maps an arbitrary reference-name string to a canonical catalog
//! entry via exact matching, then approximate matching, then keyword
//! fallback. Deterministic for a fixed catalog and cutoff: the
//! similarity metric is a pure function and ties are broken in favor
//! of the entry declared earliest in the catalog.

use pipedoc_core::{Catalog, CatalogEntry, Category};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Similarity cutoff used when mapping a reference name to a database
/// type while parsing pipeline JSON.
pub const DB_TYPE_CUTOFF: f64 = 0.6;

/// Similarity cutoff used when categorizing a reference name as a
/// source or sink during free-text analysis.
///
/// Deliberately looser than [`DB_TYPE_CUTOFF`]: mislabeling a database
/// type is worse than listing one extra candidate source. The two
/// cutoffs must not be unified; borderline names match under one and
/// not the other.
pub const CATEGORY_CUTOFF: f64 = 0.5;

/// Result of reconciling a reference name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Either a verbatim catalog name or the original, unmodified
    /// input. Reconciliation never invents a name.
    pub canonical_name: String,
    /// Resolved system type, or `"Unknown"`.
    pub system_type: String,
    pub category: Category,
}

impl Reconciliation {
    fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            canonical_name: entry.name.clone(),
            system_type: entry.system_type.clone(),
            category: entry.category,
        }
    }

    fn unknown(name: &str, system_type: impl Into<String>) -> Self {
        Self {
            canonical_name: name.to_string(),
            system_type: system_type.into(),
            category: Category::Unknown,
        }
    }

    /// Whether the name resolved to a catalog entry.
    pub fn is_cataloged(&self) -> bool {
        self.category != Category::Unknown
    }
}

/// Reconciles reference names against an injected, immutable catalog.
pub struct Reconciler {
    catalog: Catalog,
}

impl Reconciler {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Resolve `reference_name` to a canonical catalog entry.
    ///
    /// A similarity score must strictly exceed `cutoff` to be
    /// accepted; a score exactly at the cutoff resolves `"Unknown"`.
    pub fn reconcile(&self, reference_name: &str, cutoff: f64) -> Reconciliation {
        if reference_name.is_empty() {
            return Reconciliation::unknown("", "Unknown");
        }

        if let Some(entry) = self.catalog.get(reference_name) {
            return Reconciliation::from_entry(entry);
        }

        if let Some(entry) = self.catalog.get_ignore_case(reference_name) {
            return Reconciliation::from_entry(entry);
        }

        let needle = reference_name.to_lowercase();
        let mut best: Option<(&CatalogEntry, f64)> = None;
        for entry in self.catalog.entries() {
            let score = similarity(&needle, &entry.name.to_lowercase());
            // Strict comparison keeps the earliest catalog entry on ties.
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        if let Some((entry, score)) = best {
            trace!(
                reference = reference_name,
                candidate = %entry.name,
                score,
                cutoff,
                "best approximate catalog match"
            );
            if score > cutoff {
                return Reconciliation::from_entry(entry);
            }
        }

        if let Some(system_type) = keyword_type(reference_name) {
            return Reconciliation::unknown(reference_name, system_type);
        }

        Reconciliation::unknown(reference_name, "Unknown")
    }
}

/// Similarity ratio between two strings: `2 * lcs(a, b) / (|a| + |b|)`,
/// computed over characters. 1.0 for identical strings, 0.0 for
/// disjoint ones.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    // Longest common subsequence, two-row DP.
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let lcs = prev[b.len()];
    2.0 * lcs as f64 / (a.len() + b.len()) as f64
}

/// Best-guess system type from substring fragments, used when no
/// catalog entry clears the cutoff. Assigns a type but no category.
fn keyword_type(name: &str) -> Option<&'static str> {
    let upper = name.to_uppercase();
    if upper.contains("ORACLE") {
        Some("Oracle")
    } else if upper.contains("SYNAPSE") {
        Some("Azure Synapse Analytics")
    } else if upper.contains("AZURE") || upper.contains("DATALAKE") || upper.contains("ADLS") {
        Some("Azure Data Lake Storage Gen2")
    } else if upper.contains("SQL") {
        Some("SQL Server")
    } else if upper.contains("PARQUET") {
        Some("Parquet File")
    } else {
        None
    }
}

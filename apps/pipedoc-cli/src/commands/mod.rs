//! Command implementations

pub mod catalog;
pub mod generate;
pub mod inspect;

use std::path::Path;

use anyhow::{Context, Result};
use pipedoc_core::Catalog;

/// Resolve the catalog: CLI flag, then configured path, then built-in.
pub(crate) fn load_catalog(
    cli_path: Option<&Path>,
    config_path: Option<&str>,
) -> Result<Catalog> {
    match cli_path.map(Path::to_path_buf).or_else(|| config_path.map(Into::into)) {
        Some(path) => Catalog::from_file(&path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => Ok(Catalog::builtin()),
    }
}

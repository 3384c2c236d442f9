//! `pipedoc catalog` subcommands.

use std::path::Path;

use anyhow::Result;

use crate::output;

pub fn list(catalog_path: Option<&Path>) -> Result<()> {
    let catalog = super::load_catalog(catalog_path, None)?;

    output::info(&format!("{} catalog entries", catalog.len()));
    println!("{:<24} {:<32} {}", "NAME", "TYPE", "CATEGORY");
    for entry in catalog.entries() {
        println!(
            "{:<24} {:<32} {}",
            entry.name, entry.system_type, entry.category
        );
    }
    Ok(())
}

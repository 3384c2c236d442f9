//! Zip archive expansion.
//!
//! Archives are expanded into a temporary directory that lives as long
//! as the returned [`ExpandedArchive`]; dropping it removes every
//! extracted file, on success and failure alike. Directory entries,
//! entries whose names escape the extraction root, and oversized
//! entries are skipped, not fatal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::{IngestionError, Result};

/// An expanded archive and the files recovered from it.
#[derive(Debug)]
pub struct ExpandedArchive {
    dir: TempDir,
    files: Vec<PathBuf>,
    skipped: Vec<String>,
}

impl ExpandedArchive {
    /// Paths of the extracted files, inside the temporary directory.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Entry names that were skipped and why.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Expand a zip archive, skipping unsafe or oversized entries.
pub fn expand_archive(path: &Path, max_entry_bytes: u64) -> Result<ExpandedArchive> {
    let file = fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| IngestionError::ArchiveError(format!("{}: {e}", path.display())))?;

    let dir = TempDir::new()?;
    let mut files = Vec::new();
    let mut skipped = Vec::new();
    let mut used_names = std::collections::HashSet::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| IngestionError::ArchiveError(format!("entry {i}: {e}")))?;

        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            warn!(entry = %name, "skipping archive entry with unsafe path");
            skipped.push(format!("{name}: unsafe path"));
            continue;
        };

        if entry.size() > max_entry_bytes {
            warn!(entry = %name, size = entry.size(), "skipping oversized archive entry");
            skipped.push(format!("{name}: exceeds {max_entry_bytes} bytes"));
            continue;
        }

        // Flatten nested directories; only the filename matters for
        // extractor dispatch downstream. Entries from different
        // directories can share a basename, so colliding names get an
        // index prefix instead of overwriting each other.
        let mut filename = relative
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(format!("entry-{i}")));
        if !used_names.insert(filename.clone()) {
            filename = PathBuf::from(format!("{i}-{}", filename.display()));
            used_names.insert(filename.clone());
        }
        let target = dir.path().join(&filename);

        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        files.push(target);
    }

    debug!(
        archive = %path.display(),
        extracted = files.len(),
        skipped = skipped.len(),
        "expanded archive"
    );

    Ok(ExpandedArchive { dir, files, skipped })
}

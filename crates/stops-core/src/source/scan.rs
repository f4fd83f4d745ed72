//! Directory discovery and parallel loading of agency documents.

use super::record::{parse_document, EntityRecord};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use stops_common::{Error, Result};
use stops_report::ScanSummary;
use tracing::{debug, info, warn};

const SOURCE_EXTENSION: &str = "json";

/// A file that could not be turned into an entity record.
#[derive(Debug)]
pub struct SourceFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Every entity record loaded from a data directory, in path order.
#[derive(Debug, Default)]
pub struct SourceSet {
    pub records: Vec<EntityRecord>,
    pub failures: Vec<SourceFailure>,
}

impl SourceSet {
    /// Wrap already-built records, e.g. from tests or another loader.
    pub fn from_records(records: Vec<EntityRecord>) -> Self {
        Self {
            records,
            failures: Vec::new(),
        }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            files_found: self.records.len() + self.failures.len(),
            files_loaded: self.records.len(),
            files_skipped: self.failures.len(),
        }
    }
}

/// List `.json` files directly inside `dir`, sorted by path.
///
/// An unreadable directory yields an empty list.
pub fn discover_files(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "data directory unreadable; no records loaded");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(SOURCE_EXTENSION))
        })
        .collect();
    files.sort();
    files
}

/// Read and parse one agency document.
pub fn load_file(path: &Path) -> Result<EntityRecord> {
    let content = fs::read_to_string(path).map_err(|e| Error::SourceRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_document(path, &content)
}

/// Load every document in `dir`.
///
/// Files are parsed in parallel; records keep path order. Failures are
/// logged and collected, never raised.
pub fn load_directory(dir: &Path) -> SourceSet {
    let files = discover_files(dir);
    debug!(dir = %dir.display(), files = files.len(), "loading agency documents");

    let results: Vec<(PathBuf, Result<EntityRecord>)> = files
        .into_par_iter()
        .map(|path| {
            let result = load_file(&path);
            (path, result)
        })
        .collect();

    let mut set = SourceSet::default();
    for (path, result) in results {
        match result {
            Ok(record) => set.records.push(record),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "skipping source file");
                set.failures.push(SourceFailure { path, error });
            }
        }
    }

    info!(
        dir = %dir.display(),
        loaded = set.records.len(),
        skipped = set.failures.len(),
        "source scan complete"
    );
    set
}

//! Writers for the rollup report and the compact index.
//!
//! Both artifacts are written to a sibling temp file first and renamed into
//! place, so a failed run never leaves a truncated output behind.

use crate::index::CompactIndex;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use stops_common::{Error, Result};
use stops_report::RollupReport;
use tracing::debug;

/// JSON layout of a written artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonLayout {
    /// Two-space indentation.
    Pretty,
    /// No whitespace between tokens.
    Compact,
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::OutputWrite {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Serialize `value` to `path`, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T, layout: JsonLayout) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| write_error(path, e))?;
        }
    }

    let json = match layout {
        JsonLayout::Pretty => serde_json::to_vec_pretty(value)?,
        JsonLayout::Compact => serde_json::to_vec(value)?,
    };

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| write_error(path, e))?;
        file.write_all(&json).map_err(|e| write_error(path, e))?;
        file.flush().map_err(|e| write_error(path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        write_error(path, e)
    })?;

    debug!(path = %path.display(), bytes = json.len(), "output written");
    Ok(())
}

/// Write the rollup report (pretty-printed).
pub fn write_rollup(path: &Path, report: &RollupReport) -> Result<()> {
    write_json(path, report, JsonLayout::Pretty)
}

/// Write the compact index (no whitespace).
pub fn write_index(path: &Path, index: &CompactIndex) -> Result<()> {
    write_json(path, index, JsonLayout::Compact)
}

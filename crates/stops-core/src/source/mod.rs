//! Record source: per-agency documents read from a data directory.

pub mod record;
pub mod scan;

pub use record::{parse_document, CellValue, EntityRecord, Row};
pub use scan::{discover_files, load_directory, load_file, SourceFailure, SourceSet};

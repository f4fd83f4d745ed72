//! Exit codes for the stopstats CLI.
//!
//! Skipped source files never change the exit code; only configuration and
//! output failures do.

use stops_common::Error;

/// Exit codes for stopstats operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Run completed (possibly with skipped files)
    Clean = 0,

    /// Configuration error
    ConfigError = 10,

    /// Output could not be written
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Check if this exit code indicates success.
    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidConfig(_) => ExitCode::ConfigError,
            Error::OutputWrite { .. } | Error::Io(_) => ExitCode::IoError,
            _ => ExitCode::InternalError,
        }
    }
}

//! Error types for microlens-submit
//!
//! Validation shortfalls are reported as message lists, not errors; the
//! variants here cover the genuinely fatal cases (alias conflicts at save
//! time, export preconditions, lookups, I/O).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// microlens-submit error types
#[derive(Error, Debug)]
pub enum Error {
    /// Strict validation failed ahead of an export (export is all-or-nothing)
    #[error("validation failed:\n{0}")]
    ValidationFailed(String),

    /// Duplicate solution aliases within an event (fatal at save time)
    #[error("alias validation failed:\n{0}")]
    AliasConflict(String),

    /// Lookup of an event or solution by identifier failed
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was looked up ("event" or "solution")
        kind: &'static str,
        /// The identifier that missed
        id: String,
    },

    /// A solution references an artifact file that is not on disk
    #[error("file referenced by {attribute} in solution {solution_id} does not exist: {path}")]
    MissingArtifact {
        /// Owning solution identifier
        solution_id: String,
        /// Which artifact attribute pointed at the missing file
        attribute: &'static str,
        /// Resolved path that was checked
        path: PathBuf,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

//! Error types for parsing configuration documents.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading a configuration document.
///
/// Malformed lines are not errors: the parser drops them and logs at debug
/// level. Only failures that make the document unusable are reported here.
#[derive(Debug, Error)]
pub enum Error {
    /// A document or `source`d file could not be read
    #[error("cannot read {path}: {source}")]
    SourceFile {
        /// Path that failed to load
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A `source` chain includes a file that is already being inlined
    #[error("source cycle: {path} includes itself (via {chain})")]
    IncludeCycle {
        /// File that was re-entered
        path: PathBuf,
        /// Include chain leading to the cycle, joined with ` -> `
        chain: String,
    },
}

impl Error {
    /// Path of the file involved in this error.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Error::SourceFile { path, .. } | Error::IncludeCycle { path, .. } => path,
        }
    }
}

/// Result type for configuration parsing.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for reconciliation.

use crate::types::Subsystem;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single semantic problem in a configuration document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Section path of the offending entry, such as `packages/pacman/hook`
    pub path: String,
    pub message: String,
}

impl Issue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors that can occur while reconciling the system.
#[derive(Debug, Error)]
pub enum Error {
    /// The document or snapshot could not be read
    #[error(transparent)]
    Config(#[from] confkit::Error),

    /// The document has semantic errors; nothing was changed
    #[error("configuration has {} error(s)", .0.len())]
    Validation(Vec<Issue>),

    /// A manager call or hook failed
    #[error("applying {subsystem} failed: {source}")]
    Phase {
        subsystem: Subsystem,
        #[source]
        source: pacmankit::Error,
    },

    /// The snapshot of the applied document could not be written
    #[error("cannot write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A package-manager error outside any phase
    #[error(transparent)]
    Manager(#[from] pacmankit::Error),
}

impl Error {
    /// Validation issues, if this is a validation error.
    pub fn issues(&self) -> &[Issue] {
        match self {
            Error::Validation(issues) => issues,
            _ => &[],
        }
    }

    /// The underlying package-manager error, if any.
    pub fn manager_error(&self) -> Option<&pacmankit::Error> {
        match self {
            Error::Phase { source, .. } | Error::Manager(source) => Some(source),
            _ => None,
        }
    }
}

/// Result type for reconciliation.
pub type Result<T> = std::result::Result<T, Error>;

/// Attach the phase to a package-manager result.
pub(crate) trait PhaseContext<T> {
    fn phase(self, subsystem: Subsystem) -> Result<T>;
}

impl<T> PhaseContext<T> for pacmankit::Result<T> {
    fn phase(self, subsystem: Subsystem) -> Result<T> {
        self.map_err(|source| Error::Phase { subsystem, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_context() {
        let result: pacmankit::Result<()> = Err(pacmankit::Error::UnknownUser {
            name: "bob".to_string(),
        });
        let err = result.phase(Subsystem::Aur).unwrap_err();
        assert_eq!(err.to_string(), "applying AUR packages failed: unknown user: bob");
        assert!(err.manager_error().is_some());
    }

    #[test]
    fn test_validation_message() {
        let err = Error::Validation(vec![
            Issue::new("essentials", "bad"),
            Issue::new("packages/pacman", "worse"),
        ]);
        assert_eq!(err.to_string(), "configuration has 2 error(s)");
        assert_eq!(err.issues()[1].to_string(), "packages/pacman: worse");
    }
}

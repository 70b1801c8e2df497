//! Error types for package-manager operations.
//!
//! Subprocesses inherit the terminal, so their output has already been
//! shown to the user by the time an error is raised. Errors therefore carry
//! the command line and exit status, and a category with advice for the
//! final report.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Categories of failures, used to pick user-facing advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The program could not be found or started
    NotFound,
    /// The program ran and reported failure
    Failed,
    /// The program was killed by a signal (interrupted)
    Interrupted,
    /// A user identity could not be resolved
    Identity,
    /// Permission denied
    Permission,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Command not found",
            Self::Failed => "Command failed",
            Self::Interrupted => "Command interrupted",
            Self::Identity => "Unknown user",
            Self::Permission => "Permission denied",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::NotFound => "Install the missing program or fix the helper name in the config",
            Self::Failed => "Check the command output above, fix the config and re-run apply",
            Self::Interrupted => "Re-run apply; nothing was recorded for the interrupted run",
            Self::Identity => {
                "Declare the user in a users section or set essentials/normal_user"
            }
            Self::Permission => "Run declarch apply as root",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while driving package managers.
#[derive(Debug, Error)]
pub enum Error {
    /// The program could not be started
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        /// Rendered command line
        command: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The program exited unsuccessfully
    #[error("`{command}` failed ({status})")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit status description
        status: String,
        /// Exit code, if the process exited normally
        code: Option<i32>,
    },

    /// A named user does not exist on this system
    #[error("unknown user: {name}")]
    UnknownUser {
        /// Name that failed to resolve
        name: String,
    },

    /// An operation needs an unprivileged identity but none is configured
    #[error("no unprivileged user available for {operation}")]
    NoNormalUser {
        /// What needed the identity (for example `makepkg`)
        operation: String,
    },

    /// Unrecognized privilege escalation command
    #[error("unknown privilege escalation command: {0}")]
    UnknownEscalation(String),

    /// A config file could not be read or written
    #[error("cannot access {path}: {source}")]
    ConfigFile {
        /// File being patched
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get the error category for reporting.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                ErrorCategory::NotFound
            }
            Error::Spawn { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ErrorCategory::Permission
            }
            Error::CommandFailed { code: None, .. } => ErrorCategory::Interrupted,
            Error::CommandFailed {
                code: Some(126), ..
            } => ErrorCategory::Permission,
            Error::CommandFailed {
                code: Some(127), ..
            } => ErrorCategory::NotFound,
            Error::CommandFailed { .. } => ErrorCategory::Failed,
            Error::UnknownUser { .. } | Error::NoNormalUser { .. } => ErrorCategory::Identity,
            Error::ConfigFile { source, .. } | Error::Io(source)
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                ErrorCategory::Permission
            }
            _ => ErrorCategory::Other,
        }
    }

    /// Create an error from a finished process.
    pub fn from_status(command: impl Into<String>, status: ExitStatus) -> Self {
        let code = status.code();
        let status = match code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        Error::CommandFailed {
            command: command.into(),
            status,
            code,
        }
    }
}

/// Result type for package-manager operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[test]
    fn test_from_status_exit_code() {
        let err = Error::from_status("pacman -S git", ExitStatus::from_raw(1 << 8));
        assert_eq!(err.category(), ErrorCategory::Failed);
        assert!(err.to_string().contains("exit code 1"));
        assert!(err.to_string().contains("pacman -S git"));
    }

    #[test]
    fn test_from_status_signal() {
        let err = Error::from_status("makepkg -si", ExitStatus::from_raw(9));
        assert_eq!(err.category(), ErrorCategory::Interrupted);
    }

    #[test]
    fn test_shell_exit_codes() {
        let not_found = Error::from_status("sh -c foo", ExitStatus::from_raw(127 << 8));
        assert_eq!(not_found.category(), ErrorCategory::NotFound);
        let denied = Error::from_status("sh -c foo", ExitStatus::from_raw(126 << 8));
        assert_eq!(denied.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_spawn_not_found() {
        let err = Error::Spawn {
            command: "paru -S x".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_identity_category() {
        let err = Error::NoNormalUser {
            operation: "makepkg".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Identity);
        assert!(!err.category().advice().is_empty());
    }
}

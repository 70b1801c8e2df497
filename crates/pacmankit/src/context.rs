//! Per-run execution context.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Command unprivileged processes use to regain root.
///
/// declarch itself runs as root; the escalation command is handed to
/// programs that run as the normal user and install packages themselves
/// (makepkg, AUR wrappers) through `PACMAN_AUTH`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Escalation {
    #[default]
    Sudo,
    Doas,
    Pkexec,
    Su,
}

impl Escalation {
    /// All accepted escalation names.
    pub const NAMES: [&'static str; 4] = ["sudo", "doas", "pkexec", "su"];

    /// Command line prefix used to run a command as root.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Sudo => "sudo",
            Self::Doas => "doas",
            Self::Pkexec => "pkexec",
            Self::Su => "su -c",
        }
    }

    /// Name as written in the config.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sudo => "sudo",
            Self::Doas => "doas",
            Self::Pkexec => "pkexec",
            Self::Su => "su",
        }
    }
}

impl FromStr for Escalation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "sudo" => Ok(Self::Sudo),
            "doas" => Ok(Self::Doas),
            "pkexec" => Ok(Self::Pkexec),
            "su" => Ok(Self::Su),
            other => Err(Error::UnknownEscalation(other.to_string())),
        }
    }
}

impl fmt::Display for Escalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity and escalation settings for one run.
///
/// Built once before any subprocess is spawned and shared by reference with
/// every manager and hook runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    escalation: Escalation,
    normal_user: Option<String>,
}

impl RunContext {
    /// Create a context.
    pub fn new(escalation: Escalation, normal_user: Option<String>) -> Self {
        Self {
            escalation,
            normal_user,
        }
    }

    pub fn escalation(&self) -> Escalation {
        self.escalation
    }

    /// The unprivileged identity, if one is configured.
    pub fn normal_user(&self) -> Option<&str> {
        self.normal_user.as_deref()
    }

    /// The unprivileged identity, or an error naming the operation that needed it.
    pub fn require_normal_user(&self, operation: &str) -> Result<&str> {
        self.normal_user().ok_or_else(|| Error::NoNormalUser {
            operation: operation.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_parse() {
        assert_eq!("doas".parse::<Escalation>().unwrap(), Escalation::Doas);
        assert_eq!(" su ".parse::<Escalation>().unwrap(), Escalation::Su);
        assert!(matches!(
            "runas".parse::<Escalation>(),
            Err(Error::UnknownEscalation(name)) if name == "runas"
        ));
    }

    #[test]
    fn test_su_command_takes_string() {
        assert_eq!(Escalation::Su.command(), "su -c");
        assert_eq!(Escalation::Sudo.command(), "sudo");
    }

    #[test]
    fn test_require_normal_user() {
        let ctx = RunContext::new(Escalation::Sudo, None);
        let err = ctx.require_normal_user("makepkg").unwrap_err();
        assert!(err.to_string().contains("makepkg"));

        let ctx = RunContext::new(Escalation::Sudo, Some("alice".to_string()));
        assert_eq!(ctx.require_normal_user("makepkg").unwrap(), "alice");
    }
}

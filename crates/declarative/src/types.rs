//! Core types shared by planning and execution

use serde::Serialize;
use std::fmt;

/// A part of the system reconciled as one phase.
///
/// Variants are listed in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    PacmanConf,
    Bootstrap,
    Users,
    Kernels,
    Bootloader,
    NetworkHandler,
    Native,
    Aur,
    FlatpakRemotes,
    Flatpak,
}

impl Subsystem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PacmanConf => "pacman.conf",
            Self::Bootstrap => "base system",
            Self::Users => "users",
            Self::Kernels => "kernels",
            Self::Bootloader => "bootloader",
            Self::NetworkHandler => "network handler",
            Self::Native => "pacman packages",
            Self::Aur => "AUR packages",
            Self::FlatpakRemotes => "flatpak remotes",
            Self::Flatpak => "flatpak packages",
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle transition a hook is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Install,
    Remove,
}

impl Transition {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "install" => Some(Self::Install),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

/// When a hook runs relative to the manager call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    Before,
    After,
}

impl Timing {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

/// Parse a config boolean. Only `true` and `false` are accepted.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_order_matches_execution() {
        assert!(Subsystem::Kernels < Subsystem::Bootloader);
        assert!(Subsystem::Bootloader < Subsystem::NetworkHandler);
        assert!(Subsystem::Native < Subsystem::Aur);
        assert!(Subsystem::FlatpakRemotes < Subsystem::Flatpak);
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Transition::parse("remove"), Some(Transition::Remove));
        assert_eq!(Transition::parse("Remove"), None);
        assert_eq!(Timing::parse("before"), Some(Timing::Before));
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("yes"), None);
    }
}

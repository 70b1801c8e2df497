//! Package manager abstraction.
//!
//! The [`PackageManager`] trait is the one interface the reconciler drives.
//! Each implementation names the package descriptor it accepts, so a Flatpak
//! reference can never be handed to pacman.

pub mod aur;
pub mod flatpak;
pub mod pacman;

use crate::error::Result;
use flatpak::FlatpakRef;
use serde::Serialize;
use std::fmt;

/// Environment variable makepkg and AUR wrappers read for their root command.
pub const PACMAN_AUTH: &str = "PACMAN_AUTH";

/// A package manager driven in batches.
pub trait PackageManager {
    /// Descriptor of one package for this manager.
    type Package;

    /// Short name for logs and error context.
    fn name(&self) -> &'static str;

    /// Install all packages. An empty slice runs nothing.
    fn install(&self, packages: &[Self::Package]) -> Result<()>;

    /// Remove all packages. An empty slice runs nothing.
    fn remove(&self, packages: &[Self::Package]) -> Result<()>;

    /// Upgrade everything this manager installed.
    fn system_upgrade(&self) -> Result<()>;
}

/// Any package the reconciler can schedule, for reporting and planning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PackageRef {
    /// A repository or AUR package name
    Name(String),
    /// A Flatpak application or runtime in a specific installation
    Flatpak(FlatpakRef),
}

impl PackageRef {
    /// Identity used for diffing: the name, or scope and name for Flatpak.
    pub fn identity(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Flatpak(reference) => reference.identity(),
        }
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

impl From<String> for PackageRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<FlatpakRef> for PackageRef {
    fn from(reference: FlatpakRef) -> Self {
        Self::Flatpak(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatpak::FlatpakScope;

    #[test]
    fn test_package_ref_identity() {
        let name = PackageRef::from("git".to_string());
        assert_eq!(name.identity(), "git");

        let mut reference = FlatpakRef::new("org.mozilla.firefox");
        reference.scope = FlatpakScope::User;
        assert_eq!(
            PackageRef::from(reference).to_string(),
            "user/org.mozilla.firefox"
        );
    }
}

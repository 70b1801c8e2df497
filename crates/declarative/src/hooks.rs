//! Lifecycle hooks attached to individual packages
//!
//! ```text
//! hook {
//!     package = linux
//!     for = install        # or remove
//!     when = after         # or before
//!     as = root
//!     run = mkinitcpio -P
//! }
//! ```
//!
//! `timing` and `user` are accepted as aliases of `when` and `as`. Without
//! `as`, a hook runs as the run's normal user.

use crate::error::Issue;
use crate::types::{Timing, Transition};
use confkit::Section;
use log::warn;
use pacmankit::FlatpakRef;

/// Section path of hooks for repository packages, kernels, bootloader and network handler.
pub const PACMAN_HOOKS: &str = "packages/pacman/hook";
/// Section path of hooks for AUR packages.
pub const AUR_HOOKS: &str = "packages/aur/hook";
/// Section path of hooks for Flatpak packages.
pub const FLATPAK_HOOKS: &str = "packages/flatpak/hook";

/// A command run before or after a package is installed or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hook {
    /// Package the hook is attached to
    pub package: String,
    pub transition: Transition,
    pub timing: Timing,
    /// Identity the command runs as
    pub user: String,
    pub run: String,
}

fn field<'a>(section: &'a Section, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| section.get(name).first())
        .map(String::as_str)
}

impl Hook {
    /// Build a hook from its section. `default_user` fills in a missing `as`.
    pub fn from_section(section: &Section, default_user: Option<&str>) -> Result<Self, String> {
        let package = field(section, &["package"])
            .filter(|p| !p.is_empty())
            .ok_or("hook is missing 'package'")?;
        let run = field(section, &["run"])
            .filter(|r| !r.is_empty())
            .ok_or_else(|| format!("hook for {package} is missing 'run'"))?;

        let transition = match field(section, &["for"]) {
            None => Transition::Install,
            Some(value) => Transition::parse(value).ok_or_else(|| {
                format!("hook for {package}: 'for' must be install or remove, got {value:?}")
            })?,
        };
        let timing = match field(section, &["when", "timing"]) {
            None => Timing::After,
            Some(value) => Timing::parse(value).ok_or_else(|| {
                format!("hook for {package}: 'when' must be before or after, got {value:?}")
            })?,
        };
        let user = field(section, &["as", "user"])
            .filter(|u| !u.is_empty())
            .or(default_user)
            .ok_or_else(|| {
                format!("hook for {package} has no 'as' and there is no single declared user")
            })?;

        Ok(Self {
            package: package.to_string(),
            transition,
            timing,
            user: user.to_string(),
            run: run.to_string(),
        })
    }

    /// Whether this hook runs for `transition` at `timing`.
    pub fn fires(&self, transition: Transition, timing: Timing) -> bool {
        self.transition == transition && self.timing == timing
    }
}

/// Every valid hook under `path`, in declaration order. Invalid hooks are skipped.
pub fn collect(root: &Section, path: &str, default_user: Option<&str>) -> Vec<Hook> {
    root.sections(path)
        .into_iter()
        .filter_map(|section| match Hook::from_section(section, default_user) {
            Ok(hook) => Some(hook),
            Err(message) => {
                warn!("Skipping hook in {path}: {message}");
                None
            }
        })
        .collect()
}

/// Problems with the hooks under `path`.
pub fn issues(root: &Section, path: &str, default_user: Option<&str>) -> Vec<Issue> {
    root.sections(path)
        .into_iter()
        .filter_map(|section| Hook::from_section(section, default_user).err())
        .map(|message| Issue::new(path, message))
        .collect()
}

/// Hooks attached to `package` for `transition`, in declaration order.
pub fn hooks_for<'h, P: HookTarget>(
    hooks: &'h [Hook],
    package: &P,
    transition: Transition,
) -> Vec<&'h Hook> {
    hooks
        .iter()
        .filter(|hook| hook.transition == transition && package.matches_hook(&hook.package))
        .collect()
}

/// A package that hooks can be attached to.
pub trait HookTarget {
    /// Whether a hook's `package` value refers to this package.
    fn matches_hook(&self, reference: &str) -> bool;

    /// Name shown in progress output.
    fn label(&self) -> String;
}

impl HookTarget for String {
    fn matches_hook(&self, reference: &str) -> bool {
        self == reference
    }

    fn label(&self) -> String {
        self.clone()
    }
}

impl HookTarget for FlatpakRef {
    fn matches_hook(&self, reference: &str) -> bool {
        self.matches(reference)
    }

    fn label(&self) -> String {
        self.identity()
    }
}

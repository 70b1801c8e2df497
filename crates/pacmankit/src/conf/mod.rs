//! Comment-preserving editing of `/etc/pacman.conf`.

pub mod document;
pub mod patcher;

pub use document::{Document, Line};
pub use patcher::{Patch, PatchMap, Patcher};

/// Default location of pacman's configuration.
pub const PACMAN_CONF: &str = "/etc/pacman.conf";

/// Mirror list used by the official repositories.
pub const DEFAULT_MIRRORLIST: &str = "/etc/pacman.d/mirrorlist";

/// Repositories shipped in the stock pacman.conf.
pub const OFFICIAL_REPOS: [&str; 8] = [
    "core",
    "extra",
    "multilib",
    "core-testing",
    "extra-testing",
    "multilib-testing",
    "gnome-unstable",
    "kde-unstable",
];

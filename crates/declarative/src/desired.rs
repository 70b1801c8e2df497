//! Resolution of a document into the concrete state it declares.

use crate::tags::TagSet;
use crate::types::parse_bool;
use crate::users::{User, UserRegistry};
use confkit::Section;
use log::warn;
use pacmankit::{FlatpakRef, FlatpakRemote, FlatpakScope, MAKEPKG};

pub const KERNEL: &str = "essentials/kernel";
pub const BOOTLOADER: &str = "essentials/bootloader";
pub const NETWORK_HANDLER: &str = "essentials/network_handler";
pub const PACMAN_PACKAGES: &str = "packages/pacman/package";
pub const AUR_PACKAGES: &str = "packages/aur/package";
pub const AUR_HELPER: &str = "packages/aur/helper";
pub const FLATPAK_PACKAGES: &str = "packages/flatpak/package";
pub const FLATPAK_REMOTES: &str = "packages/flatpak/remote";
pub const FLATPAK_AUTO_INSTALL: &str = "packages/flatpak/auto_install";

pub const DEFAULT_BOOTLOADER: &str = "grub efibootmgr";
pub const DEFAULT_NETWORK_HANDLER: &str = "networkmanager";

/// Everything a document declares, after tag resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub users: Vec<User>,
    /// Kernel names grouped by declaring entry, in declaration order
    pub kernels: Vec<Vec<String>>,
    pub bootloader: Vec<String>,
    pub network_handler: Vec<String>,
    pub native: Vec<String>,
    pub aur: Vec<String>,
    pub aur_helper: String,
    pub flatpak_remotes: Vec<FlatpakRemote>,
    pub flatpak: Vec<FlatpakRef>,
    pub flatpak_auto_install: bool,
}

impl DesiredState {
    /// Resolve a document under a tag set.
    ///
    /// `with_defaults` fills in the default bootloader and network handler
    /// when none is declared. It is off for the empty baseline of a first
    /// run so that the defaults show up as additions.
    pub fn resolve(root: &Section, tags: &TagSet, with_defaults: bool) -> Self {
        let single = |path: &str, default: &str| -> Vec<String> {
            let fallback = with_defaults.then_some(default);
            root.get_first(path)
                .or(fallback)
                .and_then(|entry| tags.resolve_entry(entry))
                .unwrap_or_default()
        };

        Self {
            users: UserRegistry::from_section(root).users().to_vec(),
            kernels: tags.resolve_entries(root.get_all(KERNEL)),
            bootloader: single(BOOTLOADER, DEFAULT_BOOTLOADER),
            network_handler: single(NETWORK_HANDLER, DEFAULT_NETWORK_HANDLER),
            native: tags.resolve(root.get_all(PACMAN_PACKAGES)),
            aur: tags.resolve(root.get_all(AUR_PACKAGES)),
            aur_helper: root.get_first(AUR_HELPER).unwrap_or(MAKEPKG).to_string(),
            flatpak_remotes: flatpak_remotes(root),
            flatpak: flatpak_packages(root, tags),
            flatpak_auto_install: root
                .get_first(FLATPAK_AUTO_INSTALL)
                .and_then(parse_bool)
                .unwrap_or(true),
        }
    }

    /// Kernel names in declaration order.
    pub fn kernel_names(&self) -> Vec<String> {
        self.kernels.iter().flatten().cloned().collect()
    }
}

fn first(section: &Section, key: &str) -> Option<String> {
    section.get(key).iter().find(|v| !v.is_empty()).cloned()
}

fn flag(section: &Section, key: &str) -> bool {
    first(section, key)
        .and_then(|v| parse_bool(&v))
        .unwrap_or(false)
}

fn scope(section: &Section) -> FlatpakScope {
    FlatpakScope::from_flags(
        flag(section, "user_installation"),
        first(section, "installation").as_deref(),
    )
}

/// Flatpak packages from plain `package = ...` values and `package { ... }` sections.
fn flatpak_packages(root: &Section, tags: &TagSet) -> Vec<FlatpakRef> {
    let mut refs: Vec<FlatpakRef> = tags
        .resolve(root.get_all(FLATPAK_PACKAGES))
        .into_iter()
        .map(FlatpakRef::new)
        .collect();

    for section in root.sections(FLATPAK_PACKAGES) {
        let names = tags.resolve(section.get("name"));
        if section.get("name").is_empty() {
            warn!("Skipping flatpak package section without a name");
        }
        for name in names {
            refs.push(FlatpakRef {
                name,
                remote: first(section, "remote"),
                scope: scope(section),
                arch: first(section, "architecture"),
                subpath: first(section, "subpath"),
            });
        }
    }

    refs
}

fn flatpak_remotes(root: &Section) -> Vec<FlatpakRemote> {
    root.sections(FLATPAK_REMOTES)
        .into_iter()
        .filter_map(|section| {
            let (Some(name), Some(url)) = (first(section, "name"), first(section, "url")) else {
                warn!("Skipping flatpak remote without name and url");
                return None;
            };
            Some(FlatpakRemote {
                name,
                url,
                scope: scope(section),
                disable: flag(section, "disable"),
                title: first(section, "title"),
                comment: first(section, "comment"),
                description: first(section, "description"),
                homepage: first(section, "homepage"),
                icon: first(section, "icon"),
                default_branch: first(section, "default_branch"),
            })
        })
        .collect()
}

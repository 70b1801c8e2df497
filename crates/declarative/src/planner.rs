//! Planning - what each subsystem has to change between two documents

use crate::desired::DesiredState;
use crate::diff::{Changes, diff, diff_by};
use crate::tags::TagSet;
use crate::types::Subsystem;
use crate::users::{self, User};
use confkit::Section;
use pacmankit::{FlatpakRef, FlatpakRemote, PackageRef};
use serde::Serialize;
use std::collections::HashSet;

/// Packages installed on a fresh system before anything else.
pub const BOOTSTRAP_PACKAGES: [&str; 3] = ["base", "base-devel", "git"];

/// User accounts to create, update and delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserChanges {
    pub added: Vec<User>,
    pub removed: Vec<User>,
    /// `(previous, current)` declarations of users that changed
    pub modified: Vec<(User, User)>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Kernel changes, split so a bootable kernel is always installed.
///
/// `first` holds the added kernels of the most recently declared entry that
/// has any; it is installed before anything is removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KernelChanges {
    pub first: Vec<String>,
    pub removed: Vec<String>,
    pub rest: Vec<String>,
}

impl KernelChanges {
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.removed.is_empty() && self.rest.is_empty()
    }

    fn build(current: &DesiredState, previous: &DesiredState) -> Self {
        let changes = diff(&current.kernel_names(), &previous.kernel_names());

        let first: Vec<String> = current
            .kernels
            .iter()
            .rev()
            .find(|entry| entry.iter().any(|k| changes.added.contains(k)))
            .map(|entry| {
                changes
                    .added
                    .iter()
                    .filter(|k| entry.contains(k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let rest = changes
            .added
            .iter()
            .filter(|k| !first.contains(k))
            .cloned()
            .collect();

        Self {
            first,
            removed: changes.removed,
            rest,
        }
    }
}

/// A change to one Flatpak remote that is still declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemoteAction {
    Add(FlatpakRemote),
    Modify(FlatpakRemote),
}

impl RemoteAction {
    pub fn remote(&self) -> &FlatpakRemote {
        match self {
            Self::Add(remote) | Self::Modify(remote) => remote,
        }
    }
}

/// Flatpak remote changes. Removals run first, then `actions` in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteChanges {
    pub removed: Vec<FlatpakRemote>,
    pub actions: Vec<RemoteAction>,
}

impl RemoteChanges {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.actions.is_empty()
    }

    pub fn adds_any(&self) -> bool {
        self.actions
            .iter()
            .any(|action| matches!(action, RemoteAction::Add(_)))
    }

    fn build(current: &[FlatpakRemote], previous: &[FlatpakRemote]) -> Self {
        let removed = diff_by(current, previous, FlatpakRemote::identity).removed;

        let mut seen = HashSet::new();
        let actions = current
            .iter()
            .filter(|remote| seen.insert(remote.identity()))
            .filter_map(|remote| {
                match previous.iter().find(|p| p.identity() == remote.identity()) {
                    None => Some(RemoteAction::Add(remote.clone())),
                    Some(old) if old != remote => Some(RemoteAction::Modify(remote.clone())),
                    Some(_) => None,
                }
            })
            .collect();

        Self { removed, actions }
    }
}

/// Every change an apply would make, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// No snapshot existed; this is the first run against the system
    pub fresh: bool,
    pub bootstrap: Vec<String>,
    pub users: UserChanges,
    pub kernels: KernelChanges,
    pub bootloader: Changes<String>,
    pub network_handler: Changes<String>,
    pub native: Changes<String>,
    pub aur_helper: String,
    pub aur: Changes<String>,
    pub flatpak_remotes: RemoteChanges,
    pub flatpak: Changes<FlatpakRef>,
    /// Install the flatpak package before touching remotes or packages
    pub install_flatpak: bool,
}

impl Plan {
    /// Compare a document with the previously applied one.
    ///
    /// Both trees are resolved under the same tags. Default bootloader and
    /// network handler apply to `previous` only when it is a real snapshot.
    pub fn build(current: &Section, previous: &Section, fresh: bool, tags: &TagSet) -> Self {
        let now = DesiredState::resolve(current, tags, true);
        let before = DesiredState::resolve(previous, tags, !fresh);
        Self::from_states(&now, &before, fresh)
    }

    pub fn from_states(current: &DesiredState, previous: &DesiredState, fresh: bool) -> Self {
        let flatpak = diff_by(&current.flatpak, &previous.flatpak, FlatpakRef::identity);
        let flatpak_remotes = RemoteChanges::build(&current.flatpak_remotes, &previous.flatpak_remotes);
        let install_flatpak = current.flatpak_auto_install
            && (!flatpak.added.is_empty() || flatpak_remotes.adds_any());

        Self {
            fresh,
            bootstrap: if fresh {
                BOOTSTRAP_PACKAGES.iter().map(ToString::to_string).collect()
            } else {
                Vec::new()
            },
            users: user_changes(&current.users, &previous.users),
            kernels: KernelChanges::build(current, previous),
            bootloader: diff(&current.bootloader, &previous.bootloader),
            network_handler: diff(&current.network_handler, &previous.network_handler),
            native: diff(&current.native, &previous.native),
            aur_helper: current.aur_helper.clone(),
            aur: diff(&current.aur, &previous.aur),
            flatpak_remotes,
            flatpak,
            install_flatpak,
        }
    }

    /// Whether applying this plan changes nothing.
    pub fn is_empty(&self) -> bool {
        self.subsystems().is_empty()
    }

    /// Subsystems with pending changes, in execution order.
    pub fn subsystems(&self) -> Vec<Subsystem> {
        let pending = [
            (Subsystem::Bootstrap, !self.bootstrap.is_empty()),
            (Subsystem::Users, !self.users.is_empty()),
            (Subsystem::Kernels, !self.kernels.is_empty()),
            (Subsystem::Bootloader, !self.bootloader.is_empty()),
            (Subsystem::NetworkHandler, !self.network_handler.is_empty()),
            (Subsystem::Native, !self.native.is_empty()),
            (Subsystem::Aur, !self.aur.is_empty()),
            (Subsystem::FlatpakRemotes, !self.flatpak_remotes.is_empty()),
            (
                Subsystem::Flatpak,
                !self.flatpak.is_empty()
                    || self.flatpak_install_phase() == Some(Subsystem::Flatpak),
            ),
        ];
        pending
            .into_iter()
            .filter_map(|(subsystem, changed)| changed.then_some(subsystem))
            .collect()
    }

    /// Phase that installs `flatpak` itself: remotes when any change, else packages.
    pub fn flatpak_install_phase(&self) -> Option<Subsystem> {
        if !self.install_flatpak {
            None
        } else if self.flatpak_remotes.is_empty() {
            Some(Subsystem::Flatpak)
        } else {
            Some(Subsystem::FlatpakRemotes)
        }
    }

    /// Packages of a subsystem as `(added, removed)`, for display.
    pub fn packages(&self, subsystem: Subsystem) -> (Vec<PackageRef>, Vec<PackageRef>) {
        fn names(list: &[String]) -> Vec<PackageRef> {
            list.iter().cloned().map(PackageRef::from).collect()
        }
        fn refs(list: &[FlatpakRef]) -> Vec<PackageRef> {
            list.iter().cloned().map(PackageRef::from).collect()
        }

        match subsystem {
            Subsystem::PacmanConf | Subsystem::Users | Subsystem::FlatpakRemotes => {
                (Vec::new(), Vec::new())
            }
            Subsystem::Bootstrap => (names(&self.bootstrap), Vec::new()),
            Subsystem::Kernels => {
                let mut added = names(&self.kernels.first);
                added.extend(names(&self.kernels.rest));
                (added, names(&self.kernels.removed))
            }
            Subsystem::Bootloader => (
                names(&self.bootloader.added),
                names(&self.bootloader.removed),
            ),
            Subsystem::NetworkHandler => (
                names(&self.network_handler.added),
                names(&self.network_handler.removed),
            ),
            Subsystem::Native => (names(&self.native.added), names(&self.native.removed)),
            Subsystem::Aur => (names(&self.aur.added), names(&self.aur.removed)),
            Subsystem::Flatpak => (refs(&self.flatpak.added), refs(&self.flatpak.removed)),
        }
    }
}

fn user_changes(current: &[User], previous: &[User]) -> UserChanges {
    let changes = diff_by(current, previous, |u: &User| u.username.clone());
    let modified = current
        .iter()
        .filter_map(|user| {
            previous
                .iter()
                .find(|p| p.username == user.username)
                .filter(|p| users::needs_update(p, user))
                .map(|p| (p.clone(), user.clone()))
        })
        .collect();

    UserChanges {
        added: changes.added,
        removed: changes.removed,
        modified,
    }
}

//! # pacmankit
//!
//! Arch Linux package managers behind one interface.
//!
//! ## Architecture
//!
//! - [`PackageManager`]: install/remove/upgrade in batches, with a typed
//!   package descriptor per manager
//! - [`Pacman`], [`AurHelper`] (wrapper or makepkg) and [`Flatpak`]
//! - [`CommandRunner`]: the single seam where processes are spawned;
//!   [`SystemRunner`] runs them, [`RecordingRunner`] records them
//! - [`RunContext`]: escalation command and unprivileged identity
//! - [`conf`]: structural patching of pacman.conf
//!
//! ## Example
//!
//! ```ignore
//! use pacmankit::{Escalation, PackageManager, Pacman, RunContext, SystemRunner};
//!
//! let ctx = RunContext::new(Escalation::Sudo, Some("alice".into()));
//! let pacman = Pacman::new(&SystemRunner);
//! pacman.install(&["git".to_string()])?;
//! ```

pub mod conf;
pub mod context;
pub mod error;
pub mod identity;
pub mod manager;
pub mod runner;

pub use context::{Escalation, RunContext};
pub use error::{Error, ErrorCategory, Result};
pub use manager::aur::{AurHelper, MAKEPKG};
pub use manager::flatpak::{Flatpak, FlatpakRef, FlatpakRemote, FlatpakScope};
pub use manager::pacman::Pacman;
pub use manager::{PackageManager, PackageRef};
pub use runner::{CommandRunner, CommandSpec, RecordingRunner, SystemRunner};

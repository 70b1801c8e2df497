//! # Declarative
//!
//! Declarative reconciliation of an Arch Linux system.
//!
//! A configuration document declares the packages, kernels, users and Flatpak
//! setup a machine should have. Each run compares the document with a
//! snapshot of the last successfully applied one and converges the system by
//! driving pacman, an AUR helper and Flatpak.
//!
//! ## Core Concepts
//!
//! - **TagSet**: selects which tagged entries are active for a run
//! - **DesiredState**: a document resolved under a tag set
//! - **Plan**: per-subsystem additions and removals between two states
//! - **Orchestrator**: executes a plan phase by phase, failing fast
//! - **Session**: a document plus its snapshot; validates, applies and records
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ApplyOptions, NoReport, Session};
//! use pacmankit::SystemRunner;
//!
//! let session = Session::load(Path::new("/etc/declarch/declarch.conf"))?;
//! let outcome = session.apply(&ApplyOptions::default(), &SystemRunner, &NoReport)?;
//! println!("{} subsystem(s) changed", outcome.plan.subsystems().len());
//! ```
//!
//! ## Provider Traits
//!
//! - [`HookRunner`]: runs hook commands as a given identity
//! - [`Reporter`]: receives progress updates
//! - [`ConfirmCallback`]: handles user confirmations
//!
//! Process spawning itself goes through [`pacmankit::CommandRunner`], so a
//! whole run can be recorded instead of executed.

pub mod batch;
pub mod context;
pub mod desired;
pub mod diff;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod pacman_conf;
pub mod planner;
pub mod session;
pub mod tags;
pub mod types;
pub mod users;
pub mod validate;

// Re-export main types at crate root
pub use batch::Batch;
pub use context::{
    AutoConfirm, AutoDecline, ConfirmCallback, HookRunner, NoReport, Reporter, ShellHooks,
};
pub use desired::DesiredState;
pub use diff::{Changes, diff};
pub use error::{Error, Issue, Result};
pub use executor::{ExecuteOptions, Orchestrator};
pub use hooks::{Hook, hooks_for};
pub use planner::{KernelChanges, Plan, RemoteAction, RemoteChanges, UserChanges};
pub use session::{ApplyOptions, Outcome, Session, snapshot_path};
pub use tags::TagSet;
pub use types::{Subsystem, Timing, Transition};
pub use users::{User, UserRegistry};
pub use validate::validate;

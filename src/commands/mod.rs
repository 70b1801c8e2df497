//! Command implementations
//!
//! - `apply` - Converge the system to the configuration
//! - `diff` - Preview what apply would change
//! - `verify` - Parse and validate the configuration
//! - `init` / `edit` - Manage the configuration file

pub mod apply;
pub mod diff;
pub mod edit;
pub mod init;
pub mod verify;

use anyhow::{Context as AnyhowContext, Result};
use declarative::{Issue, Session, TagSet};
use std::path::{Path, PathBuf};

use crate::cli::TagArgs;
use crate::paths;
use crate::ui;

/// Configuration written by `init` and by `apply` on first use
pub const DEFAULT_DOCUMENT: &str = include_str!("../../assets/declarch.conf");

/// Resolve the configuration path given on the command line.
pub fn config_path(path: &Path) -> Result<PathBuf> {
    paths::resolve(path)
}

/// Load a configuration and its snapshot.
pub fn load_session(path: &Path) -> Result<Session> {
    if !path.exists() {
        anyhow::bail!(
            "Configuration file not found: {} (run `declarch init` to create it)",
            path.display()
        );
    }
    Session::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Build the run's tag set from `--tags` and `--bare`.
pub fn tag_set(args: &TagArgs) -> TagSet {
    TagSet::for_run(&args.tags, args.bare)
}

/// Print validation issues, one per line.
pub fn print_issues(issues: &[Issue]) {
    for issue in issues {
        ui::error(&issue.to_string());
    }
}

/// Write the default configuration to `path`, creating parent directories.
pub fn write_default(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Error creating configuration directory: {}", dir.display()))?;
    }
    std::fs::write(path, DEFAULT_DOCUMENT)
        .with_context(|| format!("Error creating configuration file: {}", path.display()))
}

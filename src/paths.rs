//! Path resolution for declarch
//!
//! # Environment Variables
//!
//! - `DECLARCH_CONFIG` - Configuration file (default `/etc/declarch/declarch.conf`)
//! - `DECLARCH_PACMAN_CONF` - pacman.conf to patch (default `/etc/pacman.conf`)
//!
//! The snapshot of the last applied configuration lives beside it, with a
//! `.prev` suffix.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for the configuration file
pub const ENV_CONFIG: &str = "DECLARCH_CONFIG";

/// Environment variable for the pacman.conf override
pub const ENV_PACMAN_CONF: &str = "DECLARCH_PACMAN_CONF";

/// Default configuration file
pub const DEFAULT_CONFIG: &str = "/etc/declarch/declarch.conf";

/// Expand `~` and make a path absolute against the working directory.
pub fn resolve(path: &Path) -> Result<PathBuf> {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());
    if expanded.is_absolute() {
        return Ok(expanded);
    }
    let cwd = std::env::current_dir().context("Could not determine working directory")?;
    let path = cwd.join(expanded);
    log::debug!("Resolved config path: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_unchanged() {
        let path = resolve(Path::new("/etc/declarch/declarch.conf")).unwrap();
        assert_eq!(path, PathBuf::from(DEFAULT_CONFIG));
    }

    #[test]
    fn test_relative_path_made_absolute() {
        let path = resolve(Path::new("declarch.conf")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("declarch.conf"));
    }

    #[test]
    fn test_snapshot_beside_config() {
        let snapshot = declarative::snapshot_path(Path::new(DEFAULT_CONFIG));
        assert_eq!(snapshot, PathBuf::from("/etc/declarch/declarch.conf.prev"));
    }
}

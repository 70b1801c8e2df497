//! User database lookups.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use users::os::unix::UserExt;

/// Name of the superuser; commands for it run without dropping credentials.
pub const ROOT: &str = "root";

/// A resolved system user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl Identity {
    /// Whether this identity is the one running the current process.
    pub fn is_current(&self) -> bool {
        self.uid == users::get_current_uid()
    }
}

/// Resolve a user by name.
pub fn lookup(name: &str) -> Result<Identity> {
    let user = users::get_user_by_name(name).ok_or_else(|| Error::UnknownUser {
        name: name.to_string(),
    })?;
    Ok(Identity {
        name: name.to_string(),
        uid: user.uid(),
        gid: user.primary_group_id(),
        home: user.home_dir().to_path_buf(),
    })
}

/// Whether a user exists.
pub fn exists(name: &str) -> bool {
    users::get_user_by_name(name).is_some()
}

/// Whether the current process runs as root.
pub fn is_root() -> bool {
    users::get_current_uid() == 0
}

/// Supplementary group names of a user, excluding the primary group.
pub fn groups_of(name: &str) -> Result<Vec<String>> {
    let identity = lookup(name)?;
    let groups = users::get_user_groups(name, identity.gid).unwrap_or_default();
    Ok(groups
        .into_iter()
        .filter(|group| group.gid() != identity.gid)
        .map(|group| group.name().to_string_lossy().into_owned())
        .collect())
}

/// Hand a path over to a user and their primary group.
pub fn chown(path: &Path, identity: &Identity) -> Result<()> {
    std::os::unix::fs::chown(path, Some(identity.uid), Some(identity.gid))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_user() {
        let err = lookup("declarch-no-such-user").unwrap_err();
        assert!(matches!(err, Error::UnknownUser { name } if name == "declarch-no-such-user"));
        assert!(!exists("declarch-no-such-user"));
    }

    #[test]
    fn test_current_user_resolves() {
        let uid = users::get_current_uid();
        if let Some(user) = users::get_user_by_uid(uid) {
            let name = user.name().to_string_lossy().into_owned();
            let identity = lookup(&name).unwrap();
            assert!(identity.is_current());
        }
    }
}

//! Declared system users
//!
//! ```text
//! users {
//!     user {
//!         username = alice
//!         full_name = Alice Liddell
//!         shell = /bin/zsh
//!         group = wheel
//!         group = video
//!     }
//! }
//! ```

use crate::types::parse_bool;
use confkit::Section;
use log::{debug, info, warn};
use pacmankit::{CommandRunner, CommandSpec, identity};
use serde::Serialize;

/// Section path of user declarations.
pub const USERS: &str = "users/user";

/// Explicit unprivileged identity for builds and user-scope operations.
pub const NORMAL_USER: &str = "essentials/normal_user";

/// A declared user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
    pub full_name: Option<String>,
    pub shell: Option<String>,
    pub create_home: bool,
    pub home_dir: Option<String>,
    pub groups: Vec<String>,
}

fn first(section: &Section, key: &str) -> Option<String> {
    section
        .get(key)
        .iter()
        .find(|v| !v.is_empty())
        .cloned()
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            full_name: None,
            shell: None,
            create_home: true,
            home_dir: None,
            groups: Vec::new(),
        }
    }

    /// Read a `user` section. Returns `None` without a `username`.
    pub fn from_section(section: &Section) -> Option<Self> {
        let username = first(section, "username")?;
        Some(Self {
            username,
            full_name: first(section, "full_name"),
            shell: first(section, "shell"),
            create_home: first(section, "create_home")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            home_dir: first(section, "home_dir"),
            groups: section
                .get("group")
                .iter()
                .flat_map(|g| g.split_whitespace())
                .map(str::to_string)
                .collect(),
        })
    }
}

/// The users declared in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRegistry {
    users: Vec<User>,
    explicit_normal_user: Option<String>,
}

impl UserRegistry {
    pub fn from_section(root: &Section) -> Self {
        let users = root
            .sections(USERS)
            .into_iter()
            .filter_map(|section| {
                let user = User::from_section(section);
                if user.is_none() {
                    warn!("Skipping user section without a username");
                }
                user
            })
            .collect();
        Self {
            users,
            explicit_normal_user: root.get_first(NORMAL_USER).map(str::to_string),
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    /// The only declared user, if exactly one is declared.
    pub fn sole_user(&self) -> Option<&str> {
        match self.users.as_slice() {
            [only] => Some(&only.username),
            _ => None,
        }
    }

    /// Identity for unprivileged work: `essentials/normal_user`, else the sole user.
    pub fn normal_user(&self) -> Option<&str> {
        self.explicit_normal_user.as_deref().or_else(|| self.sole_user())
    }
}

/// Create a user with `useradd`.
pub fn create(user: &User, runner: &dyn CommandRunner) -> pacmankit::Result<()> {
    let mut spec = CommandSpec::new("useradd");
    if user.create_home {
        spec = spec.arg("-m");
    }
    if let Some(home) = &user.home_dir {
        spec = spec.args(["-d", home.as_str()]);
    }
    if let Some(shell) = &user.shell {
        spec = spec.args(["-s", shell.as_str()]);
    }
    if let Some(name) = &user.full_name {
        spec = spec.args(["-c", name.as_str()]);
    }
    if !user.groups.is_empty() {
        spec = spec.args(["-G".to_string(), user.groups.join(",")]);
    }
    runner.run(&spec.arg(&user.username))
}

/// Delete a user with `userdel`. The home directory is kept.
pub fn delete(user: &User, runner: &dyn CommandRunner) -> pacmankit::Result<()> {
    runner.run(&CommandSpec::new("userdel").arg(&user.username))
}

/// Create a user, or adopt an account that already exists on the system.
///
/// An existing account is brought in line with the declaration through
/// [`modify`], starting from a bare account with no extra groups.
pub fn create_or_adopt(user: &User, runner: &dyn CommandRunner) -> pacmankit::Result<()> {
    if identity::exists(&user.username) {
        info!("User {} already exists, adopting it", user.username);
        return modify(&User::new(user.username.clone()), user, runner);
    }
    create(user, runner)
}

fn groups_added<'u>(previous: &User, current: &'u User) -> Vec<&'u String> {
    current
        .groups
        .iter()
        .filter(|g| !previous.groups.contains(*g))
        .collect()
}

fn groups_dropped<'u>(previous: &'u User, current: &User) -> Vec<&'u String> {
    previous
        .groups
        .iter()
        .filter(|g| !current.groups.contains(*g))
        .collect()
}

/// Whether [`modify`] has anything to run for this change.
///
/// `create_home` only matters at creation, and clearing `shell` or
/// `home_dir` keeps the account's current value.
pub fn needs_update(previous: &User, current: &User) -> bool {
    (current.home_dir != previous.home_dir && current.home_dir.is_some())
        || (current.shell != previous.shell && current.shell.is_some())
        || current.full_name != previous.full_name
        || !groups_added(previous, current).is_empty()
        || !groups_dropped(previous, current).is_empty()
}

/// Bring an existing user in line with its new declaration.
///
/// Group additions alone are appended with `-a -G`. When groups are dropped
/// the full list is rewritten, starting from the groups the user has on the
/// system (or the previous declaration on simulated runs).
pub fn modify(previous: &User, current: &User, runner: &dyn CommandRunner) -> pacmankit::Result<()> {
    if !needs_update(previous, current) {
        debug!("No account changes for {}", current.username);
        return Ok(());
    }
    let mut spec = CommandSpec::new("usermod");

    if current.home_dir != previous.home_dir
        && let Some(home) = &current.home_dir
    {
        spec = spec.args(["-d", home.as_str(), "-m"]);
    }
    if current.shell != previous.shell
        && let Some(shell) = &current.shell
    {
        spec = spec.args(["-s", shell.as_str()]);
    }
    if current.full_name != previous.full_name {
        spec = spec.args(["-c", current.full_name.as_deref().unwrap_or("")]);
    }

    let added = groups_added(previous, current);
    let dropped = groups_dropped(previous, current);

    if !dropped.is_empty() {
        let base = if runner.is_simulated() {
            previous.groups.clone()
        } else {
            identity::groups_of(&current.username)?
        };
        let mut groups: Vec<String> = base
            .into_iter()
            .filter(|g| !dropped.contains(&g))
            .collect();
        for group in added {
            if !groups.contains(group) {
                groups.push(group.clone());
            }
        }
        spec = spec.args(["-G".to_string(), groups.join(",")]);
    } else if !added.is_empty() {
        let added: Vec<&str> = added.iter().map(|g| g.as_str()).collect();
        spec = spec.args(["-a".to_string(), "-G".to_string(), added.join(",")]);
    }

    runner.run(&spec.arg(&current.username))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacmankit::RecordingRunner;

    fn registry(text: &str) -> UserRegistry {
        UserRegistry::from_section(&confkit::parse(text).unwrap())
    }

    #[test]
    fn test_registry_sole_user() {
        let one = registry("users {\n user {\n username = alice\n group = wheel video\n }\n}\n");
        assert_eq!(one.sole_user(), Some("alice"));
        assert_eq!(one.normal_user(), Some("alice"));
        assert_eq!(one.get("alice").unwrap().groups, vec!["wheel", "video"]);

        let two = registry(
            "users {\n user {\n username = alice\n }\n user {\n username = bob\n }\n}\n",
        );
        assert_eq!(two.sole_user(), None);
        assert_eq!(two.normal_user(), None);

        let explicit = registry(
            "essentials {\n normal_user = bob\n}\nusers {\n user {\n username = alice\n }\n user {\n username = bob\n }\n}\n",
        );
        assert_eq!(explicit.normal_user(), Some("bob"));
    }

    #[test]
    fn test_create_flags() {
        let mut user = User::new("alice");
        user.shell = Some("/bin/zsh".to_string());
        user.full_name = Some("Alice Liddell".to_string());
        user.groups = vec!["wheel".to_string(), "video".to_string()];

        let runner = RecordingRunner::new();
        create(&user, &runner).unwrap();
        let call = &runner.calls()[0];
        assert_eq!(
            call.args,
            vec!["-m", "-s", "/bin/zsh", "-c", "Alice Liddell", "-G", "wheel,video", "alice"]
        );
    }

    #[test]
    fn test_delete_keeps_home() {
        let runner = RecordingRunner::new();
        delete(&User::new("bob"), &runner).unwrap();
        assert_eq!(runner.lines(), vec!["userdel bob"]);
    }

    #[test]
    fn test_modify_appends_groups() {
        let previous = User::new("alice");
        let mut current = previous.clone();
        current.groups = vec!["docker".to_string()];

        let runner = RecordingRunner::new();
        modify(&previous, &current, &runner).unwrap();
        assert_eq!(runner.lines(), vec!["usermod -a -G docker alice"]);
    }

    #[test]
    fn test_modify_rewrites_groups_on_removal() {
        let mut previous = User::new("alice");
        previous.groups = vec!["wheel".to_string(), "video".to_string()];
        let mut current = previous.clone();
        current.groups = vec!["wheel".to_string(), "audio".to_string()];
        current.shell = Some("/bin/fish".to_string());

        let runner = RecordingRunner::new();
        modify(&previous, &current, &runner).unwrap();
        assert_eq!(
            runner.lines(),
            vec!["usermod -s /bin/fish -G wheel,audio alice"]
        );
    }

    #[test]
    fn test_modify_noop() {
        let user = User::new("alice");
        let runner = RecordingRunner::new();
        modify(&user, &user.clone(), &runner).unwrap();
        assert!(runner.is_empty());
    }

    #[test]
    fn test_create_home_alone_needs_no_update() {
        let previous = User::new("alice");
        let mut current = previous.clone();
        current.create_home = false;

        assert!(!needs_update(&previous, &current));
        let runner = RecordingRunner::new();
        modify(&previous, &current, &runner).unwrap();
        assert!(runner.is_empty());

        current.full_name = Some("Alice".to_string());
        assert!(needs_update(&previous, &current));
    }

    #[test]
    fn test_existing_account_is_adopted() {
        let mut user = User::new(identity::ROOT);
        user.groups = vec!["wheel".to_string()];

        let runner = RecordingRunner::new();
        create_or_adopt(&user, &runner).unwrap();
        assert_eq!(runner.lines(), vec!["usermod -a -G wheel root"]);
    }

    #[test]
    fn test_missing_account_is_created() {
        let runner = RecordingRunner::new();
        create_or_adopt(&User::new("declarch-no-such-user"), &runner).unwrap();
        assert_eq!(runner.lines(), vec!["useradd -m declarch-no-such-user"]);
    }
}

//! Flatpak applications and remotes.
//!
//! User-scope installations run as the unprivileged user; system and named
//! installations run as root.

use crate::context::RunContext;
use crate::error::Result;
use crate::manager::PackageManager;
use crate::runner::{CommandRunner, CommandSpec};
use serde::Serialize;
use std::fmt;

/// The flatpak binary.
pub const FLATPAK: &str = "flatpak";

const NONINTERACTIVE: [&str; 2] = ["--noninteractive", "--assumeyes"];

/// Which Flatpak installation an item lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlatpakScope {
    /// The default system-wide installation
    #[default]
    System,
    /// The per-user installation (`--user`)
    User,
    /// A named installation (`--installation=NAME`)
    Installation(String),
}

impl FlatpakScope {
    /// Build a scope from config flags. A named installation wins over `user`.
    pub fn from_flags(user: bool, installation: Option<&str>) -> Self {
        match installation {
            Some(name) if !name.is_empty() => Self::Installation(name.to_string()),
            _ if user => Self::User,
            _ => Self::System,
        }
    }

    /// Command line flags selecting this installation.
    pub fn flags(&self) -> Vec<String> {
        match self {
            Self::System => Vec::new(),
            Self::User => vec!["--user".to_string()],
            Self::Installation(name) => vec![format!("--installation={name}")],
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl fmt::Display for FlatpakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => f.write_str("system"),
            Self::User => f.write_str("user"),
            Self::Installation(name) => write!(f, "installation:{name}"),
        }
    }
}

/// A Flatpak application or runtime to install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FlatpakRef {
    pub name: String,
    pub remote: Option<String>,
    pub scope: FlatpakScope,
    pub arch: Option<String>,
    pub subpath: Option<String>,
}

impl FlatpakRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `scope/name`; the same name in two installations is two packages.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.scope, self.name)
    }

    /// Whether a hook's `package` value refers to this ref, by bare name or identity.
    pub fn matches(&self, reference: &str) -> bool {
        reference == self.name || reference == self.identity()
    }
}

/// A Flatpak remote repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatpakRemote {
    pub name: String,
    pub url: String,
    pub scope: FlatpakScope,
    pub disable: bool,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub icon: Option<String>,
    pub default_branch: Option<String>,
}

impl FlatpakRemote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    /// `scope/name`, the key a remote is tracked by between runs.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.scope, self.name)
    }

    fn metadata_flags(&self) -> Vec<String> {
        let optional = [
            ("title", &self.title),
            ("comment", &self.comment),
            ("description", &self.description),
            ("homepage", &self.homepage),
            ("icon", &self.icon),
            ("default-branch", &self.default_branch),
        ];
        optional
            .into_iter()
            .filter_map(|(flag, value)| value.as_ref().map(|v| format!("--{flag}={v}")))
            .collect()
    }
}

/// Drives the flatpak CLI.
pub struct Flatpak<'a> {
    ctx: &'a RunContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> Flatpak<'a> {
    pub fn new(ctx: &'a RunContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    fn command(&self, scope: &FlatpakScope, operation: &str) -> Result<CommandSpec> {
        let spec = CommandSpec::new(FLATPAK).arg(operation);
        if scope.is_user() {
            let user = self.ctx.require_normal_user("flatpak --user")?;
            Ok(spec.as_user(user))
        } else {
            Ok(spec)
        }
    }

    /// Add a remote if it does not exist yet.
    pub fn add_remote(&self, remote: &FlatpakRemote) -> Result<()> {
        let mut spec = self
            .command(&remote.scope, "remote-add")?
            .arg("--if-not-exists")
            .args(remote.scope.flags());
        if remote.disable {
            spec = spec.arg("--disable");
        }
        let spec = spec
            .args(remote.metadata_flags())
            .arg(&remote.name)
            .arg(&remote.url);
        self.runner.run(&spec)
    }

    /// Delete a remote.
    pub fn remove_remote(&self, remote: &FlatpakRemote) -> Result<()> {
        let spec = self
            .command(&remote.scope, "remote-delete")?
            .args(remote.scope.flags())
            .arg(&remote.name);
        self.runner.run(&spec)
    }

    /// Bring an existing remote's settings in line with its declaration.
    pub fn modify_remote(&self, remote: &FlatpakRemote) -> Result<()> {
        let spec = self
            .command(&remote.scope, "remote-modify")?
            .args(remote.scope.flags())
            .arg(if remote.disable { "--disable" } else { "--enable" })
            .arg(format!("--url={}", remote.url))
            .args(remote.metadata_flags())
            .arg(&remote.name);
        self.runner.run(&spec)
    }
}

/// Group refs sharing the same flags, keeping first-seen order.
fn group_by<K: PartialEq>(
    refs: &[FlatpakRef],
    key: impl Fn(&FlatpakRef) -> K,
) -> Vec<(K, Vec<&FlatpakRef>)> {
    let mut groups: Vec<(K, Vec<&FlatpakRef>)> = Vec::new();
    for reference in refs {
        let k = key(reference);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(reference),
            None => groups.push((k, vec![reference])),
        }
    }
    groups
}

impl PackageManager for Flatpak<'_> {
    type Package = FlatpakRef;

    fn name(&self) -> &'static str {
        FLATPAK
    }

    fn install(&self, packages: &[FlatpakRef]) -> Result<()> {
        let groups = group_by(packages, |r| {
            (r.scope.clone(), r.remote.clone(), r.arch.clone(), r.subpath.clone())
        });

        for ((scope, remote, arch, subpath), members) in groups {
            let mut spec = self
                .command(&scope, "install")?
                .args(NONINTERACTIVE)
                .args(scope.flags());
            if let Some(arch) = arch {
                spec = spec.arg(format!("--arch={arch}"));
            }
            if let Some(subpath) = subpath {
                spec = spec.arg(format!("--subpath={subpath}"));
            }
            if let Some(remote) = remote {
                spec = spec.arg(remote);
            }
            let spec = spec.args(members.iter().map(|r| r.name.clone()));
            self.runner.run(&spec)?;
        }
        Ok(())
    }

    fn remove(&self, packages: &[FlatpakRef]) -> Result<()> {
        let groups = group_by(packages, |r| (r.scope.clone(), r.arch.clone()));

        for ((scope, arch), members) in groups {
            let mut spec = self
                .command(&scope, "uninstall")?
                .args(NONINTERACTIVE)
                .args(scope.flags());
            if let Some(arch) = arch {
                spec = spec.arg(format!("--arch={arch}"));
            }
            let spec = spec.args(members.iter().map(|r| r.name.clone()));
            self.runner.run(&spec)?;
        }
        Ok(())
    }

    fn system_upgrade(&self) -> Result<()> {
        let system = self
            .command(&FlatpakScope::System, "update")?
            .args(NONINTERACTIVE);
        self.runner.run(&system)?;

        if self.ctx.normal_user().is_some() {
            let user = self
                .command(&FlatpakScope::User, "update")?
                .args(NONINTERACTIVE)
                .arg("--user");
            self.runner.run(&user)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Escalation;
    use crate::runner::RecordingRunner;

    fn ctx() -> RunContext {
        RunContext::new(Escalation::Sudo, Some("alice".to_string()))
    }

    #[test]
    fn test_scope_from_flags() {
        assert_eq!(FlatpakScope::from_flags(false, None), FlatpakScope::System);
        assert_eq!(FlatpakScope::from_flags(true, None), FlatpakScope::User);
        assert_eq!(
            FlatpakScope::from_flags(true, Some("extra")),
            FlatpakScope::Installation("extra".to_string())
        );
        assert_eq!(FlatpakScope::from_flags(true, Some("")), FlatpakScope::User);
    }

    #[test]
    fn test_identity_distinguishes_scopes() {
        let system = FlatpakRef::new("org.gimp.GIMP");
        let mut user = FlatpakRef::new("org.gimp.GIMP");
        user.scope = FlatpakScope::User;
        assert_ne!(system.identity(), user.identity());
        assert!(user.matches("org.gimp.GIMP"));
        assert!(user.matches("user/org.gimp.GIMP"));
        assert!(!user.matches("system/org.gimp.GIMP"));
    }

    #[test]
    fn test_install_groups_by_flags() {
        let ctx = ctx();
        let runner = RecordingRunner::new();

        let mut gimp = FlatpakRef::new("org.gimp.GIMP");
        gimp.remote = Some("flathub".to_string());
        let mut firefox = FlatpakRef::new("org.mozilla.firefox");
        firefox.remote = Some("flathub".to_string());
        let mut local = FlatpakRef::new("com.example.App");
        local.scope = FlatpakScope::User;
        local.arch = Some("x86_64".to_string());

        Flatpak::new(&ctx, &runner)
            .install(&[gimp, local, firefox])
            .unwrap();

        assert_eq!(
            runner.lines(),
            vec![
                "flatpak install --noninteractive --assumeyes flathub org.gimp.GIMP org.mozilla.firefox",
                "[alice] flatpak install --noninteractive --assumeyes --user --arch=x86_64 com.example.App",
            ]
        );
    }

    #[test]
    fn test_uninstall_omits_remote_and_subpath() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        let mut reference = FlatpakRef::new("org.gimp.GIMP");
        reference.remote = Some("flathub".to_string());
        reference.subpath = Some("/sub".to_string());
        reference.scope = FlatpakScope::Installation("extra".to_string());

        Flatpak::new(&ctx, &runner).remove(&[reference]).unwrap();
        assert_eq!(
            runner.lines(),
            vec!["flatpak uninstall --noninteractive --assumeyes --installation=extra org.gimp.GIMP"]
        );
    }

    #[test]
    fn test_remote_commands() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        let flatpak = Flatpak::new(&ctx, &runner);

        let mut remote = FlatpakRemote::new("flathub", "https://dl.flathub.org/repo/flathub.flatpakrepo");
        remote.title = Some("Flathub".to_string());
        flatpak.add_remote(&remote).unwrap();

        remote.disable = true;
        flatpak.modify_remote(&remote).unwrap();
        flatpak.remove_remote(&remote).unwrap();

        assert_eq!(
            runner.lines(),
            vec![
                "flatpak remote-add --if-not-exists --title=Flathub flathub https://dl.flathub.org/repo/flathub.flatpakrepo",
                "flatpak remote-modify --disable --url=https://dl.flathub.org/repo/flathub.flatpakrepo --title=Flathub flathub",
                "flatpak remote-delete flathub",
            ]
        );
    }

    #[test]
    fn test_user_remote_needs_normal_user() {
        let ctx = RunContext::new(Escalation::Sudo, None);
        let runner = RecordingRunner::new();
        let mut remote = FlatpakRemote::new("flathub", "https://example.org");
        remote.scope = FlatpakScope::User;
        assert!(Flatpak::new(&ctx, &runner).add_remote(&remote).is_err());
        assert!(runner.is_empty());
    }

    #[test]
    fn test_upgrade_updates_user_installation() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        Flatpak::new(&ctx, &runner).system_upgrade().unwrap();
        assert_eq!(
            runner.lines(),
            vec![
                "flatpak update --noninteractive --assumeyes",
                "[alice] flatpak update --noninteractive --assumeyes --user",
            ]
        );
    }
}

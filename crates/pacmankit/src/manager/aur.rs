//! AUR packages, built as the unprivileged user.
//!
//! Two strategies: a pacman-compatible wrapper (paru, yay, ...) that takes
//! the whole batch at once, or plain makepkg, which clones and builds each
//! package in its own temporary directory. Both remove through pacman.

use crate::context::RunContext;
use crate::error::Result;
use crate::identity;
use crate::manager::pacman::Pacman;
use crate::manager::{PACMAN_AUTH, PackageManager};
use crate::runner::{CommandRunner, CommandSpec};
use log::{debug, info};

/// Helper name that selects the built-in makepkg strategy.
pub const MAKEPKG: &str = "makepkg";

/// Base URL of AUR git repositories.
pub const AUR_URL: &str = "https://aur.archlinux.org";

/// A pacman-compatible AUR wrapper such as paru or yay.
pub struct Wrapper<'a> {
    program: String,
    ctx: &'a RunContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> Wrapper<'a> {
    pub fn new(program: impl Into<String>, ctx: &'a RunContext, runner: &'a dyn CommandRunner) -> Self {
        Self {
            program: program.into(),
            ctx,
            runner,
        }
    }

    fn spec(&self, operation: &str) -> Result<CommandSpec> {
        let user = self.ctx.require_normal_user(operation)?;
        Ok(CommandSpec::new(&self.program)
            .as_user(user)
            .env(PACMAN_AUTH, self.ctx.escalation().command()))
    }
}

impl PackageManager for Wrapper<'_> {
    type Package = String;

    fn name(&self) -> &'static str {
        "aur"
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let spec = self
            .spec(&self.program)?
            .args(["-S", "--needed", "--noconfirm"])
            .args(packages.iter().cloned());
        self.runner.run(&spec)
    }

    fn remove(&self, packages: &[String]) -> Result<()> {
        Pacman::new(self.runner).remove(packages)
    }

    fn system_upgrade(&self) -> Result<()> {
        let spec = self.spec(&self.program)?.args(["-Syu", "--noconfirm"]);
        self.runner.run(&spec)
    }
}

/// Builds AUR packages directly with git and makepkg.
pub struct Makepkg<'a> {
    ctx: &'a RunContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> Makepkg<'a> {
    pub fn new(ctx: &'a RunContext, runner: &'a dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    fn build(&self, package: &str) -> Result<()> {
        let user = self.ctx.require_normal_user(MAKEPKG)?;

        // The TempDir guard removes the build tree when it goes out of scope.
        let (guard, dir) = if self.runner.is_simulated() {
            (None, std::env::temp_dir().join(format!("declarch-{package}")))
        } else {
            let dir = tempfile::Builder::new()
                .prefix(&format!("declarch-{package}-"))
                .tempdir()?;
            identity::chown(dir.path(), &identity::lookup(user)?)?;
            let path = dir.path().to_path_buf();
            (Some(dir), path)
        };
        debug!("Building {package} in {}", dir.display());

        let clone = CommandSpec::new("git")
            .arg("clone")
            .arg(format!("{AUR_URL}/{package}.git"))
            .arg(dir.display().to_string())
            .as_user(user);
        self.runner.run(&clone)?;

        let build = CommandSpec::new(MAKEPKG)
            .args(["-si", "--needed", "--noconfirm"])
            .current_dir(&dir)
            .as_user(user)
            .env(PACMAN_AUTH, self.ctx.escalation().command());
        self.runner.run(&build)?;

        drop(guard);
        Ok(())
    }
}

impl PackageManager for Makepkg<'_> {
    type Package = String;

    fn name(&self) -> &'static str {
        MAKEPKG
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        for package in packages {
            self.build(package)?;
        }
        Ok(())
    }

    fn remove(&self, packages: &[String]) -> Result<()> {
        Pacman::new(self.runner).remove(packages)
    }

    fn system_upgrade(&self) -> Result<()> {
        info!("makepkg has no upgrade command; AUR packages are left as they are");
        Ok(())
    }
}

/// The configured AUR strategy.
pub enum AurHelper<'a> {
    Makepkg(Makepkg<'a>),
    Wrapper(Wrapper<'a>),
}

impl<'a> AurHelper<'a> {
    /// Select a strategy by helper name; `makepkg` is built in, anything else is a wrapper.
    pub fn new(helper: &str, ctx: &'a RunContext, runner: &'a dyn CommandRunner) -> Self {
        if helper == MAKEPKG {
            Self::Makepkg(Makepkg::new(ctx, runner))
        } else {
            Self::Wrapper(Wrapper::new(helper, ctx, runner))
        }
    }

    pub fn is_makepkg(&self) -> bool {
        matches!(self, Self::Makepkg(_))
    }
}

impl PackageManager for AurHelper<'_> {
    type Package = String;

    fn name(&self) -> &'static str {
        match self {
            Self::Makepkg(m) => m.name(),
            Self::Wrapper(w) => w.name(),
        }
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        match self {
            Self::Makepkg(m) => m.install(packages),
            Self::Wrapper(w) => w.install(packages),
        }
    }

    fn remove(&self, packages: &[String]) -> Result<()> {
        match self {
            Self::Makepkg(m) => m.remove(packages),
            Self::Wrapper(w) => w.remove(packages),
        }
    }

    fn system_upgrade(&self) -> Result<()> {
        match self {
            Self::Makepkg(m) => m.system_upgrade(),
            Self::Wrapper(w) => w.system_upgrade(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Escalation;
    use crate::error::Error;
    use crate::runner::RecordingRunner;

    fn ctx() -> RunContext {
        RunContext::new(Escalation::Doas, Some("alice".to_string()))
    }

    #[test]
    fn test_wrapper_install_as_normal_user() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        let helper = AurHelper::new("paru", &ctx, &runner);
        assert!(!helper.is_makepkg());

        helper
            .install(&["paru-bin".to_string(), "visual-studio-code-bin".to_string()])
            .unwrap();
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].to_string(),
            "[alice] paru -S --needed --noconfirm paru-bin visual-studio-code-bin"
        );
        assert_eq!(
            calls[0].env,
            vec![(PACMAN_AUTH.to_string(), "doas".to_string())]
        );
    }

    #[test]
    fn test_wrapper_removes_with_pacman() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        AurHelper::new("yay", &ctx, &runner)
            .remove(&["foo".to_string()])
            .unwrap();
        assert_eq!(runner.lines(), vec!["pacman -R --noconfirm foo"]);
    }

    #[test]
    fn test_makepkg_clones_and_builds_each_package() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        let helper = AurHelper::new(MAKEPKG, &ctx, &runner);
        helper
            .install(&["yay-bin".to_string(), "spotify".to_string()])
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args[1], "https://aur.archlinux.org/yay-bin.git");
        assert_eq!(calls[1].command_line(), "makepkg -si --needed --noconfirm");
        assert_eq!(calls[1].cwd.as_deref(), Some(std::path::Path::new(&calls[0].args[2])));
        assert!(calls.iter().all(|c| c.user.as_deref() == Some("alice")));
        assert_eq!(calls[2].args[1], "https://aur.archlinux.org/spotify.git");
    }

    #[test]
    fn test_makepkg_stops_on_first_failure() {
        let ctx = ctx();
        let runner = RecordingRunner::failing_on("yay-bin.git");
        let err = Makepkg::new(&ctx, &runner)
            .install(&["yay-bin".to_string(), "spotify".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_missing_normal_user() {
        let ctx = RunContext::new(Escalation::Sudo, None);
        let runner = RecordingRunner::new();
        let err = AurHelper::new("paru", &ctx, &runner)
            .install(&["x".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::NoNormalUser { .. }));
        assert!(runner.is_empty());
    }

    #[test]
    fn test_wrapper_upgrade() {
        let ctx = ctx();
        let runner = RecordingRunner::new();
        AurHelper::new("paru", &ctx, &runner).system_upgrade().unwrap();
        assert_eq!(runner.lines(), vec!["[alice] paru -Syu --noconfirm"]);

        let runner = RecordingRunner::new();
        AurHelper::new(MAKEPKG, &ctx, &runner).system_upgrade().unwrap();
        assert!(runner.is_empty());
    }
}

//! Provider traits for hooks, progress reporting and confirmation
//!
//! These let the reconciler run without depending on a specific terminal UI
//! or process spawner.

use crate::types::Subsystem;
use pacmankit::{CommandRunner, CommandSpec};
use std::path::Path;

/// Runs hook commands.
pub trait HookRunner {
    /// Run `command` through the shell as `as_user` (`root` keeps root).
    fn run(&self, command: &str, as_user: &str) -> pacmankit::Result<()>;
}

/// Runs hooks as `sh -c <command>` through a [`CommandRunner`].
pub struct ShellHooks<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> ShellHooks<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl HookRunner for ShellHooks<'_> {
    fn run(&self, command: &str, as_user: &str) -> pacmankit::Result<()> {
        let spec = CommandSpec::new("sh")
            .args(["-c", command])
            .as_user(as_user);
        self.runner.run(&spec)
    }
}

/// Receives progress updates while a plan is executed.
pub trait Reporter {
    /// A phase with pending changes is starting.
    fn on_phase_start(&self, subsystem: Subsystem);

    /// A hook is about to run.
    fn on_hook(&self, package: &str, command: &str);

    /// A config file is about to change (or would change, on dry runs).
    fn on_config_change(&self, path: &Path, before: &str, after: &str);
}

/// Reporter that ignores everything.
pub struct NoReport;

impl Reporter for NoReport {
    fn on_phase_start(&self, _subsystem: Subsystem) {}
    fn on_hook(&self, _package: &str, _command: &str) {}
    fn on_config_change(&self, _path: &Path, _before: &str, _after: &str) {}
}

/// Confirmation callback for user interaction.
pub trait ConfirmCallback {
    /// Ask the user to confirm an action.
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool>;
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> std::io::Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> std::io::Result<bool> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pacmankit::RecordingRunner;

    #[test]
    fn test_shell_hooks_run_as_user() {
        let runner = RecordingRunner::new();
        let hooks = ShellHooks::new(&runner);
        hooks.run("mkinitcpio -P", "root").unwrap();
        hooks.run("echo hi > ~/x", "alice").unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].args, vec!["-c", "mkinitcpio -P"]);
        assert_eq!(calls[0].user, None);
        assert_eq!(calls[1].user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_confirm_stubs() {
        assert!(AutoConfirm.confirm("ok?").unwrap());
        assert!(!AutoDecline.confirm("ok?").unwrap());
    }
}

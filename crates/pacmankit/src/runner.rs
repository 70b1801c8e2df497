//! Subprocess execution.
//!
//! Every manager builds [`CommandSpec`]s and hands them to a
//! [`CommandRunner`], so the same manager code can run for real, print a
//! dry run, or record calls for tests.

use crate::error::{Error, Result};
use crate::identity::{self, ROOT};
use log::debug;
use std::cell::RefCell;
use std::fmt;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A command to run, with the identity it should run as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Run as this user instead of the invoking identity (`None` or `root` keeps root)
    pub user: Option<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            user: None,
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run as `user`. `root` is treated as no change of identity.
    pub fn as_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = (user != ROOT).then_some(user);
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// The command line without identity or environment.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "[{user}] ")?;
        }
        f.write_str(&self.command_line())
    }
}

/// Executes commands.
pub trait CommandRunner {
    /// Run a command to completion. A non-zero exit is an error.
    fn run(&self, spec: &CommandSpec) -> Result<()>;

    /// Whether commands are only simulated.
    ///
    /// Managers skip filesystem side effects (build directories, ownership
    /// changes) when this is true.
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Runs commands on the host with inherited stdio.
///
/// Commands with a `user` drop to that user's uid and gid and get `HOME`,
/// `USER` and `LOGNAME` set accordingly.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        if let Some(user) = &spec.user {
            let identity = identity::lookup(user)?;
            if !identity.is_current() {
                debug!("Dropping to {} ({}:{})", identity.name, identity.uid, identity.gid);
                cmd.uid(identity.uid)
                    .gid(identity.gid)
                    .env("HOME", &identity.home)
                    .env("USER", &identity.name)
                    .env("LOGNAME", &identity.name);
            }
        }

        debug!("Running: {spec}");
        let status = cmd.status().map_err(|source| Error::Spawn {
            command: spec.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::from_status(spec.to_string(), status))
        }
    }
}

/// Records commands instead of running them.
///
/// Used for dry runs and tests. A failure can be injected for any command
/// whose rendered form contains a given pattern.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail (exit code 1) the first and every later command containing `pattern`.
    pub fn failing_on(pattern: impl Into<String>) -> Self {
        Self {
            calls: RefCell::default(),
            fail_on: Some(pattern.into()),
        }
    }

    /// All commands run so far.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Rendered command lines (with identity prefix) run so far.
    pub fn lines(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        self.calls.borrow_mut().push(spec.clone());
        let rendered = spec.to_string();
        match &self.fail_on {
            Some(pattern) if rendered.contains(pattern.as_str()) => Err(Error::CommandFailed {
                command: rendered,
                status: "exit code 1".to_string(),
                code: Some(1),
            }),
            _ => Ok(()),
        }
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display() {
        let spec = CommandSpec::new("pacman")
            .args(["-S", "--needed", "git"])
            .as_user("alice");
        assert_eq!(spec.to_string(), "[alice] pacman -S --needed git");
        assert_eq!(spec.command_line(), "pacman -S --needed git");
    }

    #[test]
    fn test_root_user_is_no_switch() {
        let spec = CommandSpec::new("true").as_user("root");
        assert_eq!(spec.user, None);
    }

    #[test]
    fn test_recording_runner_failure() {
        let runner = RecordingRunner::failing_on("pacman -R");
        runner.run(&CommandSpec::new("pacman").args(["-S", "a"])).unwrap();
        let err = runner
            .run(&CommandSpec::new("pacman").args(["-R", "a"]))
            .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(1), .. }));
        assert_eq!(runner.lines(), vec!["pacman -S a", "pacman -R a"]);
        assert!(runner.is_simulated());
    }

    #[test]
    fn test_system_runner_status() {
        let runner = SystemRunner;
        runner.run(&CommandSpec::new("true")).unwrap();
        let err = runner.run(&CommandSpec::new("false")).unwrap_err();
        assert!(matches!(err, Error::CommandFailed { code: Some(1), .. }));
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run(&CommandSpec::new("declarch-definitely-missing"))
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
    }

    #[test]
    fn test_system_runner_cwd_and_env() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = CommandSpec::new("sh")
            .args(["-c", "test \"$MARKER\" = yes && touch here"])
            .current_dir(dir.path())
            .env("MARKER", "yes");
        SystemRunner.run(&spec).unwrap();
        assert!(dir.path().join("here").exists());
    }
}

use anyhow::{Context, Result};
use pacmankit::{CommandRunner, CommandSpec, SystemRunner};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::ui;

/// Default editor when `$EDITOR` is unset
pub const DEFAULT_EDITOR: &str = "vim";

/// Runs commands on the host, echoing each one first.
pub struct EchoRunner {
    inner: SystemRunner,
    quiet: bool,
}

impl EchoRunner {
    pub fn new(quiet: bool) -> Self {
        Self {
            inner: SystemRunner,
            quiet,
        }
    }
}

impl CommandRunner for EchoRunner {
    fn run(&self, spec: &CommandSpec) -> pacmankit::Result<()> {
        if !self.quiet {
            ui::command(&spec.to_string());
        }
        self.inner.run(spec)
    }
}

/// Prints commands instead of running them.
pub struct DryRunner;

impl CommandRunner for DryRunner {
    fn run(&self, spec: &CommandSpec) -> pacmankit::Result<()> {
        ui::dim(&format!("would run: {spec}"));
        Ok(())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

/// Open a file in `$EDITOR`, falling back to vim.
pub fn open_editor(path: &Path) -> Result<()> {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string());

    // $EDITOR may carry arguments, e.g. "code --wait"
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or(DEFAULT_EDITOR);

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to execute: {editor} {}", path.display()))?;

    if !status.success() {
        anyhow::bail!("{editor} exited with {status}");
    }
    Ok(())
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_runner_runs_nothing() {
        let spec = CommandSpec::new("false");
        assert!(DryRunner.run(&spec).is_ok());
        assert!(DryRunner.is_simulated());
    }
}

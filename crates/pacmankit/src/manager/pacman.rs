//! pacman, run as root.

use crate::error::Result;
use crate::manager::PackageManager;
use crate::runner::{CommandRunner, CommandSpec};

/// The pacman binary.
pub const PACMAN: &str = "pacman";

/// Installs and removes repository packages with pacman.
pub struct Pacman<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Pacman<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    fn run(&self, flags: &[&str], packages: &[String]) -> Result<()> {
        let spec = CommandSpec::new(PACMAN)
            .args(flags.iter().copied())
            .args(packages.iter().cloned());
        self.runner.run(&spec)
    }
}

impl PackageManager for Pacman<'_> {
    type Package = String;

    fn name(&self) -> &'static str {
        PACMAN
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        self.run(&["-S", "--needed", "--noconfirm"], packages)
    }

    fn remove(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        self.run(&["-R", "--noconfirm"], packages)
    }

    fn system_upgrade(&self) -> Result<()> {
        self.run(&["-Syu", "--noconfirm"], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::RecordingRunner;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_install_and_remove() {
        let runner = RecordingRunner::new();
        let pacman = Pacman::new(&runner);
        pacman.install(&names(&["git", "vim"])).unwrap();
        pacman.remove(&names(&["nano"])).unwrap();
        assert_eq!(
            runner.lines(),
            vec![
                "pacman -S --needed --noconfirm git vim",
                "pacman -R --noconfirm nano"
            ]
        );
        assert!(runner.calls().iter().all(|c| c.user.is_none()));
    }

    #[test]
    fn test_empty_batches_run_nothing() {
        let runner = RecordingRunner::new();
        let pacman = Pacman::new(&runner);
        pacman.install(&[]).unwrap();
        pacman.remove(&[]).unwrap();
        assert!(runner.is_empty());
    }

    #[test]
    fn test_upgrade() {
        let runner = RecordingRunner::new();
        Pacman::new(&runner).system_upgrade().unwrap();
        assert_eq!(runner.lines(), vec!["pacman -Syu --noconfirm"]);
    }
}

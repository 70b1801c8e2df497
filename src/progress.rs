//! Terminal progress for reconciliation runs.

use colored::Colorize;
use declarative::{Reporter, Subsystem};
use std::cell::Cell;
use std::path::Path;

use crate::ui;

/// Prints phase headers, hooks and config diffs as a plan executes.
pub struct TerminalReporter {
    total: usize,
    current: Cell<usize>,
    quiet: bool,
}

impl TerminalReporter {
    /// `total` is the number of phases expected to report.
    pub fn new(total: usize, quiet: bool) -> Self {
        Self {
            total,
            current: Cell::new(0),
            quiet,
        }
    }
}

impl Reporter for TerminalReporter {
    fn on_phase_start(&self, subsystem: Subsystem) {
        let num = self.current.get() + 1;
        self.current.set(num);
        if self.quiet {
            return;
        }
        println!();
        println!(
            "{} {}",
            format!("[{num}/{}]", self.total.max(num)).blue().bold(),
            subsystem.label().bold()
        );
    }

    fn on_hook(&self, package: &str, command: &str) {
        if !self.quiet {
            ui::dim(&format!("hook for {package}: {command}"));
        }
    }

    fn on_config_change(&self, path: &Path, before: &str, after: &str) {
        if self.quiet {
            return;
        }
        ui::kv("patching", &path.display().to_string());
        ui::text_diff(before, after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_phases() {
        let reporter = TerminalReporter::new(2, true);
        reporter.on_phase_start(Subsystem::Native);
        reporter.on_phase_start(Subsystem::Aur);
        assert_eq!(reporter.current.get(), 2);
    }
}

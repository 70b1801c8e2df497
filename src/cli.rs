use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::{DEFAULT_CONFIG, ENV_CONFIG, ENV_PACMAN_CONF};

#[derive(Parser)]
#[command(name = "declarch")]
#[command(version)]
#[command(about = "Declaratively manage an Arch Linux system", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the system to the configuration
    Apply(ApplyArgs),

    /// Show what apply would change
    Diff(DiffArgs),

    /// Check the configuration for errors
    Verify(ConfigArgs),

    /// Write the default configuration
    Init(ConfigArgs),

    /// Open the configuration in $EDITOR
    Edit(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Arguments
// ============================================================================

#[derive(Parser)]
pub struct ConfigArgs {
    /// Configuration file
    #[arg(short, long, env = ENV_CONFIG, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

#[derive(Parser)]
pub struct TagArgs {
    /// Extra tags for this run (e.g. `gaming`, `-default`)
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    pub tags: Vec<String>,

    /// Only apply entries tagged `+bare`
    #[arg(long)]
    pub bare: bool,
}

#[derive(Parser)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub tags: TagArgs,

    /// Upgrade every managed package instead of applying
    #[arg(long)]
    pub upgrade: bool,

    /// Print commands and config changes without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompts
    #[arg(short, long)]
    pub yes: bool,

    /// pacman.conf to patch
    #[arg(long, env = ENV_PACMAN_CONF, default_value = pacmankit::conf::PACMAN_CONF)]
    pub pacman_conf: PathBuf,
}

#[derive(Parser)]
pub struct DiffArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub tags: TagArgs,

    /// Output the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// pacman.conf to preview patches against
    #[arg(long, env = ENV_PACMAN_CONF, default_value = pacmankit::conf::PACMAN_CONF)]
    pub pacman_conf: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_flags() {
        let cli = Cli::parse_from([
            "declarch",
            "apply",
            "-c",
            "/tmp/test.conf",
            "--tags",
            "gaming,-default",
            "--bare",
            "--dry-run",
        ]);
        let Command::Apply(args) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.config.config, PathBuf::from("/tmp/test.conf"));
        assert_eq!(args.tags.tags, vec!["gaming", "-default"]);
        assert!(args.tags.bare);
        assert!(args.dry_run);
        assert!(!args.upgrade);
    }

    #[test]
    fn test_diff_json() {
        let cli = Cli::parse_from(["declarch", "diff", "--json", "-t", "laptop"]);
        let Command::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert!(args.json);
        assert_eq!(args.tags.tags, vec!["laptop"]);
    }
}

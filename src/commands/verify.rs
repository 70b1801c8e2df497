//! `declarch verify` - parse and validate the configuration

use anyhow::Result;

use crate::Context;
use crate::cli::ConfigArgs;
use crate::commands;
use crate::ui;

pub fn run(ctx: &Context, args: ConfigArgs) -> Result<()> {
    let path = commands::config_path(&args.config)?;
    let session = commands::load_session(&path)?;

    match session.validate() {
        Ok(()) => {
            if !ctx.quiet {
                ui::success(&format!("{} is valid", path.display()));
                if session.is_fresh() {
                    ui::dim("Not applied yet");
                }
            }
            Ok(())
        }
        Err(err) => {
            let issues = err.issues();
            commands::print_issues(issues);
            anyhow::bail!("{} found in {}", ui::plural(issues.len(), "issue"), path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
        }
    }

    #[test]
    fn test_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("declarch.conf");
        commands::write_default(&path).unwrap();
        assert!(run(&ctx(), ConfigArgs { config: path }).is_ok());
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("declarch.conf");
        std::fs::write(&path, "essentials {\n    privilege_escalation = please\n}\n").unwrap();
        let err = run(&ctx(), ConfigArgs { config: path }).unwrap_err();
        assert!(err.to_string().contains("1 issue"));
    }

    #[test]
    fn test_missing_config_fails() {
        let args = ConfigArgs {
            config: PathBuf::from("/nonexistent/declarch.conf"),
        };
        assert!(run(&ctx(), args).is_err());
    }
}

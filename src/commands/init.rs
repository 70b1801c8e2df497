//! `declarch init` - write the default configuration

use anyhow::Result;

use crate::Context;
use crate::cli::ConfigArgs;
use crate::commands;
use crate::ui;

pub fn run(ctx: &Context, args: ConfigArgs) -> Result<()> {
    let path = commands::config_path(&args.config)?;
    if path.exists() {
        anyhow::bail!(
            "{} already exists; use `declarch edit` to change it",
            path.display()
        );
    }

    commands::write_default(&path)?;
    if !ctx.quiet {
        ui::success(&format!("Created {}", path.display()));
        ui::dim("Edit it, then run `declarch apply`");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("declarch.conf");
        std::fs::write(&path, "mine").unwrap();

        let ctx = Context {
            verbose: 0,
            quiet: true,
        };
        assert!(run(&ctx, ConfigArgs { config: path.clone() }).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mine");
    }
}

//! `declarch edit` - open the configuration in `$EDITOR`

use anyhow::Result;

use crate::Context;
use crate::cli::ConfigArgs;
use crate::commands;
use crate::runner;

pub fn run(_ctx: &Context, args: ConfigArgs) -> Result<()> {
    let path = commands::config_path(&args.config)?;
    if !path.exists() {
        anyhow::bail!(
            "Configuration file not found: {} (run `declarch init` to create it)",
            path.display()
        );
    }
    runner::open_editor(&path)
}

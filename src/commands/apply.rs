//! `declarch apply` - converge the system to the configuration

use anyhow::{Context as AnyhowContext, Result};
use declarative::{ApplyOptions, AutoConfirm, ConfirmCallback, ExecuteOptions, Session};
use pacmankit::{CommandRunner, MAKEPKG, identity};

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands::{self, diff};
use crate::paths;
use crate::progress::TerminalReporter;
use crate::runner::{self, DryRunner, EchoRunner};
use crate::ui;

/// Asks on the terminal.
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> std::io::Result<bool> {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(true)
            .interact()
            .map_err(std::io::Error::other)
    }
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    if !args.dry_run && !identity::is_root() {
        anyhow::bail!("This command requires root privileges. Please rerun it as root.");
    }

    let path = commands::config_path(&args.config.config)?;
    if !path.exists() {
        commands::write_default(&path)?;
        ui::info(&format!("Created default configuration: {}", path.display()));
    }

    let session = commands::load_session(&path)?;
    if let Err(err) = session.validate() {
        commands::print_issues(err.issues());
        anyhow::bail!("Configuration is invalid: {err}");
    }

    let runner: Box<dyn CommandRunner> = if args.dry_run {
        Box::new(DryRunner)
    } else {
        Box::new(EchoRunner::new(ctx.quiet))
    };
    let mut confirm: Box<dyn ConfirmCallback> = if args.yes || args.dry_run {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };

    if args.upgrade {
        return upgrade(&session, &*runner, &mut *confirm);
    }

    let tags = commands::tag_set(&args.tags);
    let plan = session.plan(&tags);
    if !ctx.quiet {
        diff::print_plan(&plan, &session);
    }

    if !plan.is_empty() && !confirm.confirm("Apply changes?")? {
        ui::info("Cancelled");
        return Ok(());
    }

    if !plan.aur.added.is_empty()
        && plan.aur_helper != MAKEPKG
        && !runner::command_exists(&plan.aur_helper)
    {
        ui::warn(&format!(
            "AUR helper {} was not found; installs will fail unless it is installed first",
            plan.aur_helper
        ));
    }

    let options = ApplyOptions {
        tags,
        execute: ExecuteOptions {
            pacman_conf: paths::resolve(&args.pacman_conf)?,
            dry_run: args.dry_run,
        },
    };
    let reporter = TerminalReporter::new(plan.subsystems().len(), ctx.quiet);

    let outcome = match session.apply(&options, &*runner, &reporter) {
        Ok(outcome) => outcome,
        Err(err) => {
            report(&err);
            return Err(err).with_context(|| format!("Error applying configuration: {}", path.display()));
        }
    };

    println!();
    if args.dry_run {
        ui::success("Dry run complete; nothing was changed");
    } else if outcome.plan.is_empty() {
        ui::success("System already matches the configuration");
    } else {
        ui::success("Configuration applied successfully");
    }
    Ok(())
}

fn upgrade(
    session: &Session,
    runner: &dyn CommandRunner,
    confirm: &mut dyn ConfirmCallback,
) -> Result<()> {
    match session.upgrade(runner, confirm) {
        Ok(true) => {
            ui::success("System upgraded successfully");
            Ok(())
        }
        Ok(false) => {
            ui::info("Cancelled");
            Ok(())
        }
        Err(err) => {
            report(&err);
            Err(err).context("Error upgrading system")
        }
    }
}

/// Print what went wrong and what to do about it.
fn report(err: &declarative::Error) {
    commands::print_issues(err.issues());
    if let Some(source) = err.manager_error() {
        let category = source.category();
        ui::error(category.description());
        ui::dim(category.advice());
    }
    ui::dim("The snapshot was not updated; the next apply starts from the same baseline.");
}

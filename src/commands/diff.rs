//! `declarch diff` - preview what apply would change

use anyhow::{Context as AnyhowContext, Result};
use declarative::hooks::{self, AUR_HOOKS, FLATPAK_HOOKS, HookTarget, PACMAN_HOOKS};
use declarative::{Plan, RemoteAction, Session, Subsystem, Transition, hooks_for, pacman_conf};
use pacmankit::conf::Patcher;
use std::path::Path;

use crate::Context;
use crate::cli::DiffArgs;
use crate::commands;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, args: DiffArgs) -> Result<()> {
    let path = commands::config_path(&args.config.config)?;
    let session = commands::load_session(&path)?;
    if let Err(err) = session.validate() {
        commands::print_issues(err.issues());
        anyhow::bail!("Configuration is invalid: {err}");
    }

    let plan = session.plan(&commands::tag_set(&args.tags));

    if args.json {
        let json = serde_json::to_string_pretty(&plan).context("Failed to serialize plan")?;
        println!("{json}");
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }
    print_plan(&plan, &session);
    preview_pacman_conf(&session, &paths::resolve(&args.pacman_conf)?);
    Ok(())
}

/// Print every pending change, one block per subsystem.
pub fn print_plan(plan: &Plan, session: &Session) {
    ui::header("Pending changes");
    if session.is_fresh() {
        ui::dim("No snapshot found; treating this as a first run");
    }

    let subsystems = plan.subsystems();
    if subsystems.is_empty() {
        ui::success("System matches the configuration");
        return;
    }

    let ctx = session.context();
    let current = session.current();
    let default_user = ctx.normal_user();

    for subsystem in subsystems {
        ui::section(subsystem.label());
        if plan.flatpak_install_phase() == Some(subsystem) {
            ui::added("flatpak (pacman)");
        }
        match subsystem {
            Subsystem::Users => print_users(plan),
            Subsystem::FlatpakRemotes => print_remotes(plan),
            Subsystem::Native => {
                let hooks = hooks::collect(current, PACMAN_HOOKS, default_user);
                print_names(&plan.native.added, &plan.native.removed, &hooks);
            }
            Subsystem::Aur => {
                ui::kv("helper", &plan.aur_helper);
                let hooks = hooks::collect(current, AUR_HOOKS, default_user);
                print_names(&plan.aur.added, &plan.aur.removed, &hooks);
            }
            Subsystem::Flatpak => {
                let hooks = hooks::collect(current, FLATPAK_HOOKS, default_user);
                print_names(&plan.flatpak.added, &plan.flatpak.removed, &hooks);
            }
            other => {
                let (added, removed) = plan.packages(other);
                for package in removed {
                    ui::removed(&package.to_string());
                }
                for package in added {
                    ui::added(&package.to_string());
                }
            }
        }
    }

    println!();
    ui::info(&format!("{} to apply", ui::plural(plan.subsystems().len(), "phase")));
}

fn print_names<P: HookTarget>(added: &[P], removed: &[P], hooks: &[declarative::Hook]) {
    for package in removed {
        ui::removed(&with_hooks(package, hooks, Transition::Remove));
    }
    for package in added {
        ui::added(&with_hooks(package, hooks, Transition::Install));
    }
}

fn with_hooks<P: HookTarget>(package: &P, hooks: &[declarative::Hook], transition: Transition) -> String {
    let attached = hooks_for(hooks, package, transition).len();
    if attached == 0 {
        package.label()
    } else {
        format!("{} ({})", package.label(), ui::plural(attached, "hook"))
    }
}

fn print_users(plan: &Plan) {
    for user in &plan.users.removed {
        ui::removed(&user.username);
    }
    for (_, user) in &plan.users.modified {
        ui::changed(&user.username);
    }
    for user in &plan.users.added {
        ui::added(&user.username);
    }
}

fn print_remotes(plan: &Plan) {
    for remote in &plan.flatpak_remotes.removed {
        ui::removed(&remote.identity());
    }
    for action in &plan.flatpak_remotes.actions {
        match action {
            RemoteAction::Add(remote) => ui::added(&format!("{} ({})", remote.identity(), remote.url)),
            RemoteAction::Modify(remote) => ui::changed(&remote.identity()),
        }
    }
}

/// Show how pacman.conf would be patched, if at all.
fn preview_pacman_conf(session: &Session, path: &Path) {
    let current = session.current();
    let patches = pacman_conf::patches(current);
    if patches.is_empty() {
        return;
    }

    let before = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            log::debug!("Cannot read {}: {e}", path.display());
            return;
        }
    };
    let after = Patcher::new(pacman_conf::replace_comments(current)).patch_str(&before, &patches);
    if after != before {
        ui::section(Subsystem::PacmanConf.label());
        ui::text_diff(&before, &after);
    }
}

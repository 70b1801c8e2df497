//! Execution engine - drives the package managers through a plan, phase by phase
//!
//! Phases run in [`Subsystem`] order and stop at the first failure. Every
//! package phase follows the same shape: hooks attached to the packages of a
//! batch run around one manager call.

use crate::batch::Batch;
use crate::context::{Reporter, ShellHooks};
use crate::diff::Changes;
use crate::error::{Error, PhaseContext, Result};
use crate::hooks::{self, AUR_HOOKS, FLATPAK_HOOKS, Hook, HookTarget, PACMAN_HOOKS};
use crate::pacman_conf;
use crate::planner::{Plan, RemoteAction};
use crate::types::Subsystem;
use crate::users;
use confkit::Section;
use log::{debug, info};
use pacmankit::conf::{PACMAN_CONF, Patcher};
use pacmankit::manager::flatpak::FLATPAK;
use pacmankit::{AurHelper, CommandRunner, Flatpak, PackageManager, Pacman, RunContext};
use std::cell::Cell;
use std::path::PathBuf;

/// Options for executing a plan.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// pacman.conf to patch
    pub pacman_conf: PathBuf,
    /// Report config changes without writing them
    pub dry_run: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            pacman_conf: PathBuf::from(PACMAN_CONF),
            dry_run: false,
        }
    }
}

/// Hooks of the current document, per hook section.
struct HookSets {
    pacman: Vec<Hook>,
    aur: Vec<Hook>,
    flatpak: Vec<Hook>,
}

impl HookSets {
    fn collect(current: &Section, default_user: Option<&str>) -> Self {
        Self {
            pacman: hooks::collect(current, PACMAN_HOOKS, default_user),
            aur: hooks::collect(current, AUR_HOOKS, default_user),
            flatpak: hooks::collect(current, FLATPAK_HOOKS, default_user),
        }
    }
}

/// Applies plans to the system.
pub struct Orchestrator<'a> {
    ctx: &'a RunContext,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
    options: ExecuteOptions,
    started: Cell<Option<Subsystem>>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        ctx: &'a RunContext,
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn Reporter,
        options: ExecuteOptions,
    ) -> Self {
        Self {
            ctx,
            runner,
            reporter,
            options,
            started: Cell::new(None),
        }
    }

    /// Execute `plan`, reading pacman settings and hooks from `current`.
    pub fn execute(&self, plan: &Plan, current: &Section) -> Result<()> {
        let hooks = HookSets::collect(current, self.ctx.normal_user());
        let pacman = Pacman::new(self.runner);

        self.patch_pacman_conf(current)?;

        if !plan.bootstrap.is_empty() {
            self.start(Subsystem::Bootstrap);
            pacman.install(&plan.bootstrap).phase(Subsystem::Bootstrap)?;
        }

        self.users(plan)?;
        self.kernels(plan, &pacman, &hooks.pacman)?;
        self.swap(Subsystem::Bootloader, &pacman, &plan.bootloader, &hooks.pacman)?;
        self.swap(
            Subsystem::NetworkHandler,
            &pacman,
            &plan.network_handler,
            &hooks.pacman,
        )?;
        self.swap(Subsystem::Native, &pacman, &plan.native, &hooks.pacman)?;

        let aur = AurHelper::new(&plan.aur_helper, self.ctx, self.runner);
        self.swap(Subsystem::Aur, &aur, &plan.aur, &hooks.aur)?;

        self.flatpak(plan, &pacman, &hooks.flatpak)
    }

    /// Report a phase once, even when several steps open it in a row.
    fn start(&self, subsystem: Subsystem) {
        if self.started.replace(Some(subsystem)) == Some(subsystem) {
            return;
        }
        info!("Applying {subsystem}");
        self.reporter.on_phase_start(subsystem);
    }

    fn patch_pacman_conf(&self, current: &Section) -> Result<()> {
        let patches = pacman_conf::patches(current);
        if patches.is_empty() {
            return Ok(());
        }

        let path = &self.options.pacman_conf;
        let patcher = Patcher::new(pacman_conf::replace_comments(current));
        let before = std::fs::read_to_string(path).map_err(|source| Error::Phase {
            subsystem: Subsystem::PacmanConf,
            source: pacmankit::Error::ConfigFile {
                path: path.clone(),
                source,
            },
        })?;
        let after = patcher.patch_str(&before, &patches);
        if after == before {
            debug!("{} already up to date", path.display());
            return Ok(());
        }

        self.start(Subsystem::PacmanConf);
        self.reporter.on_config_change(path, &before, &after);
        if self.options.dry_run {
            return Ok(());
        }
        patcher
            .patch_file(path, &patches)
            .phase(Subsystem::PacmanConf)?;
        Ok(())
    }

    fn users(&self, plan: &Plan) -> Result<()> {
        let changes = &plan.users;
        if changes.is_empty() {
            return Ok(());
        }
        self.start(Subsystem::Users);

        for user in &changes.added {
            users::create_or_adopt(user, self.runner).phase(Subsystem::Users)?;
        }
        for (previous, current) in &changes.modified {
            users::modify(previous, current, self.runner).phase(Subsystem::Users)?;
        }
        for user in &changes.removed {
            users::delete(user, self.runner).phase(Subsystem::Users)?;
        }
        Ok(())
    }

    /// Install one new kernel before removing any, so the system stays bootable.
    fn kernels(&self, plan: &Plan, pacman: &Pacman<'_>, hooks: &[Hook]) -> Result<()> {
        let changes = &plan.kernels;
        if changes.is_empty() {
            return Ok(());
        }
        self.start(Subsystem::Kernels);
        let shell = ShellHooks::new(self.runner);

        let mut batch = Batch::new();
        for kernel in &changes.first {
            batch.push(kernel.clone(), hooks);
        }
        batch
            .install(pacman, &shell, self.reporter)
            .phase(Subsystem::Kernels)?;

        batch.clear();
        for kernel in &changes.removed {
            batch.push(kernel.clone(), hooks);
        }
        batch
            .remove(pacman, &shell, self.reporter)
            .phase(Subsystem::Kernels)?;

        batch.clear();
        for kernel in &changes.rest {
            batch.push(kernel.clone(), hooks);
        }
        batch
            .install(pacman, &shell, self.reporter)
            .phase(Subsystem::Kernels)
    }

    /// Remove stale packages, then install new ones.
    fn swap<M, P>(
        &self,
        subsystem: Subsystem,
        manager: &M,
        changes: &Changes<P>,
        hooks: &[Hook],
    ) -> Result<()>
    where
        M: PackageManager<Package = P>,
        P: HookTarget + Clone,
    {
        if changes.is_empty() {
            return Ok(());
        }
        self.start(subsystem);
        let shell = ShellHooks::new(self.runner);

        Batch::with_packages(&changes.removed, hooks)
            .remove(manager, &shell, self.reporter)
            .phase(subsystem)?;
        Batch::with_packages(&changes.added, hooks)
            .install(manager, &shell, self.reporter)
            .phase(subsystem)
    }

    fn flatpak(&self, plan: &Plan, pacman: &Pacman<'_>, hooks: &[Hook]) -> Result<()> {
        if let Some(phase) = plan.flatpak_install_phase() {
            self.start(phase);
            info!("Installing {FLATPAK}");
            pacman.install(&[FLATPAK.to_string()]).phase(phase)?;
        }

        let flatpak = Flatpak::new(self.ctx, self.runner);
        let remotes = &plan.flatpak_remotes;
        if !remotes.is_empty() {
            self.start(Subsystem::FlatpakRemotes);
            for remote in &remotes.removed {
                flatpak
                    .remove_remote(remote)
                    .phase(Subsystem::FlatpakRemotes)?;
            }
            for action in &remotes.actions {
                let result = match action {
                    RemoteAction::Add(remote) => flatpak.add_remote(remote),
                    RemoteAction::Modify(remote) => flatpak.modify_remote(remote),
                };
                result.phase(Subsystem::FlatpakRemotes)?;
            }
        }

        self.swap(Subsystem::Flatpak, &flatpak, &plan.flatpak, hooks)
    }
}

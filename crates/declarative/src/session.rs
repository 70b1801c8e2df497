//! One reconciliation run: the document, its last applied snapshot, and what
//! happens between them.

use crate::context::{ConfirmCallback, Reporter};
use crate::desired::{AUR_HELPER, AUR_PACKAGES, FLATPAK_PACKAGES};
use crate::error::{Error, PhaseContext, Result};
use crate::executor::{ExecuteOptions, Orchestrator};
use crate::planner::Plan;
use crate::tags::TagSet;
use crate::types::Subsystem;
use crate::users::UserRegistry;
use crate::validate;
use confkit::Section;
use log::{debug, info};
use pacmankit::{AurHelper, CommandRunner, Flatpak, MAKEPKG, PackageManager, Pacman, RunContext};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of the snapshot file written beside the document.
pub const SNAPSHOT_SUFFIX: &str = ".prev";

/// Where the snapshot of `document` lives.
pub fn snapshot_path(document: &Path) -> PathBuf {
    let mut name = OsString::from(document.as_os_str());
    name.push(SNAPSHOT_SUFFIX);
    PathBuf::from(name)
}

/// Options for [`Session::apply`].
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub tags: TagSet,
    pub execute: ExecuteOptions,
}

/// Result of an apply.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub plan: Plan,
    /// Whether the snapshot now matches the document
    pub snapshot_written: bool,
}

/// A document paired with the snapshot of its last successful apply.
#[derive(Debug, Clone)]
pub struct Session {
    document: PathBuf,
    current: Section,
    previous: Section,
    fresh: bool,
}

impl Session {
    /// Parse the document and its snapshot. A missing snapshot means a fresh system.
    pub fn load(document: &Path) -> Result<Self> {
        let current = confkit::parse_file(document)?;

        let snapshot = snapshot_path(document);
        let (previous, fresh) = if snapshot.exists() {
            debug!("Reading snapshot {}", snapshot.display());
            (confkit::parse_file(&snapshot)?, false)
        } else {
            debug!("No snapshot at {}, treating system as fresh", snapshot.display());
            (Section::new(), true)
        };

        Ok(Self {
            document: document.to_path_buf(),
            current,
            previous,
            fresh,
        })
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn current(&self) -> &Section {
        &self.current
    }

    pub fn previous(&self) -> &Section {
        &self.previous
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Every semantic problem in the document, as an error if there are any.
    pub fn validate(&self) -> Result<()> {
        let issues = validate::validate(&self.current);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(issues))
        }
    }

    /// Escalation command and unprivileged identity declared by the document.
    pub fn context(&self) -> RunContext {
        let registry = UserRegistry::from_section(&self.current);
        RunContext::new(
            validate::escalation(&self.current).unwrap_or_default(),
            registry.normal_user().map(str::to_string),
        )
    }

    pub fn plan(&self, tags: &TagSet) -> Plan {
        Plan::build(&self.current, &self.previous, self.fresh, tags)
    }

    /// Validate, execute the plan and record the document as applied.
    ///
    /// The snapshot is only replaced after every phase succeeded, and never
    /// on dry runs.
    pub fn apply(
        &self,
        options: &ApplyOptions,
        runner: &dyn CommandRunner,
        reporter: &dyn Reporter,
    ) -> Result<Outcome> {
        self.validate()?;
        let ctx = self.context();
        let plan = self.plan(&options.tags);

        Orchestrator::new(&ctx, runner, reporter, options.execute.clone())
            .execute(&plan, &self.current)?;

        if options.execute.dry_run {
            return Ok(Outcome {
                plan,
                snapshot_written: false,
            });
        }

        self.save_snapshot()?;
        Ok(Outcome {
            plan,
            snapshot_written: true,
        })
    }

    /// Upgrade everything the document manages, after confirmation.
    ///
    /// Returns false if the upgrade was declined.
    pub fn upgrade(
        &self,
        runner: &dyn CommandRunner,
        confirm: &mut dyn ConfirmCallback,
    ) -> Result<bool> {
        if !confirm.confirm("Upgrade all packages?").map_err(pacmankit::Error::from)? {
            info!("Upgrade declined");
            return Ok(false);
        }

        let ctx = self.context();
        Pacman::new(runner)
            .system_upgrade()
            .phase(Subsystem::Native)?;

        let helper = self.current.get_first(AUR_HELPER).unwrap_or(MAKEPKG);
        let aur = AurHelper::new(helper, &ctx, runner);
        if !aur.is_makepkg() && self.current.contains(AUR_PACKAGES) {
            aur.system_upgrade().phase(Subsystem::Aur)?;
        }

        if self.current.contains(FLATPAK_PACKAGES) {
            Flatpak::new(&ctx, runner)
                .system_upgrade()
                .phase(Subsystem::Flatpak)?;
        }
        Ok(true)
    }

    /// Atomically replace the snapshot with the current document.
    pub fn save_snapshot(&self) -> Result<()> {
        let path = snapshot_path(&self.document);
        let snapshot_error = |source| Error::Snapshot {
            path: path.clone(),
            source,
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(snapshot_error)?;
        temp.write_all(confkit::to_snapshot(&self.current).as_bytes())
            .map_err(snapshot_error)?;
        temp.persist(&path).map_err(|e| snapshot_error(e.error))?;

        debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}

//! Batched manager calls wrapped in per-package hooks.

use crate::context::{HookRunner, Reporter};
use crate::hooks::{Hook, HookTarget};
use crate::types::{Timing, Transition};
use pacmankit::PackageManager;

/// A package and the hooks declared for it.
#[derive(Debug, Clone)]
pub struct Item<'h, P> {
    pub package: P,
    pub hooks: Vec<&'h Hook>,
}

/// Packages handed to one manager call.
///
/// Executing a batch runs every item's `before` hooks, then a single
/// manager call for all items, then every item's `after` hooks. The first
/// failure stops the batch.
#[derive(Debug, Clone)]
pub struct Batch<'h, P> {
    items: Vec<Item<'h, P>>,
}

impl<P> Default for Batch<'_, P> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<'h, P: HookTarget + Clone> Batch<'h, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from packages, attaching the hooks that name each one.
    pub fn with_packages(packages: &[P], hooks: &'h [Hook]) -> Self {
        let mut batch = Self::new();
        for package in packages {
            batch.push(package.clone(), hooks);
        }
        batch
    }

    /// Add a package with the hooks from `hooks` that name it.
    pub fn push(&mut self, package: P, hooks: &'h [Hook]) {
        let attached = hooks
            .iter()
            .filter(|hook| package.matches_hook(&hook.package))
            .collect();
        self.items.push(Item {
            package,
            hooks: attached,
        });
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn packages(&self) -> Vec<P> {
        self.items.iter().map(|item| item.package.clone()).collect()
    }

    pub fn install<M>(
        &self,
        manager: &M,
        hooks: &dyn HookRunner,
        reporter: &dyn Reporter,
    ) -> pacmankit::Result<()>
    where
        M: PackageManager<Package = P>,
    {
        self.execute(Transition::Install, hooks, reporter, |packages| {
            manager.install(packages)
        })
    }

    pub fn remove<M>(
        &self,
        manager: &M,
        hooks: &dyn HookRunner,
        reporter: &dyn Reporter,
    ) -> pacmankit::Result<()>
    where
        M: PackageManager<Package = P>,
    {
        self.execute(Transition::Remove, hooks, reporter, |packages| {
            manager.remove(packages)
        })
    }

    fn execute(
        &self,
        transition: Transition,
        hooks: &dyn HookRunner,
        reporter: &dyn Reporter,
        call: impl FnOnce(&[P]) -> pacmankit::Result<()>,
    ) -> pacmankit::Result<()> {
        if self.is_empty() {
            return Ok(());
        }

        self.run_hooks(transition, Timing::Before, hooks, reporter)?;
        call(&self.packages())?;
        self.run_hooks(transition, Timing::After, hooks, reporter)
    }

    fn run_hooks(
        &self,
        transition: Transition,
        timing: Timing,
        hooks: &dyn HookRunner,
        reporter: &dyn Reporter,
    ) -> pacmankit::Result<()> {
        for item in &self.items {
            for hook in item.hooks.iter().filter(|h| h.fires(transition, timing)) {
                reporter.on_hook(&item.package.label(), &hook.run);
                hooks.run(&hook.run, &hook.user)?;
            }
        }
        Ok(())
    }
}

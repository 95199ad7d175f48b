//! # Install, Pull and Push
//!
//! The three synchronization operations share one algorithm. An
//! [`Orchestrator`] drains a FIFO queue seeded with the requested archives and,
//! for each archive not processed yet in this run:
//!
//! 1. resolves it to a [`LocalArchive`], cloning it first when the
//!    [`ResolutionStrategy`] is `Remote` and it is not installed;
//! 2. performs the primary side effect of the [`SyncAction`];
//! 3. optionally installs or updates its generated branches;
//! 4. optionally enqueues the dependencies declared in its manifest.
//!
//! A failure at any stage is logged with the archive and the stage, clears the
//! run's success flag, and never stops the remaining archives. Dependencies
//! are appended to the tail of the queue, so archives are visited
//! breadth-first, and every archive is processed at most once, which makes
//! runs over cyclic dependency graphs terminate.
//!
//! When confirmation is required and declined, the run stops before any side
//! effect and reports [`SyncOutcome::Aborted`].

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use dialoguer::{theme::ColorfulTheme, Confirm};
use log::{debug, error, info, warn};

use crate::archive::{Archive, LocalArchive};
use crate::error::{Error, Result};
use crate::hub::HubManager;
use crate::manifest::Manifest;
use crate::vcs::VersionControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Install,
    Pull,
    Push,
}

impl SyncAction {
    /// Log stage name of the primary side effect.
    fn stage(self) -> &'static str {
        match self {
            SyncAction::Install => "clone",
            SyncAction::Pull => "pull",
            SyncAction::Push => "push",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncAction::Install => "install",
            SyncAction::Pull => "pull",
            SyncAction::Push => "push",
        };
        f.write_str(name)
    }
}

/// How queued archives become local archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStrategy {
    /// Only archives already installed are processed.
    Local,
    /// Archives that are not installed are cloned from their instance.
    Remote,
}

/// Whether manifest dependencies are added to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyPolicy {
    Skip,
    Follow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub strategy: ResolutionStrategy,
    pub dependencies: DependencyPolicy,
    /// Install or update generated branches of every processed archive.
    pub generated_branches: bool,
    /// Ask before doing anything.
    pub confirm: bool,
}

impl SyncOptions {
    /// The usual options for `action`.
    pub fn for_action(action: SyncAction) -> Self {
        match action {
            SyncAction::Install => Self {
                strategy: ResolutionStrategy::Remote,
                dependencies: DependencyPolicy::Follow,
                generated_branches: true,
                confirm: false,
            },
            SyncAction::Pull | SyncAction::Push => Self {
                strategy: ResolutionStrategy::Local,
                dependencies: DependencyPolicy::Skip,
                generated_branches: false,
                confirm: false,
            },
        }
    }
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The archives the run was asked for.
    pub requested: Vec<Archive>,
    /// Every processed archive, in visitation order.
    pub touched: Vec<LocalArchive>,
    /// Archives cloned during the run.
    pub cloned: Vec<Archive>,
    /// Archives that were already installed and only rescanned.
    pub rescanned: Vec<Archive>,
    /// False when any archive failed at any stage.
    pub success: bool,
}

impl SyncReport {
    fn new(requested: &[Archive]) -> Self {
        Self {
            requested: requested.to_vec(),
            touched: Vec::new(),
            cloned: Vec::new(),
            rescanned: Vec::new(),
            success: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    /// The request was empty.
    NothingToDo,
    /// The operator declined the confirmation prompt.
    Aborted,
}

impl SyncOutcome {
    /// The processed archives; empty unless the run completed.
    pub fn touched(&self) -> &[LocalArchive] {
        match self {
            SyncOutcome::Completed(report) => &report.touched,
            _ => &[],
        }
    }

    /// Whether the run finished without any failure. Runs that did nothing
    /// count as successful.
    pub fn is_success(&self) -> bool {
        match self {
            SyncOutcome::Completed(report) => report.success,
            _ => true,
        }
    }
}

/// Asks the operator whether a run may proceed.
pub trait Confirmation {
    fn confirm(&self, prompt: &str, archives: &[Archive]) -> Result<bool>;
}

/// Terminal confirmation prompt. Without a terminal attached the answer is
/// always no.
pub struct DialoguerConfirm;

impl Confirmation for DialoguerConfirm {
    fn confirm(&self, prompt: &str, archives: &[Archive]) -> Result<bool> {
        if !console::user_attended() {
            warn!("Confirmation required but no terminal is attached");
            return Ok(false);
        }

        let term = console::Term::stderr();
        for archive in archives {
            term.write_line(&format!("  {}", archive.qualified()))?;
        }

        let theme = ColorfulTheme::default();
        let answer = Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(answer)
    }
}

/// Manages the generated-content branches of an archive.
pub trait GeneratedBranches {
    /// Install every declared branch that is missing and, when `pull` is set,
    /// update the ones already present. Returns `(branch, success)` pairs.
    fn install_all(&self, archive: &LocalArchive, pull: bool) -> Vec<(String, bool)>;
}

/// Generated branches as single-branch clones of the archive's origin, placed
/// inside the archive's working tree.
pub struct GitGeneratedBranches {
    vcs: Arc<dyn VersionControl>,
}

impl GitGeneratedBranches {
    pub fn new(vcs: Arc<dyn VersionControl>) -> Self {
        Self { vcs }
    }
}

impl GeneratedBranches for GitGeneratedBranches {
    fn install_all(&self, archive: &LocalArchive, pull: bool) -> Vec<(String, bool)> {
        let branches = match Manifest::read(archive.path()) {
            Ok(manifest) => manifest.generated_branches(),
            Err(Error::NoManifestFile { .. }) => return Vec::new(),
            Err(e) => {
                warn!("{}: branches: {}", archive.archive().qualified(), e);
                return Vec::new();
            }
        };
        if branches.is_empty() {
            return Vec::new();
        }

        let origin = match self.vcs.remote_url(archive.path()) {
            Ok(origin) => origin,
            Err(e) => {
                warn!("{}: branches: {}", archive.archive().qualified(), e);
                return branches.into_iter().map(|b| (b.name, false)).collect();
            }
        };

        branches
            .into_iter()
            .filter_map(|branch| match branch.install_dir(archive.path()) {
                Some(dest) => Some((branch, dest)),
                None => {
                    warn!(
                        "{}: branches: skipping {}, path '{}' leaves the archive",
                        archive.archive().qualified(),
                        branch.name,
                        branch.path
                    );
                    None
                }
            })
            .map(|(branch, dest)| {
                let result = if self.vcs.exists_local(&dest) {
                    if pull {
                        self.vcs.pull(&dest)
                    } else {
                        Ok(())
                    }
                } else {
                    self.vcs.clone_repo(
                        &dest,
                        &origin,
                        &["--branch", &branch.name, "--single-branch"],
                    )
                };
                if let Err(e) = &result {
                    debug!("{}: branch {}: {}", archive.archive().qualified(), branch.name, e);
                }
                (branch.name, result.is_ok())
            })
            .collect()
    }
}

/// Runs install, pull and push over a [`HubManager`].
pub struct Orchestrator<'a> {
    hub: &'a HubManager,
    vcs: &'a dyn VersionControl,
    branches: &'a dyn GeneratedBranches,
    confirmation: &'a dyn Confirmation,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        hub: &'a HubManager,
        vcs: &'a dyn VersionControl,
        branches: &'a dyn GeneratedBranches,
        confirmation: &'a dyn Confirmation,
    ) -> Self {
        Self {
            hub,
            vcs,
            branches,
            confirmation,
        }
    }

    pub fn install(&self, archives: &[Archive], options: &SyncOptions) -> Result<SyncOutcome> {
        self.run(SyncAction::Install, archives, options)
    }

    pub fn pull(&self, archives: &[Archive], options: &SyncOptions) -> Result<SyncOutcome> {
        self.run(SyncAction::Pull, archives, options)
    }

    pub fn push(&self, archives: &[Archive], options: &SyncOptions) -> Result<SyncOutcome> {
        self.run(SyncAction::Push, archives, options)
    }

    /// Process `requested` and everything reachable from it under `options`.
    ///
    /// Only a failing confirmation prompt is returned as an error; per-archive
    /// failures are folded into [`SyncReport::success`].
    pub fn run(
        &self,
        action: SyncAction,
        requested: &[Archive],
        options: &SyncOptions,
    ) -> Result<SyncOutcome> {
        if requested.is_empty() {
            info!("{}: nothing to do", action);
            return Ok(SyncOutcome::NothingToDo);
        }

        if options.confirm {
            let prompt = format!("{} {} archive(s)?", action, requested.len());
            if !self.confirmation.confirm(&prompt, requested)? {
                info!("{}: aborted by user", action);
                return Ok(SyncOutcome::Aborted);
            }
        }

        let mut report = SyncReport::new(requested);
        let mut queue: VecDeque<Archive> = requested.iter().cloned().collect();
        let mut visited: HashSet<Archive> = HashSet::new();

        while let Some(archive) = queue.pop_front() {
            if !visited.insert(archive.clone()) {
                debug!("{}: already processed", archive.qualified());
                continue;
            }

            let local = match self.resolve(&archive, options.strategy, &mut report) {
                Ok(local) => local,
                Err(e) => {
                    error!("{}: resolve: {}", archive.qualified(), e);
                    report.success = false;
                    continue;
                }
            };

            if let Err(e) = self.primary(action, &local) {
                error!("{}: {}: {}", archive.qualified(), action.stage(), e);
                report.success = false;
            }

            if options.generated_branches {
                let pull = action == SyncAction::Pull;
                for (branch, ok) in self.branches.install_all(&local, pull) {
                    if ok {
                        info!("{}: branches: {} ok", archive.qualified(), branch);
                    } else {
                        error!("{}: branches: {} failed", archive.qualified(), branch);
                        report.success = false;
                    }
                }
            }

            if options.dependencies == DependencyPolicy::Follow {
                match dependencies_of(&local) {
                    Ok(deps) => queue.extend(deps.into_iter().filter(|d| !visited.contains(d))),
                    Err(e) => {
                        error!("{}: manifest: {}", archive.qualified(), e);
                        report.success = false;
                    }
                }
            }

            report.touched.push(local);
        }

        info!(
            "{}: {} archive(s) processed, {} cloned",
            action,
            report.touched.len(),
            report.cloned.len()
        );
        Ok(SyncOutcome::Completed(report))
    }

    fn resolve(
        &self,
        archive: &Archive,
        strategy: ResolutionStrategy,
        report: &mut SyncReport,
    ) -> Result<LocalArchive> {
        match self.hub.local_archive(archive) {
            Ok(local) => {
                if strategy == ResolutionStrategy::Remote {
                    report.rescanned.push(archive.clone());
                }
                Ok(local)
            }
            Err(Error::NotLocal { .. }) if strategy == ResolutionStrategy::Remote => {
                let remote = self.hub.remote_archive(archive)?;
                let dest = self.hub.install_path(archive)?;
                info!("{}: clone: {}", archive.qualified(), remote.url());
                self.vcs.clone_repo(&dest, remote.url(), &[])?;
                self.hub.invalidate_local(archive);
                let local = self.hub.local_archive(archive)?;
                report.cloned.push(archive.clone());
                Ok(local)
            }
            Err(e) => Err(e),
        }
    }

    fn primary(&self, action: SyncAction, local: &LocalArchive) -> Result<()> {
        match action {
            // Cloning happened during resolution.
            SyncAction::Install => Ok(()),
            SyncAction::Pull => {
                info!("{}: pull", local.archive().qualified());
                self.vcs.pull(local.path())
            }
            SyncAction::Push => {
                info!("{}: push", local.archive().qualified());
                self.vcs.push(local.path())
            }
        }
    }
}

/// Dependencies declared by an installed archive, on the same instance.
fn dependencies_of(local: &LocalArchive) -> Result<Vec<Archive>> {
    let manifest = match Manifest::read(local.path()) {
        Ok(manifest) => manifest,
        Err(Error::NoManifestFile { .. }) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let instance = local.archive().instance();
    Ok(manifest
        .dependencies()?
        .iter()
        .map(|dep| Archive::from_repo(instance, dep))
        .collect())
}

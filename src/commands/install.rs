//! # Install Command Implementation
//!
//! This module implements the `install` subcommand, which clones the selected
//! archives when they are not installed yet, then follows their manifest
//! dependencies and installs those too.
//!
//! ## Functionality
//!
//! - **Remote Resolution**: Specifications are matched against the hosting instances
//! - **Dependency Closure**: Dependencies are installed breadth-first, each archive once
//! - **Generated Branches**: Declared generated branches are cloned into each archive
//! - **Summary Tree**: The requested archives are shown with their dependencies afterwards

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;

use archive_hub::archive::Archive;
use archive_hub::deps::{build_dependency_tree, render_tree, sort_tree, summarize};
use archive_hub::hub::HubManager;
use archive_hub::sync::{
    DependencyPolicy, DialoguerConfirm, GitGeneratedBranches, Orchestrator, SyncAction,
    SyncOptions, SyncOutcome,
};

use super::SelectionArgs;

/// Install archives and their dependencies
#[derive(Args, Debug)]
pub struct InstallArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Do not install dependencies.
    #[arg(long)]
    pub no_deps: bool,

    /// Do not install generated branches.
    #[arg(long)]
    pub no_branches: bool,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `install` command.
pub fn execute(args: InstallArgs, config: &Path) -> Result<()> {
    if args.selection.specs.is_empty() {
        return Err(anyhow!("Nothing to install: give at least one archive specification"));
    }

    let (hub, vcs) = super::open_hub(config)?;
    let requested = super::select_remote(&hub, &args.selection)?;

    let options = SyncOptions {
        dependencies: if args.no_deps {
            DependencyPolicy::Skip
        } else {
            DependencyPolicy::Follow
        },
        generated_branches: !args.no_branches,
        confirm: !args.yes,
        ..SyncOptions::for_action(SyncAction::Install)
    };

    let branches = GitGeneratedBranches::new(vcs.clone());
    let orchestrator = Orchestrator::new(&hub, vcs.as_ref(), &branches, &DialoguerConfirm);
    let outcome = orchestrator
        .install(&requested, &options)
        .map_err(|e| anyhow!("Install failed: {}", e))?;

    if let SyncOutcome::Completed(report) = &outcome {
        if !report.cloned.is_empty() {
            println!("✅ Cloned {} archive(s)", report.cloned.len());
        }
        print_trees(&hub, &report.requested)?;
    }

    super::finish(SyncAction::Install, &outcome)
}

/// Show each requested archive with its dependencies, the requested ones
/// emphasised.
fn print_trees(hub: &HubManager, requested: &[Archive]) -> Result<()> {
    let highlight: HashSet<Archive> = requested.iter().cloned().collect();
    for archive in requested {
        let tree = summarize(sort_tree(build_dependency_tree(hub, archive, true)));
        let rendered = render_tree(&tree, &highlight)
            .map_err(|e| anyhow!("Failed to display tree: {}", e))?;
        print!("{}", rendered);
    }
    Ok(())
}

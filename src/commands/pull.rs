//! # Pull Command Implementation
//!
//! This module implements the `pull` subcommand, which fetches and merges
//! upstream changes into installed archives. Dependencies and generated
//! branches are only updated when asked for.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;

use archive_hub::sync::{
    DependencyPolicy, DialoguerConfirm, GitGeneratedBranches, Orchestrator, SyncAction,
    SyncOptions,
};

use super::SelectionArgs;

/// Update installed archives
#[derive(Args, Debug)]
pub struct PullArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Also update the installed dependencies of every selected archive.
    #[arg(long)]
    pub deps: bool,

    /// Also install or update generated branches.
    #[arg(long)]
    pub branches: bool,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `pull` command.
///
/// Without specifications, every installed archive is updated.
pub fn execute(args: PullArgs, config: &Path) -> Result<()> {
    let (hub, vcs) = super::open_hub(config)?;
    let archives = super::select_local(&hub, &args.selection)?;

    let options = SyncOptions {
        dependencies: if args.deps {
            DependencyPolicy::Follow
        } else {
            DependencyPolicy::Skip
        },
        generated_branches: args.branches,
        confirm: !args.yes && archives.len() > 1,
        ..SyncOptions::for_action(SyncAction::Pull)
    };

    let branches = GitGeneratedBranches::new(vcs.clone());
    let orchestrator = Orchestrator::new(&hub, vcs.as_ref(), &branches, &DialoguerConfirm);
    let outcome = orchestrator
        .pull(&archives, &options)
        .map_err(|e| anyhow!("Pull failed: {}", e))?;

    super::finish(SyncAction::Pull, &outcome)
}

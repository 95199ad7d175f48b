//! # Push Command Implementation
//!
//! This module implements the `push` subcommand, which pushes local commits
//! of installed archives to their origin.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;

use archive_hub::sync::{
    DependencyPolicy, DialoguerConfirm, GitGeneratedBranches, Orchestrator, SyncAction,
    SyncOptions,
};

use super::SelectionArgs;

/// Push installed archives
#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Also push the installed dependencies of every selected archive.
    #[arg(long)]
    pub deps: bool,

    /// Do not ask for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `push` command.
pub fn execute(args: PushArgs, config: &Path) -> Result<()> {
    let (hub, vcs) = super::open_hub(config)?;
    let archives = super::select_local(&hub, &args.selection)?;

    let options = SyncOptions {
        dependencies: if args.deps {
            DependencyPolicy::Follow
        } else {
            DependencyPolicy::Skip
        },
        confirm: !args.yes,
        ..SyncOptions::for_action(SyncAction::Push)
    };

    let branches = GitGeneratedBranches::new(vcs.clone());
    let orchestrator = Orchestrator::new(&hub, vcs.as_ref(), &branches, &DialoguerConfirm);
    let outcome = orchestrator
        .push(&archives, &options)
        .map_err(|e| anyhow!("Push failed: {}", e))?;

    super::finish(SyncAction::Push, &outcome)
}

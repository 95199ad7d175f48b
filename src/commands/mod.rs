//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the `archive-hub`
//! command-line tool. Each subcommand is defined in its own file to keep the
//! logic separated and maintainable.
//!
//! ## Structure
//!
//! Each command module typically contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic.
//!
//! The helpers below load the configuration, build the instance registry, and
//! turn command-line specifications into archives, so that every command
//! resolves archives the same way.

pub mod completions;
pub mod depend;
pub mod deps;
pub mod install;
pub mod ls;
pub mod pull;
pub mod push;

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::Args;

use archive_hub::archive::Archive;
use archive_hub::config::Config;
use archive_hub::hub::{build_registry, HubManager};
use archive_hub::sync::{SyncAction, SyncOutcome};
use archive_hub::vcs::{SystemGit, VersionControl};

/// Archive selection shared by the commands that operate on many archives
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Archive specifications: `group/name`, a glob such as `group/*`, a bare
    /// group name, or a path inside an installed archive.
    #[arg(value_name = "SPEC")]
    pub specs: Vec<String>,

    /// Match specifications against names inside this group first.
    #[arg(short, long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Only consult this instance (its name, host name, or remote URL).
    #[arg(short, long, value_name = "INSTANCE")]
    pub instance: Option<String>,
}

/// Load the configuration and build the instance registry.
pub fn open_hub(config_path: &Path) -> Result<(HubManager, Arc<dyn VersionControl>)> {
    let config = Config::from_file(config_path).map_err(|e| {
        anyhow!(
            "Failed to load config from {}: {}",
            config_path.display(),
            e
        )
    })?;
    let vcs: Arc<dyn VersionControl> = Arc::new(SystemGit);
    let hub = build_registry(&config, vcs.clone())
        .map_err(|e| anyhow!("Failed to set up instances: {}", e))?;
    Ok((hub, vcs))
}

/// Replace specifications that name an existing path inside an installed
/// archive by that archive's `group/name`.
pub fn normalize_specs(hub: &HubManager, specs: &[String]) -> Vec<String> {
    specs
        .iter()
        .map(|spec| {
            let path = Path::new(spec);
            if !path.exists() {
                return spec.clone();
            }
            let archive = path
                .canonicalize()
                .ok()
                .and_then(|path| hub.archive_at_path(&path));
            match archive {
                Some(archive) => {
                    log::debug!("{} refers to {}", spec, archive.qualified());
                    archive.repo_name().to_string()
                }
                None => spec.clone(),
            }
        })
        .collect()
}

/// Resolve the selection to installed archives.
pub fn select_local(hub: &HubManager, selection: &SelectionArgs) -> Result<Vec<Archive>> {
    let specs = normalize_specs(hub, &selection.specs);
    let archives = hub
        .resolve_local(&specs, selection.group.as_deref(), selection.instance.as_deref())
        .map_err(|e| anyhow!("Failed to resolve installed archives: {}", e))?;
    Ok(archives.into_iter().map(|a| a.archive().clone()).collect())
}

/// Resolve the selection to archives available on their hosting instances.
pub fn select_remote(hub: &HubManager, selection: &SelectionArgs) -> Result<Vec<Archive>> {
    let specs = normalize_specs(hub, &selection.specs);
    let archives = hub
        .resolve_remote(&specs, selection.group.as_deref(), selection.instance.as_deref())
        .map_err(|e| anyhow!("Failed to resolve remote archives: {}", e))?;
    Ok(archives.into_iter().map(|a| a.archive().clone()).collect())
}

/// Report the outcome of a synchronization run and fail when any archive
/// failed.
pub fn finish(action: SyncAction, outcome: &SyncOutcome) -> Result<()> {
    match outcome {
        SyncOutcome::NothingToDo => println!("Nothing to {}.", action),
        SyncOutcome::Aborted => println!("Aborted, nothing was changed."),
        SyncOutcome::Completed(report) => {
            println!("{} archive(s) processed.", report.touched.len());
            if !report.success {
                bail!("{} failed for some archives, see the log above", action);
            }
        }
    }
    Ok(())
}

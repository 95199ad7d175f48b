//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists the archives that
//! match a set of specifications, either among the installed archives or on
//! the hosting instances.
//!
//! ## Functionality
//!
//! - **Local Listing**: Installed archives with their working tree paths
//! - **Remote Listing**: Archives known to the hosting instances (`--remote`)
//! - **Scoping**: `--group` and `--instance` narrow the search
//! - **Machine Output**: `--json` prints one array of entries for scripts
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::path::Path;

use anyhow::{anyhow, Result};
use clap::Args;
use console::style;
use serde::Serialize;

use super::SelectionArgs;
use archive_hub::archive::Archive;

/// List archives
#[derive(Args, Debug)]
pub struct LsArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// List archives on the hosting instances instead of installed ones.
    #[arg(short, long)]
    pub remote: bool,

    /// Show only the total count of archives.
    #[arg(long, conflicts_with = "json")]
    pub count: bool,

    /// Print the archives as a JSON array.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Debug, PartialEq)]
struct Entry {
    instance: String,
    group: String,
    name: String,
    location: String,
}

impl Entry {
    fn new(archive: &Archive, location: String) -> Self {
        Self {
            instance: archive.instance().to_string(),
            group: archive.group().to_string(),
            name: archive.name().to_string(),
            location,
        }
    }
}

fn to_json(entries: &[Entry]) -> Result<String> {
    serde_json::to_string_pretty(entries).map_err(|e| anyhow!("Failed to serialize listing: {}", e))
}

/// Execute the `ls` command.
///
/// Without specifications, every archive is listed.
pub fn execute(args: LsArgs, config: &Path) -> Result<()> {
    let (hub, _vcs) = super::open_hub(config)?;
    let specs = super::normalize_specs(&hub, &args.selection.specs);
    let group = args.selection.group.as_deref();
    let instance = args.selection.instance.as_deref();

    let entries: Vec<Entry> = if args.remote {
        hub.resolve_remote(&specs, group, instance)
            .map_err(|e| anyhow!("Failed to list remote archives: {}", e))?
            .iter()
            .map(|a| Entry::new(a.archive(), a.url().to_string()))
            .collect()
    } else {
        hub.resolve_local(&specs, group, instance)
            .map_err(|e| anyhow!("Failed to list installed archives: {}", e))?
            .iter()
            .map(|a| Entry::new(a.archive(), a.path().display().to_string()))
            .collect()
    };

    if args.count {
        println!("{}", entries.len());
        return Ok(());
    }

    if args.json {
        println!("{}", to_json(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No archives match.");
        return Ok(());
    }

    let names: Vec<String> = entries
        .iter()
        .map(|e| format!("{}:{}/{}", e.instance, e.group, e.name))
        .collect();
    let width = names.iter().map(String::len).max().unwrap_or(0);
    for (name, entry) in names.iter().zip(&entries) {
        println!("{:width$}  {}", name, style(&entry.location).dim(), width = width);
    }

    Ok(())
}

//! # Deps Command Implementation
//!
//! This module implements the `deps` subcommand, which displays the
//! dependency tree of an archive in a hierarchical format.
//!
//! ## Functionality
//!
//! - **Shallow Trees** (default): each archive is expanded once; later
//!   occurrences are marked `[see above]`
//! - **Deep Trees** (`--deep`): every branch is expanded until a cycle
//! - **Markers**: `[missing]` for archives that are not installed, `[circular]`
//!   for archives that depend on one of their ancestors
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, bail, Result};
use clap::Args;

use archive_hub::archive::Archive;
use archive_hub::deps::{build_dependency_tree, render_tree, sort_tree, summarize};

/// Show the dependency tree of an archive
#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Archive specification, or a path inside an installed archive.
    #[arg(value_name = "SPEC", default_value = ".")]
    pub spec: String,

    /// Expand every branch fully instead of each archive once.
    #[arg(long)]
    pub deep: bool,

    /// Keep dependencies in manifest order.
    #[arg(long)]
    pub no_sort: bool,

    /// Do not merge adjacent archives with the same marker.
    #[arg(long)]
    pub no_summarize: bool,

    /// Only consult this instance.
    #[arg(short, long, value_name = "INSTANCE")]
    pub instance: Option<String>,
}

/// Execute the `deps` command.
pub fn execute(args: DepsArgs, config: &Path) -> Result<()> {
    let (hub, _vcs) = super::open_hub(config)?;
    let specs = super::normalize_specs(&hub, std::slice::from_ref(&args.spec));
    let instance = args.instance.as_deref();

    let mut roots: Vec<Archive> = hub
        .resolve_local(&specs, None, instance)
        .map_err(|e| anyhow!("Failed to resolve {}: {}", args.spec, e))?
        .into_iter()
        .map(|a| a.archive().clone())
        .collect();
    if roots.is_empty() {
        // Not installed: the tree is a single missing node, which is still
        // worth showing when the archive exists remotely.
        roots = hub
            .resolve_remote(&specs, None, instance)
            .map_err(|e| anyhow!("Failed to resolve {}: {}", args.spec, e))?
            .into_iter()
            .map(|a| a.archive().clone())
            .collect();
    }
    if roots.is_empty() {
        bail!("No archive matches '{}'", args.spec);
    }

    let highlight: HashSet<Archive> = roots.iter().cloned().collect();
    for root in &roots {
        let mut tree = build_dependency_tree(&hub, root, !args.deep);
        if !args.no_sort {
            tree = sort_tree(tree);
        }
        if !args.no_summarize {
            tree = summarize(tree);
        }
        let rendered =
            render_tree(&tree, &highlight).map_err(|e| anyhow!("Failed to display tree: {}", e))?;
        print!("{}", rendered);
    }

    Ok(())
}

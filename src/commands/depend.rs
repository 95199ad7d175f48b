//! # Depend Command Implementation
//!
//! This module implements the `depend` subcommand, which adds dependencies to
//! the manifest of an installed archive. Existing entries and every other
//! manifest line are kept as they are; a manifest is created when the archive
//! has none.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use clap::Args;

use archive_hub::archive::RepoName;
use archive_hub::error::Error;
use archive_hub::manifest::{parse_dependencies, Manifest};

/// Add dependencies to an archive's manifest
#[derive(Args, Debug)]
pub struct DependArgs {
    /// The installed archive to modify (`group/name` or a path inside it).
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// Dependencies to add, as `group/name`.
    #[arg(value_name = "DEP", required = true)]
    pub dependencies: Vec<String>,

    /// Only consult this instance.
    #[arg(short, long, value_name = "INSTANCE")]
    pub instance: Option<String>,
}

/// Execute the `depend` command.
pub fn execute(args: DependArgs, config: &Path) -> Result<()> {
    let (hub, _vcs) = super::open_hub(config)?;
    let specs = super::normalize_specs(&hub, std::slice::from_ref(&args.archive));

    let Some(spec) = specs.first().and_then(|s| RepoName::parse(s)) else {
        bail!("'{}' is not of the form group/name", args.archive);
    };
    let locals = hub
        .resolve_local(&[spec.to_string()], None, args.instance.as_deref())
        .map_err(|e| anyhow!("Failed to resolve {}: {}", args.archive, e))?;
    let local = match locals.as_slice() {
        [local] => local,
        [] => bail!("{} is not installed", spec),
        _ => bail!("{} is installed on several instances, pick one with --instance", spec),
    };

    let added = parse_dependencies(&args.dependencies.join(","))
        .map_err(|e| anyhow!("Invalid dependency: {}", e))?;

    let mut manifest = match Manifest::read(local.path()) {
        Ok(manifest) => manifest,
        Err(Error::NoManifestFile { .. }) => Manifest::new(),
        Err(e) => bail!("Failed to read manifest of {}: {}", spec, e),
    };
    let mut dependencies = manifest
        .dependencies()
        .map_err(|e| anyhow!("Failed to read dependencies of {}: {}", spec, e))?;

    let mut new = 0;
    for dep in added {
        if dep == spec {
            log::warn!("{} cannot depend on itself, skipped", spec);
        } else if !dependencies.contains(&dep) {
            dependencies.push(dep);
            new += 1;
        }
    }

    if new == 0 {
        println!("Nothing to add, {} already lists every dependency.", spec);
        return Ok(());
    }

    manifest.set_dependencies(&dependencies);
    manifest
        .write(local.path())
        .map_err(|e| anyhow!("Failed to write manifest of {}: {}", spec, e))?;
    println!("✅ Added {} dependency(ies) to {}", new, spec);

    Ok(())
}

//! # Archive Hub Library
//!
//! This library manages a collection of content archives: versioned
//! repositories of interdependent documents hosted on one or more instances,
//! each of which pairs a local data root with a remote hosting service. It is
//! designed to be used by the `archive-hub` command-line tool, but every
//! operation the tool performs is available here.
//!
//! ## Quick Example
//!
//! ```
//! use archive_hub::archive::Archive;
//! use archive_hub::deps::{build_tree, summarize, sort_tree, Expansion, NodeKind};
//! use archive_hub::manifest::Manifest;
//!
//! // Dependencies are declared in the archive manifest
//! let manifest = Manifest::parse("dependencies: smglom/sets, smglom/logic\n");
//! let deps = manifest.dependencies().unwrap();
//! assert_eq!(deps.len(), 2);
//!
//! // Build a dependency tree from any lookup function
//! let root = Archive::new("mathhub", "smglom", "calculus");
//! let tree = build_tree(&root, Expansion::Shallow, |archive| {
//!     if archive == &root {
//!         Some(deps.iter().map(|d| Archive::from_repo("mathhub", d)).collect())
//!     } else {
//!         None
//!     }
//! });
//! let tree = summarize(sort_tree(tree));
//! assert_eq!(tree.children().len(), 1);
//! assert_eq!(tree.children()[0].kind(), NodeKind::Missing);
//! ```
//!
//! ## Core Concepts
//!
//! - **Archives (`archive`)**: the `(instance, group, name)` identity and its
//!   local and remote capability views.
//! - **Resolvers (`resolver`)**: answer "which archives match these specs" for
//!   the filesystem (`LocalResolver`) and for a hosting service
//!   (`RemoteResolver`).
//! - **Hub (`hub`)**: the registry of instances built from configuration,
//!   routing queries to one instance or aggregating over all of them.
//! - **Dependency trees (`deps`)**: shallow and deep expansion of an archive's
//!   transitive dependencies, with missing and circular nodes tagged.
//! - **Synchronization (`sync`)**: the install, pull and push orchestrators.
//! - **Manifests (`manifest`)**: the per-archive metadata file.
//! - **Version control (`vcs`, `git`)**: the narrow interface through which
//!   all repository side effects happen.

pub mod archive;
pub mod config;
pub mod defaults;
pub mod deps;
pub mod error;
pub mod git;
pub mod hub;
pub mod manifest;
pub mod resolver;
pub mod sync;
pub mod vcs;

#[cfg(test)]
mod matching_proptest;

#[cfg(test)]
mod deps_proptest;

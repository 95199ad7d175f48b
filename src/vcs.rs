//! # Version-Control Collaborator
//!
//! Every side effect on a working tree goes through the `VersionControl`
//! trait. The resolvers use it for existence checks and the sync
//! orchestrators for cloning, pulling and pushing.
//!
//! `SystemGit` is the production implementation and simply forwards to the
//! functions in [`crate::git`]. Tests substitute recording mocks so that
//! orchestration logic can be exercised without touching a real repository.

use std::path::Path;

use crate::error::Result;

/// Trait for version-control operations - allows mocking in tests
pub trait VersionControl: Send + Sync {
    /// Clone `source` into `dest`. `extra_args` are passed to the clone
    /// command before the source (e.g. `--branch`, `--single-branch`).
    fn clone_repo(&self, dest: &Path, source: &str, extra_args: &[&str]) -> Result<()>;

    /// Fetch and merge upstream changes into the working tree at `dest`.
    fn pull(&self, dest: &Path) -> Result<()>;

    /// Push local commits of the working tree at `dest`.
    fn push(&self, dest: &Path) -> Result<()>;

    /// Whether a repository answers at `remote_url`.
    fn exists(&self, remote_url: &str) -> bool;

    /// Whether `path` is the root of a working tree.
    fn exists_local(&self, path: &Path) -> bool;

    /// Where the working tree at `path` was cloned from.
    fn remote_url(&self, path: &Path) -> Result<String>;
}

/// The default implementation of `VersionControl`, which uses the system's
/// `git` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl VersionControl for SystemGit {
    fn clone_repo(&self, dest: &Path, source: &str, extra_args: &[&str]) -> Result<()> {
        crate::git::clone(dest, source, extra_args)
    }

    fn pull(&self, dest: &Path) -> Result<()> {
        crate::git::pull(dest)
    }

    fn push(&self, dest: &Path) -> Result<()> {
        crate::git::push(dest)
    }

    fn exists(&self, remote_url: &str) -> bool {
        crate::git::remote_exists(remote_url)
    }

    fn exists_local(&self, path: &Path) -> bool {
        crate::git::is_working_tree_root(path)
    }

    fn remote_url(&self, path: &Path) -> Result<String> {
        crate::git::remote_url(path)
    }
}

//! # Archive Identity
//!
//! An archive is a versioned content repository identified by the triple
//! `(instance, group, name)`. Identities are plain values: two archives with
//! equal triples are interchangeable, and nothing about an `Archive` changes
//! after construction.
//!
//! `LocalArchive` and `RemoteArchive` are capability-refined views. They can
//! only be obtained after the corresponding resolver confirmed existence, so
//! holding one is proof that the archive was present when it was created.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::resolver::Resolver;

/// A `(group, name)` pair as known to a single resolver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoName {
    pub group: String,
    pub name: String,
}

impl RepoName {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Parse the literal form `group/name`.
    ///
    /// Returns `None` unless the input has exactly one `/` with non-empty
    /// text on both sides. Neither side may be `.` or `..`, since both end up
    /// as directory names below a data root.
    pub fn parse(spec: &str) -> Option<Self> {
        let (group, name) = spec.split_once('/')?;
        if !is_segment(group) || !is_segment(name) {
            return None;
        }
        Some(Self::new(group, name))
    }
}

fn is_segment(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains(&['/', '\\'][..])
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// The identity of an archive on a specific hosting instance.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Archive {
    instance: String,
    group: String,
    name: String,
}

impl Archive {
    pub fn new(
        instance: impl Into<String>,
        group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            instance: instance.into(),
            group: group.into(),
            name: name.into(),
        }
    }

    /// Build an archive on `instance` from a resolver-level name.
    pub fn from_repo(instance: &str, repo: &RepoName) -> Self {
        Self::new(instance, repo.group.as_str(), repo.name.as_str())
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repo_name(&self) -> RepoName {
        RepoName::new(self.group.as_str(), self.name.as_str())
    }

    /// `instance:group/name`, unambiguous across instances.
    pub fn qualified(&self) -> String {
        format!("{}:{}/{}", self.instance, self.group, self.name)
    }

    /// Whether `resolver` (the local view of this archive's instance) has it.
    pub fn is_local(&self, resolver: &dyn Resolver) -> Result<bool> {
        resolver.repo_exists(&self.repo_name())
    }

    /// Whether `resolver` (the remote view of this archive's instance) has it.
    pub fn is_remote(&self, resolver: &dyn Resolver) -> Result<bool> {
        resolver.repo_exists(&self.repo_name())
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// An archive that is installed as a working tree on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalArchive {
    archive: Archive,
    path: PathBuf,
}

impl LocalArchive {
    /// Cast `archive` to a local archive using the local resolver of its
    /// instance. Fails with `NotLocal` when the resolver does not have it.
    pub fn resolve(archive: Archive, resolver: &dyn Resolver) -> Result<Self> {
        match resolver.get_repo_path(&archive.repo_name()) {
            Ok(path) => Ok(Self {
                archive,
                path: PathBuf::from(path),
            }),
            Err(Error::RepositoryNotFound { .. }) => Err(Error::NotLocal {
                archive: archive.qualified(),
            }),
            Err(e) => Err(e),
        }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Root of the working tree.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for LocalArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.archive.fmt(f)
    }
}

/// An archive that exists on its remote hosting instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteArchive {
    archive: Archive,
    url: String,
}

impl RemoteArchive {
    /// Cast `archive` to a remote archive using the remote resolver of its
    /// instance. Fails with `NotRemote` when the resolver does not have it.
    pub fn resolve(archive: Archive, resolver: &dyn Resolver) -> Result<Self> {
        match resolver.get_repo_path(&archive.repo_name()) {
            Ok(url) => Ok(Self { archive, url }),
            Err(Error::RepositoryNotFound { .. }) => Err(Error::NotRemote {
                archive: archive.qualified(),
            }),
            Err(e) => Err(e),
        }
    }

    /// An archive that matching has already found on the remote, at `url`.
    pub(crate) fn matched(archive: Archive, url: String) -> Self {
        Self { archive, url }
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Clone URL of the archive.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for RemoteArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.archive.fmt(f)
    }
}

//! Filesystem-backed resolver.
//!
//! Archives live at `<data root>/<group>/<name>`. A directory only counts as
//! an archive when it is the root of a working tree, so stray folders and
//! nested checkouts are ignored.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use log::debug;
use walkdir::WalkDir;

use super::{ListingCache, Resolver};
use crate::archive::RepoName;
use crate::error::{Error, Result};
use crate::vcs::VersionControl;

pub struct LocalResolver {
    root: PathBuf,
    vcs: Arc<dyn VersionControl>,
    cache: ListingCache,
}

impl LocalResolver {
    pub fn new(root: impl Into<PathBuf>, vcs: Arc<dyn VersionControl>) -> Self {
        Self {
            root: root.into(),
            vcs,
            cache: ListingCache::new(),
        }
    }

    /// The data root all archives of this instance live under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `repo` is (or would be) installed.
    pub fn path_for(&self, repo: &RepoName) -> PathBuf {
        self.root.join(&repo.group).join(&repo.name)
    }

    /// The archive whose working tree contains `path`, if any.
    pub fn repo_containing(&self, path: &Path) -> Option<RepoName> {
        let relative = path.strip_prefix(&self.root).ok().or_else(|| {
            let root = self.root.canonicalize().ok()?;
            path.strip_prefix(root).ok()
        })?;
        let mut parts = relative.components().filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        });
        let repo = RepoName::new(parts.next()?, parts.next()?);
        self.vcs.exists_local(&self.path_for(&repo)).then_some(repo)
    }

    fn scan(&self) -> Vec<RepoName> {
        if !self.root.is_dir() {
            debug!("Data root {} does not exist", self.root.display());
            return Vec::new();
        }

        WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_dir())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?;
                let mut parts = relative.components();
                let group = parts.next()?.as_os_str().to_str()?;
                let name = parts.next()?.as_os_str().to_str()?;
                Some(RepoName::new(group, name))
            })
            .filter(|repo| self.vcs.exists_local(&self.path_for(repo)))
            .collect()
    }
}

impl Resolver for LocalResolver {
    fn get_all_repos(&self) -> Result<Vec<RepoName>> {
        self.cache.get_or_fetch(|| Ok(self.scan()))
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn repo_exists(&self, repo: &RepoName) -> Result<bool> {
        let path = self.path_for(repo);
        Ok(path.is_dir() && self.vcs.exists_local(&path))
    }

    fn get_repo_path(&self, repo: &RepoName) -> Result<String> {
        if self.repo_exists(repo)? {
            Ok(self.path_for(repo).display().to_string())
        } else {
            Err(Error::RepositoryNotFound {
                group: repo.group.clone(),
                name: repo.name.clone(),
            })
        }
    }
}

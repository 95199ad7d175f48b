//! # Archive Resolution
//!
//! A `Resolver` answers three questions for one view (local or remote) of one
//! hosting instance: which `(group, name)` pairs exist, whether a given pair
//! exists, and where it lives (a filesystem path or a clone URL).
//!
//! On top of that contract, `get_repos_matching` turns a list of user
//! specifications into concrete pairs. Specifications are resolved in tiers,
//! and a specification satisfied by one tier is not considered by later ones:
//!
//! 1. **Exact**: `group/name` that exists is taken as-is.
//! 2. **Base group**: with a base group, specifications are glob-matched
//!    against bare names inside that group.
//! 3. **Global**: specifications are glob-matched against every `group/name`,
//!    both literally and with `/*` appended, so `foo` also selects every
//!    repository in group `foo`.
//!
//! The result is always sorted and free of duplicates.

mod local;
mod remote;

pub use local::LocalResolver;
pub use remote::{GitLabListing, RemoteResolver, RepoListing};

use std::collections::BTreeSet;
use std::sync::Mutex;

use glob::{MatchOptions, Pattern};

use crate::archive::RepoName;
use crate::error::{Error, Result};

/// Capability shared by the local and remote views of an instance.
pub trait Resolver: Send + Sync {
    /// Every known `(group, name)` pair, sorted. May be served from a cache.
    fn get_all_repos(&self) -> Result<Vec<RepoName>>;

    /// Drop any cached listing so the next query observes the current state.
    fn invalidate(&self);

    /// Whether `repo` exists in this view.
    fn repo_exists(&self, repo: &RepoName) -> Result<bool> {
        Ok(self.get_all_repos()?.binary_search(repo).is_ok())
    }

    /// Location of `repo`: a path for local views, a clone URL for remote
    /// ones. Fails with `RepositoryNotFound` when it does not exist.
    fn get_repo_path(&self, repo: &RepoName) -> Result<String>;

    /// Resolve `specs` to concrete pairs, optionally scoped to `base_group`.
    fn get_repos_matching(&self, specs: &[String], base_group: Option<&str>) -> Result<Vec<RepoName>> {
        let universe = self.get_all_repos()?;
        match_repos(&universe, specs, base_group)
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Resolve `specs` against a known `universe` of repositories.
///
/// With no specs, every repository is returned, or only those in
/// `base_group` when one is given. Fails with `GroupNotFound` when a base
/// group is needed for matching but holds no repositories.
pub fn match_repos(
    universe: &[RepoName],
    specs: &[String],
    base_group: Option<&str>,
) -> Result<Vec<RepoName>> {
    let mut matched = BTreeSet::new();
    let remaining = match_exact(specs, &mut matched, |repo| Ok(universe.contains(repo)))?;
    if specs.is_empty() || !remaining.is_empty() {
        match_patterns(universe, &remaining, base_group, specs.is_empty(), &mut matched)?;
    }
    Ok(matched.into_iter().collect())
}

/// Tier 1. Returns the specs that were not satisfied.
pub(crate) fn match_exact<F>(
    specs: &[String],
    matched: &mut BTreeSet<RepoName>,
    mut exists: F,
) -> Result<Vec<String>>
where
    F: FnMut(&RepoName) -> Result<bool>,
{
    let mut remaining = Vec::new();
    for spec in specs {
        match RepoName::parse(spec) {
            Some(repo) if !spec.contains('*') && exists(&repo)? => {
                matched.insert(repo);
            }
            _ => remaining.push(spec.clone()),
        }
    }
    Ok(remaining)
}

/// Tiers 2 and 3, or the "everything" selection when `select_all` is set.
pub(crate) fn match_patterns(
    universe: &[RepoName],
    specs: &[String],
    base_group: Option<&str>,
    select_all: bool,
    matched: &mut BTreeSet<RepoName>,
) -> Result<()> {
    let in_group: Vec<&RepoName> = match base_group {
        Some(group) => {
            let members: Vec<&RepoName> = universe.iter().filter(|r| r.group == group).collect();
            if members.is_empty() {
                return Err(Error::GroupNotFound {
                    group: group.to_string(),
                });
            }
            members
        }
        None => Vec::new(),
    };

    if select_all {
        if base_group.is_some() {
            matched.extend(in_group.into_iter().cloned());
        } else {
            matched.extend(universe.iter().cloned());
        }
        return Ok(());
    }

    let mut unresolved = Vec::new();
    for spec in specs {
        let pattern = Pattern::new(spec)?;
        let hits: Vec<&RepoName> = in_group
            .iter()
            .copied()
            .filter(|repo| pattern.matches_with(&repo.name, MATCH_OPTIONS))
            .collect();
        if hits.is_empty() {
            unresolved.push(spec);
        } else {
            matched.extend(hits.into_iter().cloned());
        }
    }

    for spec in unresolved {
        let literal = Pattern::new(spec)?;
        let nested = Pattern::new(&format!("{}/*", spec))?;
        for repo in universe {
            let full = repo.to_string();
            if literal.matches_with(&full, MATCH_OPTIONS) || nested.matches_with(&full, MATCH_OPTIONS) {
                matched.insert(repo.clone());
            }
        }
    }

    Ok(())
}

/// Process-local cache for a resolver's full listing.
///
/// A failed network fetch is remembered as well, so one run does not pay for
/// an unreachable host more than once. Both are dropped by `invalidate`.
#[derive(Debug, Default)]
pub(crate) struct ListingCache {
    state: Mutex<Option<Cached>>,
}

#[derive(Debug, Clone)]
enum Cached {
    Listing(Vec<RepoName>),
    Unreachable { url: String, message: String },
}

impl ListingCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Return the cached listing, or compute, sort and cache it.
    pub(crate) fn get_or_fetch<F>(&self, fetch: F) -> Result<Vec<RepoName>>
    where
        F: FnOnce() -> Result<Vec<RepoName>>,
    {
        let mut state = self.state.lock().map_err(|_| Error::LockPoisoned {
            context: "resolver listing cache".to_string(),
        })?;
        match state.as_ref() {
            Some(Cached::Listing(repos)) => return Ok(repos.clone()),
            Some(Cached::Unreachable { url, message }) => {
                return Err(Error::Network {
                    url: url.clone(),
                    message: message.clone(),
                })
            }
            None => {}
        }
        match fetch() {
            Ok(mut fetched) => {
                fetched.sort();
                fetched.dedup();
                *state = Some(Cached::Listing(fetched.clone()));
                Ok(fetched)
            }
            Err(Error::Network { url, message }) => {
                *state = Some(Cached::Unreachable {
                    url: url.clone(),
                    message: message.clone(),
                });
                Err(Error::Network { url, message })
            }
            Err(e) => Err(e),
        }
    }

    /// Peek at the cached listing without fetching.
    pub(crate) fn cached(&self) -> Option<Vec<RepoName>> {
        match self.state.lock().ok()?.as_ref()? {
            Cached::Listing(repos) => Some(repos.clone()),
            Cached::Unreachable { .. } => None,
        }
    }

    pub(crate) fn invalidate(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = None;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// In-memory resolver over a fixed set of repositories.
    pub(crate) struct StaticResolver {
        root: String,
        repos: Mutex<Vec<RepoName>>,
    }

    impl StaticResolver {
        pub(crate) fn new(root: &str, repos: &[&str]) -> Self {
            let mut repos: Vec<RepoName> = repos
                .iter()
                .map(|r| RepoName::parse(r).unwrap())
                .collect();
            repos.sort();
            Self {
                root: root.to_string(),
                repos: Mutex::new(repos),
            }
        }
    }

    impl Resolver for StaticResolver {
        fn get_all_repos(&self) -> Result<Vec<RepoName>> {
            Ok(self.repos.lock().unwrap().clone())
        }

        fn invalidate(&self) {}

        fn get_repo_path(&self, repo: &RepoName) -> Result<String> {
            if self.repo_exists(repo)? {
                Ok(format!("{}/{}", self.root, repo))
            } else {
                Err(Error::RepositoryNotFound {
                    group: repo.group.clone(),
                    name: repo.name.clone(),
                })
            }
        }
    }
}

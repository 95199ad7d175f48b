//! Hosting-service-backed resolver.
//!
//! The full listing is fetched page by page until a page comes back shorter
//! than the page size. Listings only show what the hosting service is willing
//! to list publicly, so `repo_exists` falls back to probing the clone URL
//! directly whenever the listing does not settle the question.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use url::Url;

use super::{match_exact, match_patterns, ListingCache, Resolver};
use crate::archive::RepoName;
use crate::error::{Error, Result};
use crate::vcs::VersionControl;

/// One page-oriented listing endpoint of a hosting service.
pub trait RepoListing: Send + Sync {
    /// Fetch page `page` (1-based) of `per_page` entries, as
    /// `namespace/path` strings. Nested namespaces are allowed here and
    /// filtered out by the resolver.
    fn fetch_page(&self, page: usize, per_page: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct GitLabProject {
    path_with_namespace: String,
}

/// Listing backed by the GitLab v4 projects API.
pub struct GitLabListing {
    base: Url,
    token: Option<String>,
    http_client: reqwest::blocking::Client,
}

impl GitLabListing {
    pub fn new(base: &str, token: Option<String>) -> Result<Self> {
        let base = if base.ends_with('/') {
            Url::parse(base)?
        } else {
            Url::parse(&format!("{}/", base))?
        };

        let http_client = reqwest::blocking::Client::builder()
            .user_agent(concat!("archive-hub/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Network {
                url: base.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            base,
            token,
            http_client,
        })
    }

    fn page_url(&self, page: usize, per_page: usize) -> Result<Url> {
        let mut url = self.base.join("api/v4/projects")?;
        url.query_pairs_mut()
            .append_pair("simple", "true")
            .append_pair("order_by", "id")
            .append_pair("sort", "asc")
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

impl RepoListing for GitLabListing {
    fn fetch_page(&self, page: usize, per_page: usize) -> Result<Vec<String>> {
        let url = self.page_url(page, per_page)?;
        let network = |message: String| Error::Network {
            url: url.to_string(),
            message,
        };

        let mut request = self.http_client.get(url.clone());
        if let Some(ref token) = self.token {
            request = request.header("PRIVATE-TOKEN", token);
        }

        let response = request.send().map_err(|e| network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(network(format!(
                "listing returned status {}",
                response.status()
            )));
        }

        let projects: Vec<GitLabProject> = response.json().map_err(|e| network(e.to_string()))?;
        Ok(projects
            .into_iter()
            .map(|project| project.path_with_namespace)
            .collect())
    }
}

pub struct RemoteResolver {
    base_url: String,
    listing: Box<dyn RepoListing>,
    page_size: usize,
    vcs: Arc<dyn VersionControl>,
    cache: ListingCache,
}

impl RemoteResolver {
    pub fn new(
        base_url: &str,
        listing: Box<dyn RepoListing>,
        page_size: usize,
        vcs: Arc<dyn VersionControl>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            listing,
            page_size: page_size.max(1),
            vcs,
            cache: ListingCache::new(),
        }
    }

    /// Base URL of the hosting instance, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The clone URL for `repo`, whether or not it exists.
    pub fn clone_url(&self, repo: &RepoName) -> String {
        format!("{}/{}/{}.git", self.base_url, repo.group, repo.name)
    }

    fn fetch_all(&self) -> Result<Vec<RepoName>> {
        let mut repos = Vec::new();
        let mut page = 1;
        loop {
            let entries = self.listing.fetch_page(page, self.page_size)?;
            let fetched = entries.len();
            repos.extend(entries.iter().filter_map(|entry| RepoName::parse(entry)));
            if fetched < self.page_size {
                break;
            }
            page += 1;
        }
        debug!(
            "Fetched {} repositories from {} in {} page(s)",
            repos.len(),
            self.base_url,
            page
        );
        Ok(repos)
    }
}

impl Resolver for RemoteResolver {
    fn get_all_repos(&self) -> Result<Vec<RepoName>> {
        self.cache.get_or_fetch(|| self.fetch_all())
    }

    fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn repo_exists(&self, repo: &RepoName) -> Result<bool> {
        match self.get_all_repos() {
            Ok(all) if all.binary_search(repo).is_ok() => Ok(true),
            Ok(_) => Ok(self.vcs.exists(&self.clone_url(repo))),
            Err(e) if e.is_inconclusive() => {
                warn!("Listing unavailable, probing {} directly: {}", repo, e);
                Ok(self.vcs.exists(&self.clone_url(repo)))
            }
            Err(e) => Err(e),
        }
    }

    fn get_repo_path(&self, repo: &RepoName) -> Result<String> {
        if self.repo_exists(repo)? {
            Ok(self.clone_url(repo))
        } else {
            Err(Error::RepositoryNotFound {
                group: repo.group.clone(),
                name: repo.name.clone(),
            })
        }
    }

    fn get_repos_matching(&self, specs: &[String], base_group: Option<&str>) -> Result<Vec<RepoName>> {
        let mut matched = BTreeSet::new();
        // Exact specs go through `repo_exists`, so private archives and an
        // unreachable listing do not hide them.
        let remaining = match_exact(specs, &mut matched, |repo| self.repo_exists(repo))?;
        if specs.is_empty() || !remaining.is_empty() {
            let universe = self.get_all_repos()?;
            match_patterns(&universe, &remaining, base_group, specs.is_empty(), &mut matched)?;
        }
        Ok(matched.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{Archive, RemoteArchive};
    use crate::vcs::testing::MockVcs;
    use std::sync::Mutex;

    /// Serves a fixed list of entries in pages and counts requests.
    struct PagedListing {
        entries: Vec<String>,
        requests: Arc<Mutex<Vec<usize>>>,
    }

    impl PagedListing {
        fn new(entries: &[&str]) -> Self {
            Self {
                entries: entries.iter().map(|e| e.to_string()).collect(),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl RepoListing for PagedListing {
        fn fetch_page(&self, page: usize, per_page: usize) -> Result<Vec<String>> {
            self.requests.lock().unwrap().push(page);
            Ok(self
                .entries
                .iter()
                .skip((page - 1) * per_page)
                .take(per_page)
                .cloned()
                .collect())
        }
    }

    struct FailingListing;

    impl RepoListing for FailingListing {
        fn fetch_page(&self, _page: usize, _per_page: usize) -> Result<Vec<String>> {
            Err(Error::Network {
                url: "https://hub.example".to_string(),
                message: "connection refused".to_string(),
            })
        }
    }

    /// Always unreachable, counting the attempts.
    #[derive(Default)]
    struct CountingFailingListing {
        attempts: Arc<Mutex<usize>>,
    }

    impl RepoListing for CountingFailingListing {
        fn fetch_page(&self, page: usize, per_page: usize) -> Result<Vec<String>> {
            *self.attempts.lock().unwrap() += 1;
            FailingListing.fetch_page(page, per_page)
        }
    }

    fn specs(specs: &[&str]) -> Vec<String> {
        specs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pagination_stops_at_short_page() {
        let listing = PagedListing::new(&["a/one", "a/two", "b/three", "b/four", "c/five"]);
        let requests = listing.requests.clone();
        let resolver = RemoteResolver::new(
            "https://hub.example/",
            Box::new(listing),
            2,
            Arc::new(MockVcs::new()),
        );

        let repos = resolver.get_all_repos().unwrap();
        assert_eq!(repos.len(), 5);
        assert_eq!(*requests.lock().unwrap(), vec![1, 2, 3]);

        // Cached: no further requests.
        resolver.get_all_repos().unwrap();
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_exact_page_size_fetches_one_empty_page() {
        let listing = PagedListing::new(&["a/one", "a/two"]);
        let requests = listing.requests.clone();
        let resolver =
            RemoteResolver::new("https://hub.example", Box::new(listing), 2, Arc::new(MockVcs::new()));

        assert_eq!(resolver.get_all_repos().unwrap().len(), 2);
        assert_eq!(*requests.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_nested_namespaces_are_skipped() {
        let listing = PagedListing::new(&["a/one", "a/sub/two"]);
        let resolver =
            RemoteResolver::new("https://hub.example", Box::new(listing), 10, Arc::new(MockVcs::new()));

        let repos = resolver.get_all_repos().unwrap();
        assert_eq!(repos, vec![RepoName::new("a", "one")]);
    }

    #[test]
    fn test_private_repo_found_by_probe() {
        let listing = PagedListing::new(&["a/one"]);
        let vcs = MockVcs::new().with_remote("https://hub.example/secret/repo.git", None);
        let resolver = RemoteResolver::new("https://hub.example", Box::new(listing), 10, Arc::new(vcs));

        let secret = RepoName::new("secret", "repo");
        assert!(resolver.repo_exists(&secret).unwrap());
        assert_eq!(
            resolver.get_repo_path(&secret).unwrap(),
            "https://hub.example/secret/repo.git"
        );
        assert!(!resolver.repo_exists(&RepoName::new("no", "such")).unwrap());
    }

    #[test]
    fn test_listing_failure_is_a_network_error() {
        let resolver = RemoteResolver::new(
            "https://hub.example",
            Box::new(FailingListing),
            10,
            Arc::new(MockVcs::new()),
        );
        assert!(matches!(resolver.get_all_repos(), Err(Error::Network { .. })));
    }

    #[test]
    fn test_matching_with_failing_listing() {
        let vcs = MockVcs::new().with_remote("https://hub.example/a/one.git", None);
        let resolver =
            RemoteResolver::new("https://hub.example", Box::new(FailingListing), 10, Arc::new(vcs));

        // Exact specs are still answered by the probe.
        let exact = resolver.get_repos_matching(&specs(&["a/one"]), None).unwrap();
        assert_eq!(exact, vec![RepoName::new("a", "one")]);

        // Patterns need the listing and must not silently come back empty.
        let pattern = resolver.get_repos_matching(&specs(&["a/*"]), None);
        assert!(matches!(pattern, Err(Error::Network { .. })));
    }

    #[test]
    fn test_gitlab_page_url() {
        let listing = GitLabListing::new("https://gl.example.org", None).unwrap();
        let url = listing.page_url(3, 50).unwrap();
        assert_eq!(url.path(), "/api/v4/projects");
        let query = url.query().unwrap();
        assert!(query.contains("per_page=50"));
        assert!(query.contains("page=3"));
    }

    #[test]
    fn test_unreachable_listing_is_fetched_once_per_run() {
        let listing = CountingFailingListing::default();
        let attempts = listing.attempts.clone();
        let vcs = MockVcs::new()
            .with_remote("https://hub.example/a/one.git", None)
            .with_remote("https://hub.example/a/two.git", None);
        let probes = vcs.probes();
        let resolver = RemoteResolver::new("https://hub.example", Box::new(listing), 10, Arc::new(vcs));

        let one = RemoteArchive::resolve(Archive::new("hub", "a", "one"), &resolver).unwrap();
        assert_eq!(one.url(), "https://hub.example/a/one.git");
        assert_eq!(*attempts.lock().unwrap(), 1);
        assert_eq!(probes.lock().unwrap().len(), 1);

        let two = RemoteArchive::resolve(Archive::new("hub", "a", "two"), &resolver).unwrap();
        assert_eq!(two.url(), "https://hub.example/a/two.git");
        assert_eq!(*attempts.lock().unwrap(), 1);
        assert_eq!(probes.lock().unwrap().len(), 2);

        let missing = RemoteArchive::resolve(Archive::new("hub", "a", "three"), &resolver);
        assert!(matches!(missing, Err(Error::NotRemote { .. })));
        assert_eq!(*attempts.lock().unwrap(), 1);

        resolver.invalidate();
        assert!(resolver.get_all_repos().is_err());
        assert_eq!(*attempts.lock().unwrap(), 2);
    }
}

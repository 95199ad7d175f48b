//! # Hub Manager
//!
//! A hosting *instance* pairs a local view (a data root on disk) with a remote
//! view (a hosting service) under one name. The `HubManager` holds every
//! registered instance and routes resolution requests to them: to one
//! instance when the caller names it, otherwise to all of them with the
//! results aggregated as `(instance, group, name)` archives.
//!
//! The registry is built exactly once, from configuration, by
//! [`build_registry`]. Nothing registers itself.

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::archive::{Archive, LocalArchive, RemoteArchive, RepoName};
use crate::config::{Config, ListingKind};
use crate::error::{Error, Result};
use crate::resolver::{GitLabListing, LocalResolver, RemoteResolver, RepoListing, Resolver};
use crate::vcs::VersionControl;

pub struct Instance {
    name: String,
    hostname: String,
    local: LocalResolver,
    remote: RemoteResolver,
}

impl Instance {
    pub fn new(
        name: impl Into<String>,
        hostname: impl Into<String>,
        local: LocalResolver,
        remote: RemoteResolver,
    ) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
            local,
            remote,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn local(&self) -> &LocalResolver {
        &self.local
    }

    pub fn remote(&self) -> &RemoteResolver {
        &self.remote
    }

    /// Whether `query` refers to this instance: its name, its host name, a
    /// URL on its hosting service, or a path below its data root.
    pub fn can_answer_for(&self, query: &str) -> bool {
        query == self.name
            || query == self.hostname
            || query.starts_with(self.remote.base_url())
            || Path::new(query).starts_with(self.local.root())
    }
}

#[derive(Default)]
pub struct HubManager {
    instances: Vec<Instance>,
}

impl HubManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, instance: Instance) {
        debug!("Registered instance {}", instance.name);
        self.instances.push(instance);
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// The first instance that can answer for `query`.
    pub fn find_instance(&self, query: &str) -> Result<&Instance> {
        self.instances
            .iter()
            .find(|i| i.name == query)
            .or_else(|| self.instances.iter().find(|i| i.can_answer_for(query)))
            .ok_or_else(|| Error::InstanceNotFound {
                name: query.to_string(),
            })
    }

    fn select(&self, instance: Option<&str>) -> Result<Vec<&Instance>> {
        match instance {
            Some(query) => Ok(vec![self.find_instance(query)?]),
            None => Ok(self.instances.iter().collect()),
        }
    }

    /// Resolve `specs` to installed archives.
    pub fn resolve_local(
        &self,
        specs: &[String],
        base_group: Option<&str>,
        instance: Option<&str>,
    ) -> Result<Vec<LocalArchive>> {
        let mut archives = Vec::new();
        for inst in self.select(instance)? {
            for repo in match_scoped(&inst.local, specs, base_group)? {
                let archive = Archive::from_repo(&inst.name, &repo);
                archives.push(LocalArchive::resolve(archive, &inst.local)?);
            }
        }
        archives.sort_by(|a, b| a.archive().cmp(b.archive()));
        Ok(archives)
    }

    /// Resolve `specs` to archives that exist on their hosting service.
    pub fn resolve_remote(
        &self,
        specs: &[String],
        base_group: Option<&str>,
        instance: Option<&str>,
    ) -> Result<Vec<RemoteArchive>> {
        let mut archives = Vec::new();
        for inst in self.select(instance)? {
            for repo in match_scoped(&inst.remote, specs, base_group)? {
                let url = inst.remote.clone_url(&repo);
                archives.push(RemoteArchive::matched(Archive::from_repo(&inst.name, &repo), url));
            }
        }
        archives.sort_by(|a, b| a.archive().cmp(b.archive()));
        Ok(archives)
    }

    fn instance_of(&self, archive: &Archive) -> Result<&Instance> {
        self.instances
            .iter()
            .find(|i| i.name == archive.instance())
            .ok_or_else(|| Error::InstanceNotFound {
                name: archive.instance().to_string(),
            })
    }

    /// Cast `archive` to its local view, failing with `NotLocal`.
    pub fn local_archive(&self, archive: &Archive) -> Result<LocalArchive> {
        let instance = self.instance_of(archive)?;
        LocalArchive::resolve(archive.clone(), &instance.local)
    }

    /// Cast `archive` to its remote view, failing with `NotRemote`.
    pub fn remote_archive(&self, archive: &Archive) -> Result<RemoteArchive> {
        let instance = self.instance_of(archive)?;
        RemoteArchive::resolve(archive.clone(), &instance.remote)
    }

    /// Where `archive` is, or would be, installed.
    pub fn install_path(&self, archive: &Archive) -> Result<std::path::PathBuf> {
        Ok(self.instance_of(archive)?.local.path_for(&archive.repo_name()))
    }

    /// Forget the cached local listing of `archive`'s instance.
    pub fn invalidate_local(&self, archive: &Archive) {
        if let Ok(instance) = self.instance_of(archive) {
            instance.local.invalidate();
        }
    }

    /// The installed archive whose working tree contains `path`.
    pub fn archive_at_path(&self, path: &Path) -> Option<Archive> {
        self.instances.iter().find_map(|inst| {
            inst.local
                .repo_containing(path)
                .map(|repo: RepoName| Archive::from_repo(&inst.name, &repo))
        })
    }
}

/// Match with a base group, retrying unscoped when the group is unknown.
fn match_scoped(
    resolver: &dyn Resolver,
    specs: &[String],
    base_group: Option<&str>,
) -> Result<Vec<RepoName>> {
    match resolver.get_repos_matching(specs, base_group) {
        Err(Error::GroupNotFound { group }) => {
            debug!("Group {} not found, matching without it", group);
            resolver.get_repos_matching(specs, None)
        }
        other => other,
    }
}

/// Build the instance registry from configuration.
pub fn build_registry(config: &Config, vcs: Arc<dyn VersionControl>) -> Result<HubManager> {
    let mut hub = HubManager::new();
    for cfg in &config.instances {
        let listing: Box<dyn RepoListing> = match cfg.listing {
            ListingKind::Gitlab => Box::new(GitLabListing::new(&cfg.remote, cfg.token.clone())?),
        };
        let local = LocalResolver::new(cfg.data_root(), vcs.clone());
        let remote = RemoteResolver::new(&cfg.remote, listing, cfg.page_size, vcs.clone());
        hub.register(Instance::new(cfg.name.as_str(), cfg.hostname()?, local, remote));
    }
    Ok(hub)
}


#[cfg(test)]
mod tests {
    use super::testing::single_instance_hub;
    use super::*;
    use crate::config::InstanceConfig;
    use crate::vcs::testing::MockVcs;
    use std::fs;
    use tempfile::TempDir;

    fn install(root: &Path, repo: &str) {
        fs::create_dir_all(root.join(repo).join(".git")).unwrap();
    }

    fn two_instance_hub(a_root: &Path, b_root: &Path) -> HubManager {
        let vcs: Arc<dyn VersionControl> = Arc::new(MockVcs::new());
        let mut hub = single_instance_hub("a", a_root, &["grp/x", "grp/y"], vcs.clone());
        let b = single_instance_hub("b", b_root, &["grp/x", "other/z"], vcs);
        for instance in b.instances {
            hub.register(instance);
        }
        hub
    }

    fn specs(specs: &[&str]) -> Vec<String> {
        specs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_can_answer_for() {
        let temp_dir = TempDir::new().unwrap();
        let hub = single_instance_hub("a", temp_dir.path(), &[], Arc::new(MockVcs::new()));
        let instance = &hub.instances()[0];

        assert!(instance.can_answer_for("a"));
        assert!(instance.can_answer_for("a.example"));
        assert!(instance.can_answer_for("https://a.example/grp/x"));
        assert!(instance.can_answer_for(&temp_dir.path().join("grp/x").display().to_string()));
        assert!(!instance.can_answer_for("b"));
    }

    #[test]
    fn test_resolve_remote_aggregates_instances() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let hub = two_instance_hub(a.path(), b.path());

        let archives = hub.resolve_remote(&specs(&["grp/x"]), None, None).unwrap();
        let qualified: Vec<String> = archives.iter().map(|r| r.archive().qualified()).collect();
        assert_eq!(qualified, vec!["a:grp/x", "b:grp/x"]);
    }

    #[test]
    fn test_resolve_remote_named_instance() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let hub = two_instance_hub(a.path(), b.path());

        let archives = hub.resolve_remote(&[], None, Some("b.example")).unwrap();
        let qualified: Vec<String> = archives.iter().map(|r| r.archive().qualified()).collect();
        assert_eq!(qualified, vec!["b:grp/x", "b:other/z"]);
    }

    #[test]
    fn test_unknown_instance() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        let hub = two_instance_hub(a.path(), b.path());
        let result = hub.resolve_local(&[], None, Some("nowhere"));
        assert!(matches!(result, Err(Error::InstanceNotFound { .. })));
    }

    #[test]
    fn test_resolve_local_retries_without_unknown_group() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        install(a.path(), "grp/x");
        let hub = two_instance_hub(a.path(), b.path());

        let archives = hub
            .resolve_local(&specs(&["grp/*"]), Some("missing-group"), Some("a"))
            .unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].path(), a.path().join("grp/x"));
    }

    #[test]
    fn test_local_and_remote_casts() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        install(a.path(), "grp/x");
        let hub = two_instance_hub(a.path(), b.path());

        let x = Archive::new("a", "grp", "x");
        let y = Archive::new("a", "grp", "y");
        assert!(hub.local_archive(&x).is_ok());
        assert!(matches!(hub.local_archive(&y), Err(Error::NotLocal { .. })));
        assert_eq!(
            hub.remote_archive(&y).unwrap().url(),
            "https://a.example/grp/y.git"
        );
        assert!(matches!(
            hub.remote_archive(&Archive::new("a", "no", "pe")),
            Err(Error::NotRemote { .. })
        ));
    }

    #[test]
    fn test_archive_at_path() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        install(b.path(), "other/z");
        let hub = two_instance_hub(a.path(), b.path());

        let found = hub.archive_at_path(&b.path().join("other/z/source"));
        assert_eq!(found, Some(Archive::new("b", "other", "z")));
    }

    #[test]
    fn test_build_registry() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            instances: vec![InstanceConfig {
                name: "work".to_string(),
                remote: "https://gitlab.example.org".to_string(),
                data_root: Some(temp_dir.path().to_path_buf()),
                listing: ListingKind::Gitlab,
                page_size: 10,
                token: None,
            }],
        };
        let hub = build_registry(&config, Arc::new(MockVcs::new())).unwrap();
        let instance = hub.find_instance("gitlab.example.org").unwrap();
        assert_eq!(instance.name(), "work");
        assert_eq!(instance.local().root(), temp_dir.path());
    }

    #[test]
    fn test_resolve_remote_probes_private_archive_once() {
        let temp_dir = TempDir::new().unwrap();
        let vcs = MockVcs::new().with_remote("https://a.example/grp/secret.git", None);
        let probes = vcs.probes();
        let hub = single_instance_hub("a", temp_dir.path(), &["grp/x"], Arc::new(vcs));

        let archives = hub.resolve_remote(&specs(&["grp/secret"]), None, None).unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].url(), "https://a.example/grp/secret.git");
        assert_eq!(*probes.lock().unwrap(), vec!["https://a.example/grp/secret.git"]);
    }
}

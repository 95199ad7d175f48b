//! Shared test utilities for integration and E2E tests.
//!
//! This module provides fixtures for both kinds of tests:
//!
//! - [`FakeVcs`] and [`hub_with`] build a [`HubManager`] whose version-control
//!   side effects only touch a temporary directory, for driving the library
//!   directly.
//! - [`HubFixture`] lays out a configuration file and a data root with real
//!   git working trees, for invoking the `archive-hub` binary.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//! ```

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;

use archive_hub::error::{Error, Result};
use archive_hub::hub::{HubManager, Instance};
use archive_hub::resolver::{LocalResolver, RemoteResolver, RepoListing};
use archive_hub::vcs::VersionControl;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_fs::prelude::*;
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    pub use super::{git_available, hub_with, FakeVcs, HubFixture, StaticListing, BASE_URL};
}

/// Remote base URL of the instance built by [`hub_with`].
pub const BASE_URL: &str = "https://hub.example";

/// Clone URL of `repo` on the instance built by [`hub_with`].
pub fn clone_url(repo: &str) -> String {
    format!("{}/{}.git", BASE_URL, repo)
}

/// Version control that works on plain directories: a working tree is any
/// directory with a `.git` subdirectory, and cloning a registered remote
/// creates one with the remote's manifest.
#[derive(Default)]
pub struct FakeVcs {
    remotes: HashMap<String, Option<String>>,
    log: Arc<Mutex<Vec<String>>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `repo` on the remote, with optional manifest contents.
    pub fn with_remote(mut self, repo: &str, manifest: Option<&str>) -> Self {
        self.remotes
            .insert(clone_url(repo), manifest.map(str::to_string));
        self
    }

    /// Every operation so far, as `"<op> <target>"`.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, op: &str, target: &str) {
        self.log.lock().unwrap().push(format!("{} {}", op, target));
    }
}

impl VersionControl for FakeVcs {
    fn clone_repo(&self, dest: &Path, source: &str, _extra_args: &[&str]) -> Result<()> {
        self.record("clone", source);
        let Some(manifest) = self.remotes.get(source) else {
            return Err(Error::GitClone {
                url: source.to_string(),
                message: "not found".to_string(),
            });
        };
        fs::create_dir_all(dest.join(".git"))?;
        if let Some(manifest) = manifest {
            fs::create_dir_all(dest.join("META-INF"))?;
            fs::write(dest.join("META-INF/MANIFEST.MF"), manifest)?;
        }
        Ok(())
    }

    fn pull(&self, dest: &Path) -> Result<()> {
        self.record("pull", &dest.display().to_string());
        Ok(())
    }

    fn push(&self, dest: &Path) -> Result<()> {
        self.record("push", &dest.display().to_string());
        Ok(())
    }

    fn exists(&self, remote_url: &str) -> bool {
        self.remotes.contains_key(remote_url)
    }

    fn exists_local(&self, path: &Path) -> bool {
        path.join(".git").is_dir()
    }

    fn remote_url(&self, path: &Path) -> Result<String> {
        Ok(format!("file://{}", path.display()))
    }
}

/// A listing that serves fixed `group/name` entries.
pub struct StaticListing(pub Vec<String>);

impl RepoListing for StaticListing {
    fn fetch_page(&self, page: usize, per_page: usize) -> Result<Vec<String>> {
        Ok(self
            .0
            .iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .cloned()
            .collect())
    }
}

/// A hub with a single instance `hub` rooted at `root`, whose remote lists
/// `listed` under [`BASE_URL`].
pub fn hub_with(root: &Path, listed: &[&str], vcs: Arc<dyn VersionControl>) -> HubManager {
    let listing = StaticListing(listed.iter().map(|r| r.to_string()).collect());
    let mut hub = HubManager::new();
    hub.register(Instance::new(
        "hub",
        "hub.example",
        LocalResolver::new(root, vcs.clone()),
        RemoteResolver::new(BASE_URL, Box::new(listing), 2, vcs),
    ));
    hub
}

/// Create a plain-directory working tree for [`FakeVcs`].
pub fn install_fake(root: &Path, repo: &str, manifest: Option<&str>) -> PathBuf {
    let dir = root.join(repo);
    fs::create_dir_all(dir.join(".git")).unwrap();
    if let Some(manifest) = manifest {
        fs::create_dir_all(dir.join("META-INF")).unwrap();
        fs::write(dir.join("META-INF/MANIFEST.MF"), manifest).unwrap();
    }
    dir
}

/// Whether a `git` executable is available.
pub fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

/// A temporary configuration plus data root for running the binary.
///
/// The single configured instance `hub` points at an address that refuses
/// connections, so only local operations succeed.
pub struct HubFixture {
    temp_dir: assert_fs::TempDir,
}

impl HubFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        let data_root = temp_dir.path().join("data");
        fs::create_dir_all(&data_root).expect("Failed to create data root");
        temp_dir
            .child("config.toml")
            .write_str(&format!(
                "[[instance]]\nname = \"hub\"\nremote = \"http://127.0.0.1:9\"\ndata_root = \"{}\"\n",
                data_root.display()
            ))
            .expect("Failed to write config file");
        Self { temp_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("config.toml")
    }

    pub fn data_root(&self) -> PathBuf {
        self.temp_dir.path().join("data")
    }

    /// Create `repo` as a real git working tree with one commit, optionally
    /// with a manifest.
    pub fn with_archive(self, repo: &str, manifest: Option<&str>) -> Self {
        let dir = self.data_root().join(repo);
        fs::create_dir_all(&dir).expect("Failed to create archive directory");
        git(&dir, &["init", "--quiet"]);
        if let Some(manifest) = manifest {
            fs::create_dir_all(dir.join("META-INF")).expect("Failed to create META-INF");
            fs::write(dir.join("META-INF/MANIFEST.MF"), manifest).expect("Failed to write manifest");
        } else {
            fs::write(dir.join("README"), repo).expect("Failed to write README");
        }
        git(&dir, &["add", "."]);
        git(&dir, &["commit", "--quiet", "-m", "init"]);
        self
    }

    /// Create `repo` as a clone of a fresh bare repository inside the
    /// fixture, so that `pull` and `push` have an origin to talk to.
    pub fn with_tracked_archive(self, repo: &str) -> Self {
        let origin = self.path().join("origins").join(format!("{}.git", repo));
        fs::create_dir_all(&origin).expect("Failed to create origin directory");
        git(&origin, &["init", "--quiet", "--bare"]);

        let seed = self.path().join("seed").join(repo);
        fs::create_dir_all(&seed).expect("Failed to create seed directory");
        git(&seed, &["init", "--quiet"]);
        fs::write(seed.join("README"), repo).expect("Failed to write README");
        git(&seed, &["add", "."]);
        git(&seed, &["commit", "--quiet", "-m", "init"]);
        let origin_str = origin.display().to_string();
        git(&seed, &["push", "--quiet", &origin_str, "HEAD"]);

        let dest = self.data_root().join(repo);
        fs::create_dir_all(dest.parent().expect("archive has a group directory"))
            .expect("Failed to create group directory");
        let dest_str = dest.display().to_string();
        git(self.path(), &["clone", "--quiet", &origin_str, &dest_str]);
        self
    }

    /// A command for the binary using this fixture's configuration.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("archive-hub").expect("binary is built");
        cmd.current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

impl Default for HubFixture {
    fn default() -> Self {
        Self::new()
    }
}

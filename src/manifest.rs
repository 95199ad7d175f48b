//! # Archive Manifest
//!
//! Every archive may carry a line-oriented metadata file at
//! `META-INF/MANIFEST.MF`. Each line is `key: value`; the keys this crate
//! interprets are:
//!
//! - `dependencies`: comma-separated `group/name` entries.
//! - `generated-branches`: space-separated `name` or `name:path` tokens.
//!
//! Other keys are preserved untouched, in order, when the manifest is written
//! back.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::archive::RepoName;
use crate::error::{Error, Result};

/// Location of the manifest relative to the archive root.
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";

pub const DEPENDENCIES_KEY: &str = "dependencies";
pub const GENERATED_BRANCHES_KEY: &str = "generated-branches";

/// A generated-content branch and the directory it is installed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBranch {
    pub name: String,
    /// Install path relative to the archive root.
    pub path: String,
}

impl GeneratedBranch {
    /// Where the branch goes inside the archive at `archive_root`.
    ///
    /// `None` when the declared path is empty, absolute, or contains `.` or
    /// `..` components, since it could then point outside the archive.
    pub fn install_dir(&self, archive_root: &Path) -> Option<PathBuf> {
        let path = Path::new(&self.path);
        let contained = path.components().next().is_some()
            && path
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        (contained && !self.path.contains('\\')).then(|| archive_root.join(path))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest text. Lines without a `:` and `#` comments are ignored;
    /// a repeated key keeps its first position and its last value.
    pub fn parse(content: &str) -> Self {
        let mut manifest = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                manifest.set(key.trim(), value.trim());
            }
        }
        manifest
    }

    /// Path of the manifest file for the archive rooted at `archive_root`.
    pub fn path_in(archive_root: &Path) -> PathBuf {
        archive_root.join(MANIFEST_PATH)
    }

    /// Read the manifest of the archive rooted at `archive_root`.
    ///
    /// Fails with `NoManifestFile` when the file does not exist.
    pub fn read(archive_root: &Path) -> Result<Self> {
        let path = Self::path_in(archive_root);
        if !path.is_file() {
            return Err(Error::NoManifestFile {
                path: path.display().to_string(),
            });
        }
        Ok(Self::parse(&fs::read_to_string(&path)?))
    }

    /// Write the manifest into the archive rooted at `archive_root`.
    pub fn write(&self, archive_root: &Path) -> Result<()> {
        let path = Self::path_in(archive_root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.to_string())?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The declared dependencies, in declaration order.
    pub fn dependencies(&self) -> Result<Vec<RepoName>> {
        let Some(value) = self.get(DEPENDENCIES_KEY) else {
            return Ok(Vec::new());
        };
        parse_dependencies(value)
    }

    /// Replace the `dependencies` line.
    pub fn set_dependencies(&mut self, dependencies: &[RepoName]) {
        let value = dependencies
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.set(DEPENDENCIES_KEY, value);
    }

    /// The declared generated branches, in declaration order.
    pub fn generated_branches(&self) -> Vec<GeneratedBranch> {
        self.get(GENERATED_BRANCHES_KEY)
            .map(parse_generated_branches)
            .unwrap_or_default()
    }
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// Parse the value of a `dependencies` line.
///
/// An empty value declares no dependencies. Otherwise every comma-separated
/// entry must be a `group/name` pair, so empty entries are rejected too.
pub fn parse_dependencies(value: &str) -> Result<Vec<RepoName>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(str::trim)
        .map(|entry| {
            RepoName::parse(entry).ok_or_else(|| Error::MalformedDependencies {
                entry: entry.to_string(),
                message: "expected group/name with exactly one '/' and no '.' or '..' part"
                    .to_string(),
            })
        })
        .collect()
}

/// Parse the value of a `generated-branches` line.
pub fn parse_generated_branches(value: &str) -> Vec<GeneratedBranch> {
    value
        .split_whitespace()
        .map(|token| match token.split_once(':') {
            Some((name, path)) if !path.is_empty() => GeneratedBranch {
                name: name.to_string(),
                path: path.to_string(),
            },
            Some((name, _)) => GeneratedBranch {
                name: name.to_string(),
                path: name.to_string(),
            },
            None => GeneratedBranch {
                name: token.to_string(),
                path: token.to_string(),
            },
        })
        .collect()
}

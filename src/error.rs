//! # Error Handling
//!
//! This module defines the centralized error type for `archive-hub`. It uses
//! `thiserror` to derive a single `Error` enum covering every failure the
//! library can report, so that callers can match on the variant that matters
//! to them and treat the rest as fatal.
//!
//! ## Resolution errors
//!
//! - `RepositoryNotFound`: a `(group, name)` pair is unknown to a resolver.
//!   Recoverable; callers usually report "no match" or widen the search.
//! - `GroupNotFound`: a base group given for scoping has no repositories.
//!   Callers retry without the base group.
//! - `NotLocal` / `NotRemote`: an archive was cast to a capability it does
//!   not have.
//! - `Network`: a remote listing or probe could not be completed. This means
//!   "could not determine", never "definitely absent".
//!
//! ## Manifest errors
//!
//! - `NoManifestFile`: the archive has no metadata file. Non-fatal; dependency
//!   and branch discovery are skipped for that archive.
//! - `MalformedDependencies`: the `dependencies` line has an entry that is not
//!   of the form `group/name`.

use thiserror::Error;

/// Main error type for archive-hub operations
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration file could not be understood.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A `(group, name)` pair is not known to the resolver that was asked.
    #[error("Repository not found: {group}/{name}")]
    RepositoryNotFound { group: String, name: String },

    /// A base group used for scoping contains no repositories.
    #[error("Group not found: {group}")]
    GroupNotFound { group: String },

    /// No registered instance can answer for the given name.
    #[error("No instance can answer for '{name}'")]
    InstanceNotFound { name: String },

    /// The archive is not installed locally.
    #[error("Archive {archive} is not available locally")]
    NotLocal { archive: String },

    /// The archive does not exist on its remote hosting instance.
    #[error("Archive {archive} is not available remotely")]
    NotRemote { archive: String },

    /// The archive has no manifest file.
    #[error("No manifest file at {path}")]
    NoManifestFile { path: String },

    /// An entry of the `dependencies` manifest line is not `group/name`.
    #[error("Malformed dependencies entry '{entry}': {message}")]
    MalformedDependencies { entry: String, message: String },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}: {message}")]
    GitClone { url: String, message: String },

    /// An error occurred while executing a Git command.
    #[error("Git command failed for {target}: {command} - {stderr}")]
    GitCommand {
        command: String,
        target: String,
        stderr: String,
    },

    /// A remote listing or existence probe failed.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An error indicating that a mutex or other lock has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },

    /// An interactive prompt failed, wrapped from `dialoguer::Error`.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A TOML parsing error, wrapped from `toml::de::Error`.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether this error means the answer is unknown rather than negative.
    pub fn is_inconclusive(&self) -> bool {
        matches!(self, Error::Network { .. } | Error::LockPoisoned { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

//! Thin wrappers around the system `git` command.
//!
//! Using the system binary means SSH keys, credential helpers and anything
//! else configured in `~/.gitconfig` work without extra setup. Prompts are
//! disabled so a missing credential fails fast instead of hanging a batch.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crate::error::Error;

fn git() -> Command {
    let mut cmd = Command::new("git");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

fn run(mut cmd: Command, command: &str, target: &str) -> Result<Output, Error> {
    let output = cmd.output().map_err(|e| Error::GitCommand {
        command: command.to_string(),
        target: target.to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: command.to_string(),
            target: target.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// Clone `source` into `dest`, passing `extra_args` before the URL.
pub fn clone(dest: &Path, source: &str, extra_args: &[&str]) -> Result<(), Error> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = git()
        .arg("clone")
        .args(extra_args)
        .arg(source)
        .arg(dest)
        .output()
        .map_err(|e| Error::GitClone {
            url: source.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
            || stderr.contains("terminal prompts disabled")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                For private archives, ensure you have:\n\
                - SSH key added to ssh-agent\n\
                - Git credentials configured\n\
                Error: {}",
                stderr.trim()
            )
        } else {
            stderr.trim().to_string()
        };

        return Err(Error::GitClone {
            url: source.to_string(),
            message,
        });
    }

    Ok(())
}

/// Fetch and merge the upstream of the current branch.
pub fn pull(dest: &Path) -> Result<(), Error> {
    let mut cmd = git();
    cmd.arg("-C").arg(dest).arg("pull");
    run(cmd, "pull", &dest.display().to_string()).map(|_| ())
}

/// Push the current branch to its upstream.
pub fn push(dest: &Path) -> Result<(), Error> {
    let mut cmd = git();
    cmd.arg("-C").arg(dest).arg("push");
    run(cmd, "push", &dest.display().to_string()).map(|_| ())
}

/// Whether a remote repository answers at `url`.
pub fn remote_exists(url: &str) -> bool {
    let mut cmd = git();
    cmd.args(["ls-remote", "--heads", url]);
    run(cmd, "ls-remote --heads", url).is_ok()
}

/// Whether `path` is the root of a git working tree.
///
/// A directory nested inside some other repository does not count.
pub fn is_working_tree_root(path: &Path) -> bool {
    if !path.is_dir() {
        return false;
    }

    let mut cmd = git();
    cmd.arg("-C").arg(path).args(["rev-parse", "--show-toplevel"]);
    let Ok(output) = run(cmd, "rev-parse --show-toplevel", &path.display().to_string()) else {
        return false;
    };

    let toplevel = String::from_utf8_lossy(&output.stdout).trim().to_string();
    match (fs::canonicalize(&toplevel), fs::canonicalize(path)) {
        (Ok(toplevel), Ok(path)) => toplevel == path,
        _ => false,
    }
}

/// URL of the `origin` remote of the working tree at `path`.
pub fn remote_url(path: &Path) -> Result<String, Error> {
    let mut cmd = git();
    cmd.arg("-C")
        .arg(path)
        .args(["remote", "get-url", "origin"]);
    let output = run(cmd, "remote get-url origin", &path.display().to_string())?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

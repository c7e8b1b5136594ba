//! Shared test utilities for integration and E2E tests.
//!
//! This module provides helpers for building throwaway git repositories with
//! known shapes (branches, divergence points) and for inspecting the merged
//! result, so test files stay focused on the scenario under test.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::GitRepo;
//!
//! let upstream = GitRepo::init(root.join("upstream"), "main");
//! upstream.commit_file("a.txt", "a", "m1: add a");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A git repository fixture on disk.
///
/// All commits are made with a fixed test identity so fixtures work in
/// environments without a global git configuration.
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Initialize an empty repository at `path` with `branch` checked out.
    pub fn init(path: PathBuf, branch: &str) -> Self {
        fs::create_dir_all(&path).expect("failed to create repository directory");
        let repo = Self { path };
        repo.git(&["init", "-q"]);
        repo.git(&["checkout", "-q", "-b", branch]);
        repo
    }

    /// Open an existing repository (e.g. the merged target) for inspection.
    pub fn open(path: PathBuf) -> Self {
        assert!(path.join(".git").exists(), "not a git repository: {}", path.display());
        Self { path }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The repository's path as a clone URL for the configuration file.
    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Write `content` to `rel` (creating parent directories) and commit it.
    pub fn commit_file(&self, rel: &str, content: &str, message: &str) {
        let file = self.path.join(rel);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directory");
        }
        fs::write(&file, content).expect("failed to write file");
        self.git(&["add", "."]);
        self.git(&["commit", "-q", "-m", message]);
    }

    /// Create and check out `name` starting at `start`.
    pub fn branch_from(&self, name: &str, start: &str) {
        self.git(&["checkout", "-q", "-b", name, start]);
    }

    pub fn checkout(&self, name: &str) {
        self.git(&["checkout", "-q", name]);
    }

    #[allow(dead_code)]
    pub fn rev_parse(&self, rev: &str) -> String {
        self.git_stdout(&["rev-parse", rev])
    }

    /// Short name of the currently checked-out branch.
    pub fn current_branch(&self) -> String {
        self.git_stdout(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Short names of all local branches.
    pub fn local_branches(&self) -> Vec<String> {
        self.git_stdout(&["for-each-ref", "--format=%(refname:short)", "refs/heads"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Names of all configured remotes.
    pub fn remotes(&self) -> Vec<String> {
        self.git_stdout(&["remote"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Commit subjects reachable from `rev`, newest first.
    pub fn log_subjects(&self, rev: &str) -> Vec<String> {
        self.git_stdout(&["log", "--format=%s", rev])
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Whether `rel` exists in the working tree.
    #[allow(dead_code)]
    pub fn has_file(&self, rel: &str) -> bool {
        self.path.join(rel).exists()
    }

    /// Run a git subcommand, panicking on failure.
    pub fn git(&self, args: &[&str]) {
        let output = self.git_command(args).output().expect("failed to spawn git");
        assert!(
            output.status.success(),
            "git {:?} failed in {}: {}",
            args,
            self.path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Run a git subcommand and return its trimmed stdout.
    pub fn git_stdout(&self, args: &[&str]) -> String {
        let output = self.git_command(args).output().expect("failed to spawn git");
        assert!(
            output.status.success(),
            "git {:?} failed in {}: {}",
            args,
            self.path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn git_command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.args([
            "-c",
            "user.name=weld-test",
            "-c",
            "user.email=weld-test@example.invalid",
        ])
        .args(args)
        .current_dir(&self.path);
        cmd
    }
}

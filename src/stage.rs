//! # Repository Staging and History Relocation
//!
//! [`RepositoryStage`] materializes repositories as working copies inside one
//! working area and rewrites a source repository's whole history so its files
//! live under the configured relocation path.
//!
//! All operations take explicit directory names relative to the working area;
//! there is no implicit current-directory cursor. Every git invocation goes
//! through the [`CommandRunner`], so a failing command follows the recovery
//! contract of [`crate::exec`] uniformly.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use shell_words::quote;

use crate::error::Result;
use crate::exec::CommandRunner;

/// Stages repositories inside one working area.
pub struct RepositoryStage<'a> {
    runner: &'a CommandRunner,
    workdir: &'a Path,
}

impl<'a> RepositoryStage<'a> {
    pub fn new(runner: &'a CommandRunner, workdir: &'a Path) -> Self {
        Self { runner, workdir }
    }

    fn repo_dir(&self, dir_name: &str) -> PathBuf {
        self.workdir.join(dir_name)
    }

    /// Clone `url` into `dir_name` and check out `branch`.
    ///
    /// Any existing directory with that name is removed unconditionally
    /// first; callers must not stage into a directory they want preserved.
    pub fn stage(&self, url: &str, dir_name: &str, branch: &str) -> Result<()> {
        let target = self.repo_dir(dir_name);
        if target.exists() {
            debug!("removing stale directory {}", target.display());
            fs::remove_dir_all(&target)?;
        }

        self.runner.run(
            self.workdir,
            &format!("git clone {} {} -b {}", quote(url), quote(dir_name), quote(branch)),
        )?;
        Ok(())
    }

    /// Rewrite every reachable commit of `dir_name` (all branches, all
    /// history) so each commit's files move under `relocation_path`, pruning
    /// commits the move leaves empty.
    ///
    /// Branch discovery computes divergence points against the rewritten main
    /// line, so this must run before
    /// [`crate::discover::non_merged_branches`] for the same project.
    pub fn relocate_history(&self, dir_name: &str, relocation_path: &str) -> Result<()> {
        info!("relocating '{}' history into '{}'", dir_name, relocation_path);
        let command = format!(
            "FILTER_BRANCH_SQUELCH_WARNING=1 git filter-branch -f --prune-empty --tree-filter {} -- --all",
            quote(&relocation_tree_filter(relocation_path))
        );
        self.runner.run(&self.repo_dir(dir_name), &command)?;
        Ok(())
    }

    /// Apply repository-level settings; no-op when `settings` is empty.
    pub fn configure(&self, dir_name: &str, settings: &[(String, String)]) -> Result<()> {
        let dir = self.repo_dir(dir_name);
        for (key, value) in settings {
            self.runner
                .run(&dir, &format!("git config {} {}", quote(key), quote(value)))?;
        }
        Ok(())
    }

    /// Create and check out the branch every subsequent merge lands on.
    pub fn create_integration_branch(&self, dir_name: &str, branch: &str) -> Result<()> {
        self.runner
            .run(&self.repo_dir(dir_name), &format!("git checkout -b {}", quote(branch)))?;
        Ok(())
    }

    /// Delete an absorbed source project's working copy.
    pub fn teardown(&self, dir_name: &str) -> Result<()> {
        debug!("removing merged working copy {}", dir_name);
        fs::remove_dir_all(self.repo_dir(dir_name))?;
        Ok(())
    }
}

/// Build the tree filter moving every top-level entry except `.git` and the
/// relocation path's own first segment into the relocation path.
///
/// `find -mindepth 1 -maxdepth 1` covers dotfiles too; excluding the first
/// path segment keeps the filter from moving the destination into itself on
/// a re-run over already-moved trees.
fn relocation_tree_filter(relocation_path: &str) -> String {
    let first_segment = relocation_path
        .split('/')
        .next()
        .unwrap_or(relocation_path);
    format!(
        "mkdir -p {path} && find . -mindepth 1 -maxdepth 1 ! -name .git ! -name {seg} -exec mv {{}} {path}/ ';'",
        path = quote(relocation_path),
        seg = quote(first_segment)
    )
}

//! # Non-Merged Branch Discovery
//!
//! For one already-relocated source repository, this module determines which
//! remote branches carry work not yet folded into the project's main line,
//! and the exact commit each one diverged from that line at. That commit is
//! the branch's replay anchor: recreating the branch there in the target
//! means a later merge brings over only the branch's unique commits plus a
//! coherent base.
//!
//! Discovery must run *after* history relocation: the divergence points are
//! computed against the rewritten graph, and anchors taken from the
//! pre-relocation graph would not exist in the merged target. The sequencer
//! enforces that ordering structurally (see [`crate::sequence`]).

use std::collections::HashSet;
use std::path::Path;

use log::{debug, warn};
use regex::Regex;
use shell_words::quote;

use crate::error::Result;
use crate::exec::CommandRunner;

/// Conventional prefix of remote-tracking branch names.
const REMOTE_PREFIX: &str = "origin/";

/// One discovered branch and the commit it is replayed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCopy {
    /// Local branch name (remote name with the `origin/` prefix stripped).
    pub branch: String,
    /// Newest commit shared by the branch's and the main line's first-parent
    /// histories.
    pub start_commit: String,
}

/// Find the remote branches of `repo_dir` not yet merged into `main_branch`,
/// check each out locally, and record its replay anchor.
///
/// Branches matching the non-empty `ignore_branches` regex (against the full
/// remote name) are skipped, as are names without the conventional remote
/// prefix. The returned order is discovery order, which later becomes merge
/// order. The repository is left checked out at `main_branch`.
pub fn non_merged_branches(
    runner: &CommandRunner,
    repo_dir: &Path,
    main_branch: &str,
    ignore_branches: &str,
) -> Result<Vec<BranchCopy>> {
    let ignore = if ignore_branches.is_empty() {
        None
    } else {
        Some(Regex::new(ignore_branches)?)
    };

    let listing = runner.run(
        repo_dir,
        &format!("git branch -r --no-merged {}", quote(main_branch)),
    )?;

    let mut copies = Vec::new();
    for line in listing.lines() {
        let remote_branch = line.trim();
        let Some(local_branch) = qualifying_local_name(remote_branch, ignore.as_ref()) else {
            debug!("skipping remote branch listing entry '{}'", remote_branch);
            continue;
        };

        // Check the branch out from the remote ref, anchoring it to the
        // pre-merge commit graph; the local ref is what the target fetches.
        runner.run(
            repo_dir,
            &format!("git checkout -b {} {}", quote(local_branch), quote(remote_branch)),
        )?;

        let branch_revs = runner.run(
            repo_dir,
            &format!("git rev-list --first-parent {}", quote(local_branch)),
        )?;
        let main_revs = runner.run(
            repo_dir,
            &format!("git rev-list --first-parent {}", quote(main_branch)),
        )?;

        match starting_point(branch_revs.lines(), main_revs.lines()) {
            Some(start_commit) => copies.push(BranchCopy {
                branch: local_branch.to_string(),
                start_commit,
            }),
            None => warn!(
                "branch '{}' shares no first-parent history with '{}'; it will not be replayed",
                local_branch, main_branch
            ),
        }
    }

    // Discovery must leave no side effect on the current checkout.
    runner.run(repo_dir, &format!("git checkout {}", quote(main_branch)))?;

    Ok(copies)
}

/// Strip a candidate line from `git branch -r` down to a local branch name,
/// or reject it.
///
/// Rejected: blank lines, symref entries (`origin/HEAD -> origin/main`),
/// names without the conventional remote prefix, and names matched by the
/// ignore pattern.
fn qualifying_local_name<'a>(remote_branch: &'a str, ignore: Option<&Regex>) -> Option<&'a str> {
    if remote_branch.is_empty() || remote_branch.contains("->") {
        return None;
    }
    let local = remote_branch.strip_prefix(REMOTE_PREFIX)?;
    if ignore.is_some_and(|re| re.is_match(remote_branch)) {
        return None;
    }
    Some(local)
}

/// The newest commit common to both first-parent histories, scanning from the
/// branch's side.
///
/// Both iterators are expected in `git rev-list` order, newest first. Returns
/// `None` when the histories share nothing.
fn starting_point<'a>(
    branch_revs: impl Iterator<Item = &'a str>,
    main_revs: impl Iterator<Item = &'a str>,
) -> Option<String> {
    let main_line: HashSet<&str> = main_revs.map(str::trim).collect();
    branch_revs
        .map(str::trim)
        .find(|commit| main_line.contains(commit))
        .map(str::to_string)
}

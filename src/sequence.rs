//! # Merge Orchestration
//!
//! [`MergeSequencer`] drives the end-to-end run: stage the main project and
//! create its integration branch, then for each source project in configured
//! order: stage, relocate history, discover non-merged branches, and merge
//! the project and its branches into the target.
//!
//! ## Ordering is structural
//!
//! Relocation must precede discovery (divergence anchors are computed against
//! the rewritten graph), and discovery must precede the merge. Rather than
//! relying on call-site discipline, each source project advances through the
//! typestate values [`StagedSource`], [`RelocatedSource`], and
//! [`DiscoveredSource`], so a later stage cannot be invoked without the
//! value its predecessor produced.
//!
//! ## Branch-name collisions
//!
//! The sequencer owns the [`CollisionTable`]: when two source projects both
//! declare a branch of the same name, the second merge lands on the branch
//! the first one created, with a warning. Both projects' contents coexist on
//! that branch via the subsequent merges; operators who want them separate
//! must rename branches before running the tool.

use std::collections::HashSet;
use std::path::Path;

use log::{info, warn};
use shell_words::quote;

use crate::config::{Config, SourceProject};
use crate::discover::{self, BranchCopy};
use crate::error::Result;
use crate::exec::CommandRunner;
use crate::stage::RepositoryStage;

/// Local branch names already created in the target during this run, across
/// all source projects. Grows monotonically; never persisted.
#[derive(Debug, Default)]
pub struct CollisionTable {
    created: HashSet<String>,
}

impl CollisionTable {
    /// Claim `branch` for this run.
    ///
    /// Returns `true` the first time a name is claimed. A repeated claim
    /// warns and returns `false`: the caller reuses the existing local branch
    /// instead of re-creating it, never silently overwriting and never
    /// failing hard.
    pub fn claim(&mut self, branch: &str) -> bool {
        let fresh = self.created.insert(branch.to_string());
        if !fresh {
            warn!(
                "merging into local branch '{}' already created by an earlier source project",
                branch
            );
        }
        fresh
    }

    pub fn contains(&self, branch: &str) -> bool {
        self.created.contains(branch)
    }
}

/// A source project cloned into the working area at its main branch.
pub struct StagedSource<'a> {
    project: &'a SourceProject,
}

impl<'a> StagedSource<'a> {
    /// Rewrite the project's whole history under its relocation path.
    pub fn relocate(self, stage: &RepositoryStage<'_>) -> Result<RelocatedSource<'a>> {
        stage.relocate_history(&self.project.name, &self.project.path)?;
        Ok(RelocatedSource {
            project: self.project,
        })
    }
}

/// A staged project whose history has been rewritten.
pub struct RelocatedSource<'a> {
    project: &'a SourceProject,
}

impl<'a> RelocatedSource<'a> {
    /// Discover the project's non-merged branches and their replay anchors.
    pub fn discover(
        self,
        runner: &CommandRunner,
        workdir: &Path,
    ) -> Result<DiscoveredSource<'a>> {
        let repo_dir = workdir.join(&self.project.name);
        let branches = discover::non_merged_branches(
            runner,
            &repo_dir,
            &self.project.main_branch,
            &self.project.ignore_branches,
        )?;
        info!(
            "project '{}': {} non-merged branch(es) to replay",
            self.project.name,
            branches.len()
        );
        Ok(DiscoveredSource {
            project: self.project,
            branches,
        })
    }
}

/// A relocated project with its branch replay anchors known; ready to merge.
pub struct DiscoveredSource<'a> {
    project: &'a SourceProject,
    /// Write-once: populated by discovery, read in discovery order by the
    /// merge.
    branches: Vec<BranchCopy>,
}

/// Drives the whole merge run and owns the collision bookkeeping.
pub struct MergeSequencer<'a> {
    runner: &'a CommandRunner,
    workdir: &'a Path,
    config: &'a Config,
    created_branches: CollisionTable,
}

impl<'a> MergeSequencer<'a> {
    pub fn new(runner: &'a CommandRunner, workdir: &'a Path, config: &'a Config) -> Self {
        Self {
            runner,
            workdir,
            config,
            created_branches: CollisionTable::default(),
        }
    }

    /// Run the whole merge: stage the main project, then absorb every source
    /// project in configured order.
    ///
    /// On success the main project's directory holds the merged result and
    /// every source project's directory has been removed.
    pub fn run(&mut self) -> Result<()> {
        let stage = RepositoryStage::new(self.runner, self.workdir);
        let main = &self.config.main_project;

        info!("creating a copy of the main repository");
        stage.stage(&main.repository, &main.name, &main.main_branch)?;
        stage.configure(&main.name, &self.config.git_config)?;
        stage.create_integration_branch(&main.name, &main.create_branch)?;

        for project in &self.config.projects {
            info!("merging project '{}'", project.name);
            stage.stage(&project.repository, &project.name, &project.main_branch)?;
            let staged = StagedSource { project };
            let relocated = staged.relocate(&stage)?;
            let discovered = relocated.discover(self.runner, self.workdir)?;
            self.merge_project(discovered)?;
            stage.teardown(&project.name)?;
        }

        Ok(())
    }

    /// Merge one discovered project and its branches into the target.
    ///
    /// The staged working copy is registered as a per-project remote, its
    /// main branch is merged into the integration branch, each discovered
    /// branch is replayed from its anchor, and the remote is removed again so
    /// registrations do not accumulate across the run.
    fn merge_project(&mut self, source: DiscoveredSource<'_>) -> Result<()> {
        let project = source.project;
        let target = self.workdir.join(&self.config.main_project.name);

        self.runner.run(
            &target,
            &format!(
                "git remote add -f {} {}",
                quote(&project.name),
                quote(&format!("../{}", project.name))
            ),
        )?;

        self.runner.run(
            &target,
            &format!(
                "git merge --no-ff {}/{} --allow-unrelated-histories",
                quote(&project.name),
                quote(&project.main_branch)
            ),
        )?;

        for copy in &source.branches {
            if self.created_branches.claim(&copy.branch) {
                self.runner.run(
                    &target,
                    &format!(
                        "git checkout -b {} {}",
                        quote(&copy.branch),
                        quote(&copy.start_commit)
                    ),
                )?;
            } else {
                self.runner
                    .run(&target, &format!("git checkout {}", quote(&copy.branch)))?;
            }
            self.runner.run(
                &target,
                &format!(
                    "git merge --no-ff {}/{} --allow-unrelated-histories",
                    quote(&project.name),
                    quote(&copy.branch)
                ),
            )?;
        }

        // Leave the next project a known, stable checkout.
        self.runner.run(
            &target,
            &format!(
                "git checkout {}",
                quote(&self.config.main_project.create_branch)
            ),
        )?;

        self.runner
            .run(&target, &format!("git remote remove {}", quote(&project.name)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_collision_table_first_claim_is_fresh() {
        let mut table = CollisionTable::default();
        assert!(table.claim("feature-x"));
        assert!(table.contains("feature-x"));
        assert!(!table.contains("feature-y"));
    }

    #[test]
    fn test_collision_table_repeated_claim_is_not_fresh() {
        let mut table = CollisionTable::default();
        assert!(table.claim("feature-x"));
        assert!(!table.claim("feature-x"));
        assert!(table.claim("feature-y"));
    }

    #[test]
    #[serial]
    fn test_collision_table_warns_on_repeated_claim() {
        testing_logger::setup();
        let mut table = CollisionTable::default();
        table.claim("feature-x");
        table.claim("feature-x");
        testing_logger::validate(|captured| {
            let warnings: Vec<_> = captured
                .iter()
                .filter(|entry| entry.level == log::Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].body.contains("feature-x"));
            assert!(warnings[0].body.contains("earlier source project"));
        });
    }
}

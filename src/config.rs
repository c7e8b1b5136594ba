//! # Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the JSON merge
//! configuration file, as well as the logic for parsing and validating it.
//!
//! ## Key Components
//!
//! - **`Config`**: The fully validated configuration: the main project, the
//!   source projects in configured order, and the optional git settings.
//!
//! - **`MainProject`**: Identifies the target repository, the branch to check
//!   out initially, and the name of the integration branch created on top of
//!   it.
//!
//! - **`SourceProject`**: One repository to absorb: its URL, the subdirectory
//!   its files are relocated into, its main branch, and an optional regex
//!   excluding branches from discovery.
//!
//! ## Ordering
//!
//! The order of the `projectsToMerge` object in the configuration file *is*
//! the merge order. `serde_json` is built with the `preserve_order` feature so
//! the object's insertion order survives deserialization; validation then
//! flattens the mapping into a `Vec<SourceProject>` with the project name
//! folded in from the map key.
//!
//! ## Validation
//!
//! All mandatory keys are checked at load time, and diagnostics name the
//! missing key and, for source projects, the project. A non-empty
//! `ignoreBranches` value must compile as a regular expression; a bad pattern
//! is a configuration error rather than a mid-run surprise.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Error, Result};

/// The target repository every source project is merged into.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainProject {
    /// Subdirectory name the repository is cloned into.
    pub name: String,
    /// Clone URL (anything the system git accepts).
    pub repository: String,
    /// Branch checked out initially.
    pub main_branch: String,
    /// Integration branch created on top of `main_branch`; every merge lands
    /// on it.
    pub create_branch: String,
}

/// One source repository to relocate and merge.
#[derive(Debug, Clone)]
pub struct SourceProject {
    /// Project name, taken from the `projectsToMerge` map key. Doubles as the
    /// staging subdirectory name and the per-project remote name.
    pub name: String,
    /// Clone URL.
    pub repository: String,
    /// Subdirectory of the target all of this project's files are moved into.
    pub path: String,
    /// The project's own main line.
    pub main_branch: String,
    /// Regex excluding branches from discovery by their full remote name.
    /// Empty matches nothing.
    pub ignore_branches: String,
}

/// Fully validated merge configuration. Loaded once, never mutated.
#[derive(Debug, Clone)]
pub struct Config {
    pub main_project: MainProject,
    /// Source projects in configured (= merge) order.
    pub projects: Vec<SourceProject>,
    /// Repository-level settings applied to the target before any merge.
    pub git_config: Vec<(String, String)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceProject {
    repository: String,
    path: String,
    main_branch: String,
    ignore_branches: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    main_project: serde_json::Value,
    projects_to_merge: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    git_config: serde_json::Map<String, serde_json::Value>,
}

/// Load and validate a configuration file.
pub fn from_file(path: &Path) -> Result<Config> {
    let text = fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("cannot read \"{}\": {}", path.display(), e),
        hint: None,
    })?;
    parse(&text)
}

/// Parse and validate a configuration from its JSON text.
pub fn parse(text: &str) -> Result<Config> {
    let raw: RawConfig = serde_json::from_str(text).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some(
            "the configuration must be a JSON object with \"mainProject\" and \
             \"projectsToMerge\" sections"
                .to_string(),
        ),
    })?;

    let main_project: MainProject =
        serde_json::from_value(raw.main_project).map_err(|e| Error::ConfigParse {
            message: format!("\"mainProject\" section: {}", e),
            hint: None,
        })?;

    let mut projects = Vec::with_capacity(raw.projects_to_merge.len());
    for (name, value) in raw.projects_to_merge {
        let project = validate_project(&name, value)?;
        projects.push(project);
    }

    let mut git_config = Vec::with_capacity(raw.git_config.len());
    for (key, value) in raw.git_config {
        let serde_json::Value::String(value) = value else {
            return Err(Error::ConfigParse {
                message: format!("\"gitConfig\" entry \"{}\" must be a string", key),
                hint: None,
            });
        };
        git_config.push((key, value));
    }

    Ok(Config {
        main_project,
        projects,
        git_config,
    })
}

fn validate_project(name: &str, value: serde_json::Value) -> Result<SourceProject> {
    let raw: RawSourceProject = serde_json::from_value(value).map_err(|e| Error::ConfigParse {
        message: format!("project \"{}\": {}", name, e),
        hint: None,
    })?;

    if name.is_empty() {
        return Err(Error::ConfigParse {
            message: "project names in \"projectsToMerge\" must not be empty".to_string(),
            hint: None,
        });
    }

    // The relocation path becomes a subdirectory of the target repository, so
    // it must be a non-empty relative path.
    if raw.path.is_empty() || raw.path.starts_with('/') {
        return Err(Error::ConfigParse {
            message: format!(
                "project \"{}\": \"path\" must be a non-empty relative path, got \"{}\"",
                name, raw.path
            ),
            hint: None,
        });
    }

    if !raw.ignore_branches.is_empty() {
        Regex::new(&raw.ignore_branches).map_err(|e| Error::ConfigParse {
            message: format!("project \"{}\": invalid \"ignoreBranches\" pattern: {}", name, e),
            hint: None,
        })?;
    }

    Ok(SourceProject {
        name: name.to_string(),
        repository: raw.repository,
        path: raw.path,
        main_branch: raw.main_branch,
        ignore_branches: raw.ignore_branches,
    })
}

//! CLI argument parsing and top-level run

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;

use git_weld::config;
use git_weld::exec::{CommandRunner, InteractiveRecovery};
use git_weld::output::{emoji, OutputConfig};
use git_weld::sequence::MergeSequencer;

/// Merge several git repositories into one, preserving history
#[derive(Parser, Debug)]
#[command(name = "git-weld")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the JSON merge configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Show each command as it is executed
    #[arg(short, long)]
    verbose: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Colorize output (always, never, auto)
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    color: String,
}

impl Cli {
    /// Execute the merge run described by the configuration file.
    pub fn execute(self) -> Result<()> {
        let level = if self.verbose {
            "debug"
        } else {
            self.log_level.as_str()
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
        let out = OutputConfig::from_env_and_flag(&self.color);

        let config = config::from_file(&self.config)?;
        let workdir = std::env::current_dir()?;

        println!(
            "{} Merging {} source project(s) into '{}'",
            emoji(&out, "🔀", "[MERGE]"),
            config.projects.len(),
            config.main_project.name
        );

        let start = Instant::now();
        let runner = CommandRunner::new(Box::new(InteractiveRecovery::from_env()));
        MergeSequencer::new(&runner, &workdir, &config).run()?;

        println!(
            "{} Merged successfully in {:.2}s",
            emoji(&out, "✅", "[DONE]"),
            start.elapsed().as_secs_f64()
        );
        println!(
            "   Result in: {}",
            workdir.join(&config.main_project.name).display()
        );
        Ok(())
    }
}

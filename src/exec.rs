//! # Shell Command Execution and Failure Recovery
//!
//! This module provides the [`CommandRunner`], the single path through which
//! every git operation is executed. Commands are run as one `$SHELL -c`
//! invocation so pipelines and redirections inside a command line are honored
//! rather than escaped away, with stdout and stderr both captured.
//!
//! ## The recovery contract
//!
//! On a non-zero exit status the full captured output is surfaced and control
//! is handed to a [`Recovery`] collaborator. The operator either fixes the
//! repository state by hand and continues, in which case the caller receives
//! whatever output was captured as though the command had succeeded, or
//! aborts, which terminates the whole run via [`Error::Aborted`]. There are no
//! automatic retries and no rollback; correctness after a continue is entirely
//! the operator's responsibility.
//!
//! `Recovery` is a trait so tests can substitute scripted always-continue or
//! always-abort stand-ins, decoupling the merge algorithm's correctness from
//! any real interactive terminal.

use std::path::Path;
use std::process::{Command, Stdio};

use log::debug;

use crate::error::{Error, Result};

/// The login shell used both to execute commands and for the emergency shell.
fn login_shell() -> String {
    std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
}

/// Captured output of a completed (or operator-continued) command.
#[derive(Debug, Default)]
pub struct CommandOutput {
    stdout: String,
}

impl CommandOutput {
    /// Lines of captured stdout.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    /// The last line of captured stdout, if any.
    pub fn last_line(&self) -> Option<&str> {
        self.stdout.lines().last()
    }
}

/// Details of a failed command handed to the recovery collaborator.
#[derive(Debug)]
pub struct CommandFailure<'a> {
    /// The command line that failed.
    pub command: &'a str,
    /// Combined stdout and stderr captured before the failure.
    pub output: &'a str,
    /// Exit code, when the process was not killed by a signal.
    pub exit_code: Option<i32>,
}

/// What the operator decided after a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    /// Proceed as though the command had succeeded.
    Continue,
    /// Terminate the whole run.
    Abort,
}

/// Trait for failure recovery - allows scripted stand-ins in tests
pub trait Recovery {
    /// Decide what to do about a failed command.
    fn resolve(&self, failure: &CommandFailure<'_>) -> RecoveryChoice;
}

/// Production recovery: dump the output, hand the operator an interactive
/// login shell to fix the repository state by hand, then ask
/// continue-or-abort.
pub struct InteractiveRecovery {
    shell: String,
}

impl InteractiveRecovery {
    /// Build a recovery handler using `$SHELL` (fallback `/bin/sh`).
    pub fn from_env() -> Self {
        Self {
            shell: login_shell(),
        }
    }
}

impl Recovery for InteractiveRecovery {
    fn resolve(&self, failure: &CommandFailure<'_>) -> RecoveryChoice {
        match failure.exit_code {
            Some(code) => println!("Command failed with status {}: {}", code, failure.command),
            None => println!("Command killed by signal: {}", failure.command),
        }
        if !failure.output.is_empty() {
            println!("{}", failure.output.trim_end());
        }
        println!();
        println!("Something went wrong. Bringing up the emergency shell to correct errors manually...");
        println!("===========================================");

        let status = Command::new(&self.shell)
            .arg("-l")
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();
        if let Err(e) = status {
            eprintln!("could not start {}: {}", self.shell, e);
            return RecoveryChoice::Abort;
        }

        println!("===========================================");
        println!("Emergency shell finished.");

        match dialoguer::Confirm::new()
            .with_prompt("Continue")
            .default(false)
            .interact()
        {
            Ok(true) => RecoveryChoice::Continue,
            Ok(false) => RecoveryChoice::Abort,
            // No usable terminal: the only safe answer is to stop.
            Err(_) => RecoveryChoice::Abort,
        }
    }
}

/// Runs shell command lines and applies the recovery contract on failure.
pub struct CommandRunner {
    shell: String,
    recovery: Box<dyn Recovery>,
}

impl CommandRunner {
    /// Build a runner executing through `$SHELL` (fallback `/bin/sh`).
    pub fn new(recovery: Box<dyn Recovery>) -> Self {
        Self::with_shell(login_shell(), recovery)
    }

    /// Build a runner executing through an explicit shell.
    pub fn with_shell(shell: impl Into<String>, recovery: Box<dyn Recovery>) -> Self {
        Self {
            shell: shell.into(),
            recovery,
        }
    }

    /// Execute `command` as a single shell invocation in `dir`.
    ///
    /// `GIT_MERGE_AUTOEDIT=no` is set in the child environment so merge
    /// commits never open an editor mid-run.
    pub fn run(&self, dir: &Path, command: &str) -> Result<CommandOutput> {
        debug!("executing in {}: {}", dir.display(), command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(dir)
            .env("GIT_MERGE_AUTOEDIT", "no")
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut combined = stdout.clone();
            combined.push_str(&stderr);
            let failure = CommandFailure {
                command,
                output: &combined,
                exit_code: output.status.code(),
            };
            if self.recovery.resolve(&failure) == RecoveryChoice::Abort {
                return Err(Error::Aborted {
                    command: command.to_string(),
                });
            }
        }

        Ok(CommandOutput { stdout })
    }
}

//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `git-weld` application. It uses the `thiserror` library to create an
//! `Error` enum covering the failure modes the tool distinguishes:
//!
//! - **Configuration errors** (`ConfigParse`): missing file, invalid JSON,
//!   missing mandatory keys. These are fatal, reported with a one-line
//!   diagnostic, and occur before any repository state exists.
//! - **Operator aborts** (`Aborted`): a git or shell command failed, the
//!   operator was handed the emergency shell, and chose not to continue.
//! - Wrapped I/O, JSON, and regex errors from the underlying libraries.
//!
//! Command failures themselves are *not* represented here: a non-zero exit
//! status is routed through the recovery handoff in [`crate::exec`] and only
//! becomes an `Error::Aborted` if the operator declines to continue.
//!
//! The `Result<T>` alias is used throughout the library to keep signatures
//! short.

use thiserror::Error;

/// Main error type for git-weld operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while reading or validating the configuration file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The operator chose to abort the run after a command failure.
    #[error("Aborted by operator after failed command: {command}")]
    Aborted { command: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

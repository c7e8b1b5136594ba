//! # git-weld CLI
//!
//! This is the binary entry point for the `git-weld` command-line tool.
//!
//! Its responsibilities are parsing command-line arguments using `clap`,
//! running the merge, and translating top-level errors into a one-line
//! diagnostic with a non-zero exit status. Both configuration errors and an
//! operator-chosen abort during recovery exit with status 1.
//!
//! The core logic lives in the library crate; the binary is a thin wrapper
//! around it.

mod cli;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();
    if let Err(err) = cli.execute() {
        println!("Error: {:#}", err);
        std::process::exit(1);
    }
}

//! Core library entry for the `xtestgen` CLI.
//!
//! `xtestgen` collects test functions marked with `#[test]` (or another
//! marker) from a source tree into one module with a static registry of
//! `(name, fn())` pairs, for targets where the native test harness is
//! unavailable.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod harness;
pub mod ports;

use clap::Parser;

pub use error::GenError;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        // --help and --version
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}

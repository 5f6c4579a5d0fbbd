//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::harness::staleness::StalenessMode;

/// Top-level CLI parser for `xtestgen`.
#[derive(Debug, Parser)]
#[command(name = "xtestgen", version, about = "Collect marked tests into a single harness module")]
pub struct Cli {
    /// Config file; defaults to `xtestgen.yaml` when it exists.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every subcommand, overriding the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct TreeArgs {
    /// Directory scanned for tests.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Generated module path.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Marker line that introduces a test.
    #[arg(long)]
    pub marker: Option<String>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Regenerate the harness module if any input changed.
    Generate {
        /// Input and output locations.
        #[command(flatten)]
        tree: TreeArgs,
        /// Regenerate even when the output looks current.
        #[arg(long)]
        force: bool,
        /// Staleness policy.
        #[arg(long, value_enum)]
        staleness: Option<StalenessMode>,
    },
    /// Print every discovered test without writing anything.
    List {
        /// Input and output locations.
        #[command(flatten)]
        tree: TreeArgs,
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Exit non-zero when the harness module needs regenerating.
    Check {
        /// Input and output locations.
        #[command(flatten)]
        tree: TreeArgs,
        /// Staleness policy.
        #[arg(long, value_enum)]
        staleness: Option<StalenessMode>,
    },
}

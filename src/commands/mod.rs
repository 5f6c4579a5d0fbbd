//! Command dispatch and handlers.

pub mod check;
pub mod generate;
pub mod list;

use std::path::Path;

use crate::cli::{Cli, Command, TreeArgs};
use crate::config::{HarnessConfig, DEFAULT_CONFIG_FILE};
use crate::context::ServiceContext;

/// Dispatch a parsed command line to its handler using live adapters.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails.
pub fn dispatch(cli: &Cli) -> Result<(), String> {
    dispatch_with_context(cli, &ServiceContext::live())
}

/// Dispatch a parsed command line with the given service context.
///
/// # Errors
///
/// Returns an error string if configuration or the command fails.
pub fn dispatch_with_context(cli: &Cli, ctx: &ServiceContext) -> Result<(), String> {
    match &cli.command {
        Command::Generate { tree, force, staleness } => {
            let mut config = resolve_config(ctx, cli.config.as_deref(), tree)?;
            if let Some(mode) = staleness {
                config.staleness = *mode;
            }
            generate::run_with_context(ctx, &config, *force)
        }
        Command::List { tree, json } => {
            let config = resolve_config(ctx, cli.config.as_deref(), tree)?;
            list::run_with_context(ctx, &config, *json)
        }
        Command::Check { tree, staleness } => {
            let mut config = resolve_config(ctx, cli.config.as_deref(), tree)?;
            if let Some(mode) = staleness {
                config.staleness = *mode;
            }
            check::run_with_context(ctx, &config)
        }
    }
}

/// Loads the config file (explicit, or `xtestgen.yaml` if present) and
/// applies command-line overrides on top.
fn resolve_config(
    ctx: &ServiceContext,
    explicit: Option<&Path>,
    tree: &TreeArgs,
) -> Result<HarnessConfig, String> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let mut config = match explicit {
        Some(path) => HarnessConfig::load(ctx, path).map_err(|e| e.to_string())?,
        None if ctx.fs.exists(default_path) => {
            HarnessConfig::load(ctx, default_path).map_err(|e| e.to_string())?
        }
        None => HarnessConfig::default(),
    };

    if let Some(root) = &tree.root {
        config.root.clone_from(root);
    }
    if let Some(output) = &tree.output {
        config.output.clone_from(output);
    }
    if let Some(marker) = &tree.marker {
        config.marker.clone_from(marker);
    }
    config.validate()?;
    Ok(config)
}

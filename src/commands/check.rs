//! `xtestgen check` command.

use crate::config::HarnessConfig;
use crate::context::ServiceContext;
use crate::harness::driver;

/// Execute the `check` command.
///
/// # Errors
///
/// Returns an error string when the output is stale or inputs cannot be read.
pub fn run_with_context(ctx: &ServiceContext, config: &HarnessConfig) -> Result<(), String> {
    let decision = driver::check(ctx, config).map_err(|e| e.to_string())?;
    if decision.is_stale() {
        return Err(format!("{} needs regenerating: {decision}", config.output.display()));
    }
    println!("{} is up to date", config.output.display());
    Ok(())
}

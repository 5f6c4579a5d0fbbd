//! `xtestgen generate` command.

use crate::config::HarnessConfig;
use crate::context::ServiceContext;
use crate::harness::driver::{self, Outcome};
use crate::harness::staleness::StalenessMode;

/// Execute the `generate` command.
///
/// `force` bypasses the staleness check regardless of the configured mode.
///
/// # Errors
///
/// Returns an error string if generation fails; the previous output is left
/// untouched in that case.
pub fn run_with_context(
    ctx: &ServiceContext,
    config: &HarnessConfig,
    force: bool,
) -> Result<(), String> {
    let forced;
    let config = if force {
        forced = HarnessConfig { staleness: StalenessMode::Always, ..config.clone() };
        &forced
    } else {
        config
    };

    match driver::generate(ctx, config).map_err(|e| e.to_string())? {
        Outcome::UpToDate => println!("{} is up to date", config.output.display()),
        Outcome::Generated { tests, reason } => {
            println!("Wrote {} ({tests} tests; {reason})", config.output.display());
        }
    }
    Ok(())
}

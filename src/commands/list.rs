//! `xtestgen list` command.

use crate::config::HarnessConfig;
use crate::context::ServiceContext;
use crate::harness::driver;

/// Execute the `list` command.
///
/// Prints one `name  path:line` row per test, or a JSON array when `json`
/// is set. Nothing is written.
///
/// # Errors
///
/// Returns an error string if scanning fails, including on duplicate names.
pub fn run_with_context(ctx: &ServiceContext, config: &HarnessConfig, json: bool) -> Result<(), String> {
    let registry = driver::collect(ctx, config).map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(registry.tests())
            .map_err(|e| format!("failed to serialize test list: {e}"))?;
        println!("{out}");
        return Ok(());
    }

    if registry.is_empty() {
        println!("No tests found under {}.", config.root.display());
        return Ok(());
    }

    let name_width = registry.tests().iter().map(|t| t.name.len()).max().unwrap_or(4).max(4);
    println!("{:<name_width$}  LOCATION", "NAME");
    println!("{:-<name_width$}  {:-<8}", "", "");
    for test in registry.tests() {
        println!("{:<name_width$}  {}", test.name, test.location);
    }
    println!("\n{} test(s) total.", registry.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemFileSystem;
    use std::path::PathBuf;

    fn config() -> HarnessConfig {
        HarnessConfig { root: PathBuf::from("/p/src"), ..HarnessConfig::default() }
    }

    #[test]
    fn lists_tests() {
        let fs = MemFileSystem::new();
        fs.insert("/p/src/a.rs", "#[test]\nfn a() {}\n");
        let ctx = ServiceContext::with_fs(fs);
        assert!(run_with_context(&ctx, &config(), false).is_ok());
        assert!(run_with_context(&ctx, &config(), true).is_ok());
    }

    #[test]
    fn empty_tree_is_fine() {
        let fs = MemFileSystem::new();
        fs.create_dir("/p/src");
        let ctx = ServiceContext::with_fs(fs);
        assert!(run_with_context(&ctx, &config(), false).is_ok());
    }

    #[test]
    fn json_shape() {
        let fs = MemFileSystem::new();
        fs.insert("/p/src/a.rs", "\n#[test]\nfn a() {}\n");
        let ctx = ServiceContext::with_fs(fs);
        let registry = driver::collect(&ctx, &config()).unwrap();
        let value = serde_json::to_value(registry.tests()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "name": "a", "location": { "path": "/p/src/a.rs", "line": 2 } }])
        );
    }
}

//! End-to-end generation against the real filesystem.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, SystemTime};

use filetime::{set_file_mtime, FileTime};
use pretty_assertions::assert_eq;

use xtestgen::config::HarnessConfig;
use xtestgen::context::ServiceContext;
use xtestgen::harness::driver::{generate, Outcome};
use xtestgen::harness::staleness::{StalenessDecision, StalenessMode};
use xtestgen::harness::support::SupportModule;

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn set_age(path: &Path, offset_secs: i64) {
    let now = SystemTime::now();
    let magnitude = Duration::from_secs(offset_secs.unsigned_abs());
    let when = if offset_secs >= 0 { now + magnitude } else { now - magnitude };
    set_file_mtime(path, FileTime::from_system_time(when)).unwrap();
}

struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = Self { dir };
        write(&project.path("src/lib.rs"), "pub mod id;\n\n#[test]\nfn smoke() {\n    assert_eq!(1 + 1, 2);\n}\n");
        write(
            &project.path("src/id.rs"),
            "use crate::runtime::Object;\n\npub struct Id;\n\n#[cfg(test)]\nmod tests {\n    #[test]\n    fn id_is_zero_sized() {\n        assert_eq!(std::mem::size_of::<super::Id>(), 0);\n    }\n}\n",
        );
        project
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn config(&self) -> HarnessConfig {
        HarnessConfig {
            root: self.path("src"),
            output: self.path("xtests/tests.rs"),
            ..HarnessConfig::default()
        }
    }
}

#[test]
fn generates_then_skips() {
    let project = Project::new();
    let ctx = ServiceContext::live();

    let first = generate(&ctx, &project.config()).unwrap();
    assert_eq!(first, Outcome::Generated { tests: 2, reason: StalenessDecision::OutputMissing });

    let second = generate(&ctx, &project.config()).unwrap();
    assert_eq!(second, Outcome::UpToDate);
}

#[test]
fn newer_input_regenerates() {
    let project = Project::new();
    let ctx = ServiceContext::live();
    generate(&ctx, &project.config()).unwrap();

    set_age(&project.path("xtests/tests.rs"), -60);
    let outcome = generate(&ctx, &project.config()).unwrap();
    assert!(matches!(outcome, Outcome::Generated { reason: StalenessDecision::InputNewer { .. }, .. }));
}

#[test]
fn timestamp_preserving_edit_needs_hash_mode() {
    let project = Project::new();
    let ctx = ServiceContext::live();
    let config = project.config();
    generate(&ctx, &config).unwrap();

    // Edit an input but backdate it, as a timestamp-preserving copy would.
    let lib = project.path("src/lib.rs");
    write(&lib, "#[test]\nfn renamed() {\n}\n");
    set_age(&lib, -3600);

    assert_eq!(generate(&ctx, &config).unwrap(), Outcome::UpToDate);

    let hashed = HarnessConfig { staleness: StalenessMode::Hash, ..config };
    let outcome = generate(&ctx, &hashed).unwrap();
    assert_eq!(outcome, Outcome::Generated { tests: 2, reason: StalenessDecision::DigestChanged });
    let text = std::fs::read_to_string(project.path("xtests/tests.rs")).unwrap();
    assert!(text.contains("(\"renamed\", renamed),"));
}

#[test]
fn failed_run_keeps_previous_output() {
    let project = Project::new();
    let ctx = ServiceContext::live();
    generate(&ctx, &project.config()).unwrap();
    let before = std::fs::read_to_string(project.path("xtests/tests.rs")).unwrap();

    write(&project.path("src/broken.rs"), "#[test]\nfn never_closed() {\n");
    let forced = HarnessConfig { staleness: StalenessMode::Always, ..project.config() };
    let err = generate(&ctx, &forced).unwrap_err();
    assert!(err.to_string().contains("broken.rs:1"), "{err}");

    let after = std::fs::read_to_string(project.path("xtests/tests.rs")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn output_layout_with_support_module() {
    let project = Project::new();
    let ctx = ServiceContext::live();
    let config = HarnessConfig {
        support: vec![SupportModule { name: "id".into(), path: project.path("src/id.rs") }],
        preamble: "#![allow(dead_code)]\n".into(),
        strip_marker: true,
        ..project.config()
    };
    generate(&ctx, &config).unwrap();

    let text = std::fs::read_to_string(project.path("xtests/tests.rs")).unwrap();
    assert!(text.starts_with("// @generated by xtestgen. Do not edit.\n// xtestgen-digest: sha256:"));
    assert!(text.contains("\n#![allow(dead_code)]\n"));
    assert!(text.contains("\nmod id {\nuse super::*;\n\n\npub struct Id;\n"));
    assert!(!text.contains("use crate::runtime::Object;"));

    // Enumeration is sorted by name: id.rs before lib.rs.
    let id_test = text.find("fn id_is_zero_sized()").unwrap();
    let smoke = text.find("fn smoke()").unwrap();
    assert!(id_test < smoke);
    assert!(text.ends_with(
        "pub static TESTS: &[(&str, fn())] = &[\n    (\"id_is_zero_sized\", id_is_zero_sized),\n    (\"smoke\", smoke),\n];\n"
    ));
}

#[test]
fn no_temp_files_left_behind() {
    let project = Project::new();
    let ctx = ServiceContext::live();
    generate(&ctx, &project.config()).unwrap();

    let mut names: Vec<String> = std::fs::read_dir(project.path("xtests"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["tests.rs".to_string(), "tests.rs.lock".to_string()]);
}

#[test]
fn concurrent_runs_generate_once() {
    let project = Project::new();
    set_age(&project.path("src/lib.rs"), -60);
    set_age(&project.path("src/id.rs"), -60);
    let config = Arc::new(project.config());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let config = Arc::clone(&config);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let ctx = ServiceContext::live();
                barrier.wait();
                generate(&ctx, &config).unwrap()
            })
        })
        .collect();
    let outcomes: Vec<Outcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let generated = outcomes.iter().filter(|o| matches!(o, Outcome::Generated { .. })).count();
    assert_eq!(generated, 1, "{outcomes:?}");
    assert!(outcomes.contains(&Outcome::UpToDate), "{outcomes:?}");
}

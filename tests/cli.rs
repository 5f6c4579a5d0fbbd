//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::{Command, Output};

fn run_xtestgen(dir: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_xtestgen");
    Command::new(bin)
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run xtestgen binary")
}

fn write(dir: &Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn sample_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/a.rs", "#[cfg(test)]\nmod tests {\n    #[test]\n    fn foo() {\n    }\n}\n");
    write(
        dir.path(),
        "src/b.rs",
        "#[cfg(test)]\nmod tests {\n    #[test]\n    fn bar() {\n    }\n\n    #[test]\n    fn baz() {\n    }\n}\n",
    );
    dir
}

#[test]
fn generate_writes_registry() {
    let dir = sample_tree();
    let output = run_xtestgen(dir.path(), &["generate", "--root", "src", "--output", "xtests/tests.rs"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("3 tests"), "{stdout}");

    let generated = std::fs::read_to_string(dir.path().join("xtests/tests.rs")).unwrap();
    let entries: Vec<&str> = generated.lines().filter(|l| l.starts_with("    (\"")).collect();
    assert_eq!(entries, vec!["    (\"foo\", foo),", "    (\"bar\", bar),", "    (\"baz\", baz),"]);
}

#[test]
fn second_generate_is_up_to_date() {
    let dir = sample_tree();
    let args = ["generate", "--root", "src", "--output", "tests.rs"];
    assert!(run_xtestgen(dir.path(), &args).status.success());

    let output = run_xtestgen(dir.path(), &args);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("up to date"), "{stdout}");
}

#[test]
fn duplicate_names_exit_with_error() {
    let dir = sample_tree();
    write(dir.path(), "src/c.rs", "#[test]\nfn foo() {\n}\n");
    let output = run_xtestgen(dir.path(), &["generate", "--root", "src", "--output", "tests.rs"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("duplicate test name `foo`"), "{stderr}");
    assert!(stderr.contains("a.rs:3") && stderr.contains("c.rs:1"), "{stderr}");
    assert!(!dir.path().join("tests.rs").exists());
}

#[test]
fn config_file_in_working_directory_is_used() {
    let dir = sample_tree();
    write(
        dir.path(),
        "xtestgen.yaml",
        "root: src\noutput: gen/harness.rs\nregistry: ALL_TESTS\nstrip_marker: true\n",
    );
    let output = run_xtestgen(dir.path(), &["generate"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let generated = std::fs::read_to_string(dir.path().join("gen/harness.rs")).unwrap();
    assert!(generated.contains("pub static ALL_TESTS: &[(&str, fn())] = &["));
    assert!(!generated.contains("#[test]"));
}

#[test]
fn check_fails_until_generated() {
    let dir = sample_tree();
    let check = ["check", "--root", "src", "--output", "tests.rs"];

    let output = run_xtestgen(dir.path(), &check);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("needs regenerating"));

    assert!(run_xtestgen(dir.path(), &["generate", "--root", "src", "--output", "tests.rs"])
        .status
        .success());
    assert!(run_xtestgen(dir.path(), &check).status.success());
}

#[test]
fn list_json_reports_locations() {
    let dir = sample_tree();
    let output = run_xtestgen(dir.path(), &["list", "--root", "src", "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> =
        value.as_array().unwrap().iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["foo", "bar", "baz"]);
    assert_eq!(value[1]["location"]["line"], 3);
}

#[test]
fn output_inside_root_is_not_rescanned() {
    let dir = sample_tree();
    let args = ["generate", "--root", "./src", "--output", "src/gen.rs", "--force"];
    for _ in 0..2 {
        let output = run_xtestgen(dir.path(), &args);
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        assert!(stdout.contains("3 tests"), "{stdout}");
    }
}

#[test]
fn missing_root_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_xtestgen(dir.path(), &["generate", "--root", "nope"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("input tree unreadable"), "{stderr}");
}

#[test]
fn help_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_xtestgen(dir.path(), &["generate", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("--force"));
    assert!(stdout.contains("--staleness"));
}

#[test]
fn invalid_subcommand_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_xtestgen(dir.path(), &["nonsense"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success());
    assert!(stderr.contains("unrecognized subcommand"));
}

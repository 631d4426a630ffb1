// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use runflow::config::{WorkflowFile, load_and_validate, load_from_path, load_workflow, parse_duration};
use runflow::errors::RunflowError;
use runflow_test_utils::builders::ids;
use runflow_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn write_workflow(contents: &str) -> Result<(TempDir, PathBuf), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Runflow.toml");
    fs::write(&path, contents)?;
    Ok((dir, path))
}

fn config_error(contents: &str) -> String {
    let (_dir, path) = write_workflow(contents).unwrap();
    match load_and_validate(&path) {
        Err(RunflowError::ConfigError(msg)) => msg,
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn tasks_are_registered_in_file_order() -> TestResult {
    init_tracing();

    let (_dir, path) = write_workflow(
        r#"
[config]
max_parallel = 3

[[task]]
id = "test"
run = "echo test"
depends_on = ["build"]

[[task]]
id = "build"
run = "echo build"
depends_on = ["fetch", "fetch"]

[[task]]
id = "fetch"
run = "echo fetch"
"#,
    )?;

    let loaded = load_workflow(&path)?;
    assert_eq!(ids(loaded.workflow.list()), vec!["test", "build", "fetch"]);
    assert_eq!(loaded.options.max_parallel.map(|n| n.get()), Some(3));

    let build = loaded.workflow.get("build").unwrap();
    assert_eq!(build.dependencies(), &["fetch".to_string()]);
    Ok(())
}

#[test]
fn missing_config_section_means_unlimited_parallelism() -> TestResult {
    let (_dir, path) = write_workflow(
        r#"
[[task]]
id = "only"
run = "true"
"#,
    )?;

    let loaded = load_workflow(&path)?;
    assert!(loaded.options.max_parallel.is_none());
    assert_eq!(loaded.workflow.len(), 1);
    Ok(())
}

#[test]
fn relative_cwd_is_resolved_against_the_file_directory() -> TestResult {
    let (dir, path) = write_workflow(
        r#"
[[task]]
id = "a"
run = "true"
cwd = "sub"
"#,
    )?;

    let file = load_and_validate(&path)?;
    assert_eq!(file.base_dir.as_deref(), Some(dir.path()));
    assert_eq!(
        file.resolve_cwd(file.task[0].cwd.as_deref().unwrap()),
        dir.path().join("sub")
    );
    Ok(())
}

#[test]
fn custom_shells_join_the_builtin_registry() -> TestResult {
    let (_dir, path) = write_workflow(
        r#"
[config]
default_shell = "zsh"

[shell.zsh]
program = "zsh"
args = ["-c"]

[[task]]
id = "a"
run = "echo hi"

[[task]]
id = "b"
run = "print('hi')"
shell = "python"
"#,
    )?;

    let file = load_and_validate(&path)?;
    let registry = file.shell_registry();

    assert_eq!(registry.default_shell(), "zsh");
    assert_eq!(registry.resolve(None).unwrap().program, "zsh");
    assert_eq!(registry.resolve(None).unwrap().args, vec!["-c"]);
    assert!(registry.contains("bash"));
    assert!(registry.contains("python"));

    let workflow = file.build_workflow(&registry)?;
    assert_eq!(ids(workflow.list()), vec!["a", "b"]);
    Ok(())
}

#[test]
fn duplicate_ids_in_a_file_are_rejected() -> TestResult {
    let (_dir, path) = write_workflow(
        r#"
[[task]]
id = "a"
run = "true"

[[task]]
id = "a"
run = "false"
"#,
    )?;

    assert!(matches!(
        load_workflow(&path),
        Err(RunflowError::DuplicateTask(ref id)) if id == "a"
    ));
    Ok(())
}

#[test]
fn cyclic_file_reports_every_cycle_member() -> TestResult {
    let (_dir, path) = write_workflow(
        r#"
[[task]]
id = "a"
run = "true"
depends_on = ["c"]

[[task]]
id = "b"
run = "true"
depends_on = ["a"]

[[task]]
id = "c"
run = "true"
depends_on = ["b"]

[[task]]
id = "d"
run = "true"
depends_on = ["a"]
"#,
    )?;

    match load_workflow(&path) {
        Err(RunflowError::CyclicalReference(err)) => assert_eq!(err.tasks, vec!["a", "b", "c"]),
        other => panic!("expected cycle error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_dependency_in_a_file_is_rejected() -> TestResult {
    let (_dir, path) = write_workflow(
        r#"
[[task]]
id = "a"
run = "true"
depends_on = ["ghost"]
"#,
    )?;

    match load_workflow(&path) {
        Err(RunflowError::UnknownTask { task, dependency }) => {
            assert_eq!(task, "a");
            assert_eq!(dependency, "ghost");
        }
        other => panic!("expected UnknownTask, got {other:?}"),
    }
    Ok(())
}

#[test]
fn file_level_validation_errors() {
    let msg = config_error("[config]\nmax_parallel = 2\n");
    assert!(msg.contains("at least one [[task]]"), "{msg}");

    let msg = config_error("[config]\nmax_parallel = 0\n\n[[task]]\nid = \"a\"\nrun = \"true\"\n");
    assert!(msg.contains("max_parallel"), "{msg}");

    let msg = config_error("[[task]]\nid = \"  \"\nrun = \"true\"\n");
    assert!(msg.contains("empty id"), "{msg}");

    let msg = config_error("[[task]]\nid = \"a\"\nrun = \"\"\n");
    assert!(msg.contains("empty `run`"), "{msg}");

    let msg = config_error("[[task]]\nid = \"a\"\nrun = \"true\"\ntimeout = \"soon\"\n");
    assert!(msg.contains("invalid timeout"), "{msg}");

    let msg = config_error("[[task]]\nid = \"a\"\nrun = \"true\"\nshell = \"fish\"\n");
    assert!(msg.contains("unknown shell 'fish'"), "{msg}");

    let msg = config_error("[config]\ndefault_shell = \"fish\"\n\n[[task]]\nid = \"a\"\nrun = \"true\"\n");
    assert!(msg.contains("default_shell 'fish'"), "{msg}");

    let msg = config_error("[shell.empty]\nprogram = \"\"\n\n[[task]]\nid = \"a\"\nrun = \"true\"\n");
    assert!(msg.contains("[shell.empty]"), "{msg}");
}

#[test]
fn malformed_toml_and_missing_files_surface_as_errors() -> TestResult {
    let (_dir, path) = write_workflow("[[task]\nid = ")?;
    assert!(matches!(load_from_path(&path), Err(RunflowError::TomlError(_))));

    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("nope.toml");
    assert!(matches!(load_workflow(&missing), Err(RunflowError::IoError(_))));
    Ok(())
}

#[test]
fn validated_file_converts_from_raw() -> TestResult {
    let (_dir, path) = write_workflow("[[task]]\nid = \"a\"\nrun = \"true\"\ntimeout = \"250ms\"\n")?;
    let raw = load_from_path(&path)?;

    let file = WorkflowFile::try_from(raw)?;
    assert!(file.base_dir.is_none());
    assert_eq!(file.task[0].timeout.as_deref(), Some("250ms"));
    Ok(())
}

#[test]
fn parse_duration_accepts_common_units() {
    assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
    assert_eq!(parse_duration("3s"), Ok(Duration::from_secs(3)));
    assert_eq!(parse_duration(" 2m "), Ok(Duration::from_secs(120)));
    assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    assert_eq!(parse_duration("5 S"), Ok(Duration::from_secs(5)));

    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("ms").is_err());
    assert!(parse_duration("3d").is_err());
}

#[test]
fn oversized_durations_are_rejected_instead_of_overflowing() {
    let err = parse_duration("9999999999999999999h").unwrap_err();
    assert!(err.contains("too large"), "{err}");
    assert!(parse_duration("9999999999999999999m").is_err());
    assert_eq!(parse_duration("18446744073709551615s"), Ok(Duration::from_secs(u64::MAX)));

    let msg = config_error("[[task]]\nid = \"a\"\nrun = \"true\"\ntimeout = \"9999999999999999999h\"\n");
    assert!(msg.contains("invalid timeout"), "{msg}");
}

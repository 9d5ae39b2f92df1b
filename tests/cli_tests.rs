#![cfg(feature = "cli")]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const PIPELINE: &str = r#"{"task_id":"A","operation":"create","path":"x.o","attributes":{"t":1}}
{"task_id":"B","operation":"open","path":"x.o","attributes":{"t":1,"size":10}}
{"task_id":"B","operation":"create","path":"y.o","attributes":{"t":1}}
{"task_id":"C","operation":"open","path":"y.o","attributes":{"t":1,"size":10}}
{"task_id":"D","operation":"getattr","path":"/etc/passwd","attributes":{"t":1}}
"#;

const CYCLE: &str = r#"{"task_id":"P","operation":"create","path":"p.out","attributes":{"t":1}}
{"task_id":"Q","operation":"open","path":"p.out","attributes":{"t":1,"size":1}}
{"task_id":"Q","operation":"create","path":"q.out","attributes":{"t":1}}
{"task_id":"P","operation":"open","path":"q.out","attributes":{"t":1,"size":1}}
"#;

const TASKS: &str = "task_id,duration\nA,2\nB,3\nC,1\nD,4\n";

fn run_cli(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cli"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to execute cli")
}

#[test]
fn prints_critical_path_and_writes_report() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("events.jsonl"), PIPELINE).unwrap();
    fs::write(dir.path().join("tasks.csv"), TASKS).unwrap();

    let output = run_cli(
        &[
            "--events",
            "events.jsonl",
            "--tasks",
            "tasks.csv",
            "--json",
            "report.json",
            "--csv",
            "report.csv",
        ],
        dir.path(),
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("Graph: 4 tasks, 2 files, 4 edges"), "{stdout}");
    assert!(stdout.contains("Critical path: A -> x.o -> B -> y.o -> C"), "{stdout}");
    assert!(stdout.contains("Makespan: 6.000"), "{stdout}");
    assert!(dir.path().join("report.json").exists());
    assert!(dir.path().join("report.csv").exists());
}

#[test]
fn cycle_exits_with_code_two() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("events.jsonl"), CYCLE).unwrap();

    let output = run_cli(&["--events", "events.jsonl"], dir.path());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout.contains("Dependency cycle detected"), "{stdout}");
}

#[test]
fn missing_event_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = run_cli(&["--events", "nope.jsonl"], dir.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

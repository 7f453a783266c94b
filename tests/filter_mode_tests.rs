// tests/filter_mode_tests.rs
use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::process::Stdio;
use std::time::{Duration, Instant};

#[test]
fn test_identity_template_passes_lines_through() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--stdin")
        .arg("{input}\n")
        .write_stdin("hello\n  indented line\t\nlast line without newline")
        .assert()
        .success()
        .stdout("hello\n  indented line\t\nlast line without newline\n");
}

#[test]
fn test_empty_input_produces_nothing() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.write_stdin("").assert().success().stdout("");
}

#[test]
fn test_default_template_prefixes_timestamp() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.write_stdin("alpha\nbeta\n")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\S* alpha\n\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\S* beta\n$").unwrap());
}

#[test]
fn test_line_count_is_preserved() {
    let input: String = (0..1000).map(|i| format!("line {}\n", i)).collect();
    let output = Command::cargo_bin("prefixout")
        .unwrap()
        .arg("--stdin")
        .arg("{epoch} {input}\n")
        .write_stdin(input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1000);
    assert!(stdout.lines().last().unwrap().ends_with(" line 999"));
}

#[test]
fn test_escaped_newline_in_template() {
    // What a shell user types: a backslash followed by n
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--stdin")
        .arg(r"> {input}\n")
        .write_stdin("a\nb\n")
        .assert()
        .success()
        .stdout("> a\n> b\n");
}

#[test]
fn test_timestamp_pattern_is_applied() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--timestamp")
        .arg("%s")
        .arg("--stdin")
        .arg("{timestamp}|{epoch}\n")
        .write_stdin("x\n")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^(\d+)\|\d+\n$").unwrap());
}

#[test]
fn test_literal_timestamp_pattern() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--timestamp")
        .arg("100%% [stamp]")
        .write_stdin("x\n")
        .assert()
        .success()
        .stdout("100% [stamp] x\n");
}

#[test]
fn test_format_spec_and_escaped_braces() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--stdin")
        .arg("{{{input:>5}}}\n")
        .write_stdin("ab\n")
        .assert()
        .success()
        .stdout("{   ab}\n");
}

#[test]
fn test_unknown_field_fails() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--stdin")
        .arg("{nonexistent}\n")
        .write_stdin("one\ntwo\n")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("prefixout: input pump failed"))
        .stderr(predicate::str::contains("unknown field 'nonexistent'"));
}

#[test]
fn test_pump_failure_reported_once_with_debug() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    let assert = cmd
        .arg("--debug")
        .arg("--stdin")
        .arg("{nonexistent}\n")
        .write_stdin("one\n")
        .assert()
        .code(1);

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert_eq!(stderr.matches("pump failed").count(), 1, "stderr: {}", stderr);
    assert!(!stderr.contains("prefixout: error:"), "stderr: {}", stderr);
}

#[test]
fn test_malformed_template_fails() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--stdin")
        .arg("{input\n")
        .write_stdin("one\n")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("malformed template"));
}

#[test]
fn test_invalid_timestamp_pattern_is_usage_error() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--timestamp")
        .arg("%Q")
        .write_stdin("one\n")
        .assert()
        .code(2)
        .stdout("")
        .stderr(predicate::str::contains("invalid timestamp pattern '%Q'"));
}

#[test]
fn test_debug_statistics_on_stderr() {
    let mut cmd = Command::cargo_bin("prefixout").unwrap();
    cmd.arg("--debug")
        .arg("--stdin")
        .arg("{input}\n")
        .write_stdin("a\nb\n")
        .assert()
        .success()
        .stdout("a\nb\n")
        .stderr(predicate::str::contains("Final statistics:"))
        .stderr(predicate::str::contains("input: 2 lines read, 2 written, 0 discarded"));
}

#[test]
fn test_format_failure_exits_while_stdin_stays_open() {
    let mut child = std::process::Command::cargo_bin("prefixout")
        .unwrap()
        .arg("--stdin")
        .arg("{nonexistent}\n")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    // Keep the write end open, like a terminal or `tail -f`
    let mut stdin = child.stdin.take().unwrap();
    stdin.write_all(b"one\n").unwrap();
    stdin.flush().unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("prefixout still running after its pump failed");
        }
        std::thread::sleep(Duration::from_millis(20));
    };
    drop(stdin);

    assert_eq!(status.code(), Some(1));
    let mut stderr = String::new();
    child.stderr.take().unwrap().read_to_string(&mut stderr).unwrap();
    assert!(stderr.contains("unknown field 'nonexistent'"), "stderr: {}", stderr);
}

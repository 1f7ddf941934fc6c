use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn javelin() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("javelin"));
    cmd.env_remove("JAVELIN_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_mentions_core_commands() {
    javelin().arg("--help").assert().success().stdout(
        predicate::str::contains("complete")
            .and(predicate::str::contains("select"))
            .and(predicate::str::contains("dump")),
    );
}

#[test]
fn complete_with_caret_marker() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("A.java");
    file.write_str("class A {\n  void f() {\n    list.si|\n  }\n}\n")
        .unwrap();

    javelin()
        .arg("complete")
        .arg(file.path())
        .args(["--caret-marker", "|", "--mode", "method"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("marker: <CompleteOnName:list.si>")
                .and(predicate::str::contains("identifier: si")),
        );
}

#[test]
fn complete_json_reports_summary() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("A.java");
    let source = "class A { String na";
    file.write_str(source).unwrap();

    let output = javelin()
        .arg("complete")
        .arg(file.path())
        .args(["--offset", &source.len().to_string(), "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["marker"], "<CompleteOnFieldName:na>");
    assert_eq!(v["replaced_source"], "na");
}

#[test]
fn config_file_selects_the_default_mode() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("A.java");
    file.write_str("class A { void f() { fo| } }").unwrap();

    javelin()
        .arg("complete")
        .arg(file.path())
        .args(["--caret-marker", "|"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marker: <NONE>"));

    let config = temp.child("javelin.toml");
    config
        .write_str("[parser]\nmode = \"method\"\n\n[logging]\nstderr = false\n")
        .unwrap();
    javelin()
        .arg("--config")
        .arg(config.path())
        .arg("complete")
        .arg(file.path())
        .args(["--caret-marker", "|"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marker: <CompleteOnName:fo>"));

    javelin()
        .env("JAVELIN_CONFIG", config.path())
        .arg("complete")
        .arg(file.path())
        .args(["--caret-marker", "|"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marker: <CompleteOnName:fo>"));
}

#[test]
fn select_prints_marker_and_parent() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("A.java");
    let source = "class A { int f(int count) { return count + 1; } }";
    file.write_str(source).unwrap();
    let start = source.rfind("count").unwrap();

    javelin()
        .arg("select")
        .arg(file.path())
        .args(["--start", &start.to_string(), "--end", &(start + 5).to_string()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("marker: <SelectOnName:count>")
                .and(predicate::str::contains("parent: <SelectOnName:count> + 1")),
        );
}

#[test]
fn dump_skips_method_bodies() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("A.java");
    file.write_str("class A { void f() { int hidden = 1; } }")
        .unwrap();

    javelin()
        .arg("dump")
        .arg(file.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("class A {\n  A() {\n  }\n  void f() {\n  }\n}\n")
                .and(predicate::str::contains("hidden").not()),
        );
}

#[test]
fn errors_exit_with_code_two() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("A.java");
    file.write_str("class A {}").unwrap();

    javelin()
        .arg("complete")
        .arg(file.path())
        .args(["--offset", "99"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("past the end"));

    javelin()
        .arg("complete")
        .arg(temp.child("Missing.java").path())
        .args(["--offset", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read"));

    let config = temp.child("bad.toml");
    config.write_str("[parser]\nmood = \"diet\"\n").unwrap();
    javelin()
        .arg("--config")
        .arg(config.path())
        .arg("dump")
        .arg(file.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load config"));
}

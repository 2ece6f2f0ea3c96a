use assert_cmd::Command;

#[test]
fn cli_help_runs() {
    let mut cmd = Command::cargo_bin("adr-causality").expect("binary exists");
    cmd.arg("--help").assert().success();
}

#[test]
fn seed_without_inputs_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cmd = Command::cargo_bin("adr-causality").expect("binary exists");
    cmd.current_dir(dir.path())
        .env("DATABASE_PATH", dir.path().join("adr.sqlite3"))
        .arg("seed")
        .assert()
        .failure();
}

use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use assert_cmd::Command;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated FlatMoney home for one test.
pub fn setup_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// `flatmoney_cli` pointed at `home`, with colours off.
pub fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("flatmoney_cli").expect("binary built");
    cmd.env("FLATMONEY_HOME", home)
        .env("NO_COLOR", "1");
    cmd
}

/// Runs `add` and returns the new record id printed in the success message.
pub fn add_record(home: &Path, args: &[&str]) -> String {
    let output = cli(home)
        .arg("add")
        .args(args)
        .output()
        .expect("run add");
    assert!(output.status.success(), "add failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .rsplit_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(id, _)| id.to_string())
        .expect("record id in output")
}

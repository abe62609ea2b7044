#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;

pub fn tagweave_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tagweave").unwrap();
    cmd.env_remove("TAGWEAVE_ROOT");
    cmd.env_remove("TAGWEAVE_LOG");
    cmd.env_remove("TAGWEAVE_AUTHOR");
    cmd
}

/// Command running inside the workspace at `root`
pub fn tagweave_in(root: &Path) -> Command {
    let mut cmd = tagweave_cmd();
    cmd.current_dir(root);
    cmd
}

/// Initialize a workspace and return its tagset uuid for `name`
pub fn init_with_tagset(root: &Path, name: &str) -> String {
    tagweave_cmd().arg("init").arg(root).assert().success();
    let output = tagweave_in(root)
        .args(["tagset", "new", name])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .trim()
        .rsplit_once('(')
        .and_then(|(_, rest)| rest.strip_suffix(')'))
        .unwrap()
        .to_string()
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tempfile::tempdir;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: ExitStatus,
}

/// Write a script into a temp dir and run it through the violet binary.
pub fn run_vi_source(src: &str) -> CommandOutput {
    let dir = tempdir().expect("create temp dir");
    let script_path = dir.path().join("script.vi");
    fs::write(&script_path, src).expect("write script");
    run_script(&script_path, &[])
}

pub fn run_vi_file<P: AsRef<Path>>(path: P) -> CommandOutput {
    run_script(path.as_ref(), &[])
}

pub fn run_vi_source_with_flags(src: &str, flags: &[&str]) -> CommandOutput {
    let dir = tempdir().expect("create temp dir");
    let script_path = dir.path().join("script.vi");
    fs::write(&script_path, src).expect("write script");
    run_script(&script_path, flags)
}

fn run_script(path: &Path, flags: &[&str]) -> CommandOutput {
    let mut command = Command::new("cargo");
    command
        .arg("run")
        .arg("--quiet")
        .arg("--bin")
        .arg("violet")
        .arg("--");
    for flag in flags {
        command.arg(flag);
    }
    command.arg(path);
    execute(command)
}

pub fn run_test_sweep() -> CommandOutput {
    let mut command = Command::new("cargo");
    command
        .arg("run")
        .arg("--quiet")
        .arg("--bin")
        .arg("violet")
        .arg("--")
        .arg("--test");
    execute(command)
}

fn execute(mut command: Command) -> CommandOutput {
    let output = command
        .current_dir(crate_root())
        .env_remove("VIOLET_DEBUG")
        .output()
        .expect("failed to run command");
    CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status,
    }
}

pub fn crate_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

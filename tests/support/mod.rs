/*!
Test support helpers shared across integration tests.

- have_git(): check git availability on PATH
- init_repo_with_default_user(dir): initialize a git repo on `master` with a local identity
- init_bare_remote(dir): create a bare repository to push into
- git_stdout(dir, args): trimmed stdout of a git command

These helpers do not print skip messages themselves so tests can keep their own
"skipping: ..." outputs.
*/

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Return true if `git` is available on PATH.
#[allow(dead_code)]
pub fn have_git() -> bool {
    Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[allow(dead_code)]
fn git_quiet(dir: &Path, args: &[&str]) -> io::Result<()> {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("git {} failed: {status}", args.join(" "))))
    }
}

/// Initialize a git repository at `dir` on branch `master` and set a local identity.
/// Idempotent: safe to call when the repo already exists.
#[allow(dead_code)]
pub fn init_repo_with_default_user(dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    git_quiet(dir, &["init"])?;
    git_quiet(dir, &["symbolic-ref", "HEAD", "refs/heads/master"])?;
    git_quiet(dir, &["config", "user.name", "Push Test"])?;
    git_quiet(dir, &["config", "user.email", "push-test@example.com"])?;
    git_quiet(dir, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// Create a bare repository at `dir` and return its path.
#[allow(dead_code)]
pub fn init_bare_remote(dir: &Path) -> io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    git_quiet(dir, &["init", "--bare"])?;
    Ok(dir.to_path_buf())
}

/// Trimmed stdout of `git <args>` in `dir`; empty on failure.
#[allow(dead_code)]
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .stderr(Stdio::null())
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

/// Write `git_config.toml` in `dir` with the given TOML text and return its path.
#[allow(dead_code)]
pub fn write_config(dir: &Path, text: &str) -> PathBuf {
    let p = dir.join("git_config.toml");
    std::fs::write(&p, text).expect("write config");
    p
}

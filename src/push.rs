//! Stage, commit and push pipeline.
//!
//! `push` is the single entry point for every push, interactive or scheduled:
//! 1. snapshot and log the change set;
//! 2. stop early when there is nothing to commit (unless forced);
//! 3. `git add .` then `git commit` with a timestamped message (skipped when forced);
//! 4. log remote URL and ahead/behind counts;
//! 5. `git push origin <branch>`, with a per-invocation SSL override and `-f` when forced.

use std::path::Path;

use chrono::{Local, NaiveDateTime};

use crate::config::Configuration;
use crate::git::inspect::RepoInspector;
use crate::git::status::ChangeSet;
use crate::git::Git;
use crate::proxy;
use crate::util::CommandRunner;

pub const COMMIT_LABEL: &str = "Auto commit at";

pub fn commit_message(now: NaiveDateTime) -> String {
    format!("{COMMIT_LABEL} {}", now.format("%Y-%m-%d %H:%M:%S"))
}

/// Arguments for the push step. The SSL override is a `-c` flag so it never reaches
/// git's persistent configuration.
pub fn push_args(branch: &str, force: bool, disable_ssl_verify: bool) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    if disable_ssl_verify {
        args.push("-c".to_string());
        args.push("http.sslVerify=false".to_string());
    }
    args.extend(["push", "origin", branch].map(String::from));
    if force {
        args.push("-f".to_string());
    }
    args
}

pub struct PushOrchestrator<'g, 'r> {
    git: &'g Git<'r>,
    disable_ssl_verify: bool,
}

impl<'g, 'r> PushOrchestrator<'g, 'r> {
    /// Settings are taken from `cfg` as it is at construction; build one per operation.
    pub fn new(git: &'g Git<'r>, cfg: &Configuration) -> Self {
        Self {
            git,
            disable_ssl_verify: cfg.proxy.disable_ssl_verify,
        }
    }

    /// Returns whether the push succeeded; true without doing anything when there is
    /// nothing to commit and `force` is false.
    pub fn push(&self, path: &Path, branch: &str, force: bool) -> bool {
        let inspector = RepoInspector::new(self.git);

        tracing::info!("checking repository status");
        let changes = inspector.change_set(path);
        log_change_set(&changes);

        if changes.is_clean() && !force {
            tracing::info!("nothing to commit");
            return true;
        }

        if !force && !self.stage_and_commit(path) {
            return false;
        }

        if let Some(url) = inspector.remote_url(path) {
            tracing::info!(remote = %url, "pushing to remote");
        }
        let (ahead, behind) = inspector.ahead_behind(path, branch);
        if ahead > 0 {
            tracing::info!("local is ahead of remote by {ahead} commit(s)");
        }
        if behind > 0 {
            tracing::info!("local is behind remote by {behind} commit(s)");
        }

        tracing::info!(branch, "pushing");
        if force {
            tracing::warn!("force push mode");
        }
        let args = push_args(branch, force, self.disable_ssl_verify);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let res = self.git.run(Some(path), &args);
        if !res.success() {
            tracing::error!(code = res.code, "push failed: {}", res.stderr.trim());
            return false;
        }
        for out in [res.stdout.trim(), res.stderr.trim()] {
            if !out.is_empty() {
                tracing::info!("push output:\n{out}");
            }
        }
        tracing::info!(branch, "pushed to remote");
        true
    }

    fn stage_and_commit(&self, path: &Path) -> bool {
        tracing::info!("staging changes");
        let add = self.git.run(Some(path), &["add", "."]);
        if !add.success() {
            tracing::error!(code = add.code, "failed to stage changes: {}", add.stderr.trim());
            return false;
        }
        if let Some(stat) = self.git.stdout_in(path, &["diff", "--cached", "--stat"]) {
            tracing::info!("staged:\n{stat}");
        }

        let message = commit_message(Local::now().naive_local());
        tracing::info!(message = %message, "committing");
        let commit = self.git.run(Some(path), &["commit", "-m", message.as_str()]);
        if !commit.success() {
            // git reports "nothing to commit" on stdout
            let detail = if commit.stderr.trim().is_empty() {
                commit.stdout.trim()
            } else {
                commit.stderr.trim()
            };
            tracing::error!(code = commit.code, "commit failed: {detail}");
            return false;
        }
        tracing::info!("committed: {}", commit.stdout.trim());
        true
    }
}

fn log_change_set(changes: &ChangeSet) {
    if !changes.unstaged.is_empty() {
        tracing::info!("unstaged changes:");
        for stat in &changes.unstaged {
            tracing::info!("  {stat}");
        }
    }
    if !changes.staged.is_empty() {
        tracing::info!("staged changes:");
        for stat in &changes.staged {
            tracing::info!("  {stat}");
        }
    }
    if !changes.untracked.is_empty() {
        tracing::info!("untracked files:");
        for path in &changes.untracked {
            tracing::info!("  {path}");
        }
    }
    if changes.is_clean() {
        tracing::info!("no new changes found");
        return;
    }
    tracing::info!("status:");
    for (label, path) in changes.classify() {
        tracing::info!("  {label}: {path}");
    }
}

/// Push the configured work directory: the path shared by manual and scheduled pushes.
///
/// Runs under the proxy environment derived from `cfg` and refuses directories that are
/// not repositories.
pub fn push_configured(cfg: &Configuration, runner: &dyn CommandRunner, force: bool) -> bool {
    let git = Git::new(runner).with_env(proxy::environment(cfg));
    let work_dir = cfg.git.work_dir.as_path();
    if !RepoInspector::new(&git).check_repository(work_dir) {
        return false;
    }
    PushOrchestrator::new(&git, cfg).push(work_dir, &cfg.git.branch, force)
}

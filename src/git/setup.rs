//! Repository preparation: `git init`, wiring `origin`, and the global commit identity.

use std::path::Path;

use super::inspect::{self, RepoInspector};
use super::Git;
use crate::config::Configuration;

/// Global identity keys, in the order they are checked.
pub const IDENTITY_KEYS: [&str; 2] = ["user.name", "user.email"];

/// What `sync_remote` did to reconcile the repository's `origin` with the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSync {
    /// `origin` was missing and was added from the configured URL.
    Added(String),
    /// The config had no URL; the repository's `origin` URL was copied into it.
    Adopted(String),
    Unchanged,
    AddFailed(String),
}

pub fn init(git: &Git<'_>, dir: &Path) -> Result<(), String> {
    let res = git.run(Some(dir), &["init"]);
    if res.success() {
        tracing::info!(path = %dir.display(), "initialized git repository");
        Ok(())
    } else {
        let err = res.stderr.trim().to_string();
        tracing::error!(path = %dir.display(), "git init failed: {err}");
        Err(err)
    }
}

/// Reconcile `origin` and `cfg.git.remote_url`. Only `Adopted` modifies `cfg`; the caller
/// decides whether to persist it.
pub fn sync_remote(git: &Git<'_>, dir: &Path, cfg: &mut Configuration) -> RemoteSync {
    let current = RepoInspector::new(git).remote_url(dir);
    let configured = cfg.git.remote_url.trim().to_string();
    match (current, configured.is_empty()) {
        (None, false) => {
            let res = git.run(Some(dir), &["remote", "add", "origin", configured.as_str()]);
            if res.success() {
                tracing::info!(remote = %configured, "added remote origin");
                RemoteSync::Added(configured)
            } else {
                let err = res.stderr.trim().to_string();
                tracing::error!(remote = %configured, "failed to add remote: {err}");
                RemoteSync::AddFailed(err)
            }
        }
        (Some(url), true) => {
            tracing::info!(remote = %url, "using remote URL from the repository");
            cfg.git.remote_url = url.clone();
            RemoteSync::Adopted(url)
        }
        _ => RemoteSync::Unchanged,
    }
}

/// Make `dir` a repository wired to the configured remote, initializing it when needed.
pub fn ensure_repository(
    git: &Git<'_>,
    dir: &Path,
    cfg: &mut Configuration,
) -> Result<RemoteSync, String> {
    if inspect::exists(dir) {
        tracing::info!(path = %dir.display(), "directory is already a git repository");
    } else {
        init(git, dir)?;
    }
    Ok(sync_remote(git, dir, cfg))
}

/// Value of a global git setting; absent when unset or empty.
pub fn global_config_get(git: &Git<'_>, key: &str) -> Option<String> {
    git.run(None, &["config", "--global", key])
        .stdout_if_success()
        .filter(|v| !v.is_empty())
}

pub fn global_config_set(git: &Git<'_>, key: &str, value: &str) -> Result<(), String> {
    let res = git.run(None, &["config", "--global", key, value]);
    if res.success() {
        Ok(())
    } else {
        Err(res.stderr.trim().to_string())
    }
}

/// Identity keys with no global value.
pub fn missing_identity(git: &Git<'_>) -> Vec<&'static str> {
    IDENTITY_KEYS
        .into_iter()
        .filter(|key| global_config_get(git, key).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{CommandResult, ScriptedRunner};

    #[test]
    fn test_sync_adds_origin_from_config() {
        let runner = ScriptedRunner::new();
        runner.respond(&["get-url"], CommandResult::failed(2, "error: No such remote 'origin'"));
        let git = Git::new(&runner);
        let mut cfg = Configuration::default();
        cfg.git.remote_url = "https://example.com/me/notes.git".to_string();

        let out = sync_remote(&git, Path::new("/repo"), &mut cfg);
        assert_eq!(out, RemoteSync::Added("https://example.com/me/notes.git".to_string()));
        assert_eq!(
            runner.count(&["remote", "add", "origin", "https://example.com/me/notes.git"]),
            1
        );
    }

    #[test]
    fn test_sync_adopts_repository_origin_when_config_is_empty() {
        let runner = ScriptedRunner::new();
        runner.respond(&["get-url"], CommandResult::ok("git@example.com:me/notes.git\n"));
        let git = Git::new(&runner);
        let mut cfg = Configuration::default();

        let out = sync_remote(&git, Path::new("/repo"), &mut cfg);
        assert_eq!(out, RemoteSync::Adopted("git@example.com:me/notes.git".to_string()));
        assert_eq!(cfg.git.remote_url, "git@example.com:me/notes.git");
        assert_eq!(runner.count(&["remote", "add"]), 0);
    }

    #[test]
    fn test_sync_leaves_both_alone_when_both_present() {
        let runner = ScriptedRunner::new();
        runner.respond(&["get-url"], CommandResult::ok("https://a/x.git\n"));
        let git = Git::new(&runner);
        let mut cfg = Configuration::default();
        cfg.git.remote_url = "https://b/y.git".to_string();
        assert_eq!(sync_remote(&git, Path::new("/repo"), &mut cfg), RemoteSync::Unchanged);
        assert_eq!(cfg.git.remote_url, "https://b/y.git");
    }

    #[test]
    fn test_ensure_repository_initializes_plain_directory() {
        let td = tempfile::tempdir().expect("tmpdir");
        let runner = ScriptedRunner::new();
        runner.respond(&["get-url"], CommandResult::failed(2, ""));
        let git = Git::new(&runner);
        let mut cfg = Configuration::default();

        let out = ensure_repository(&git, td.path(), &mut cfg).expect("ensure");
        assert_eq!(out, RemoteSync::Unchanged);
        assert_eq!(runner.calls()[0], vec!["init"]);
    }

    #[test]
    fn test_ensure_repository_reports_init_failure() {
        let td = tempfile::tempdir().expect("tmpdir");
        let runner = ScriptedRunner::new();
        runner.respond(&["init"], CommandResult::failed(128, "fatal: cannot mkdir"));
        let git = Git::new(&runner);
        let err = ensure_repository(&git, td.path(), &mut Configuration::default())
            .expect_err("init should fail");
        assert_eq!(err, "fatal: cannot mkdir");
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_missing_identity_treats_empty_as_unset() {
        let runner = ScriptedRunner::new();
        runner
            .respond(&["user.name"], CommandResult::ok("\n"))
            .respond(&["user.email"], CommandResult::ok("me@example.com\n"));
        let git = Git::new(&runner);
        assert_eq!(missing_identity(&git), vec!["user.name"]);
        assert_eq!(global_config_get(&git, "user.email").as_deref(), Some("me@example.com"));
    }
}

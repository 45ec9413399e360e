use std::path::Path;

use super::status::{self, ChangeSet};
use super::Git;

/// True when `path` holds repository metadata (`.git`).
pub fn exists(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Read-only repository queries. Every query degrades to an empty/absent result when the
/// underlying command fails; none of them aborts the caller.
pub struct RepoInspector<'g, 'r> {
    git: &'g Git<'r>,
}

impl<'g, 'r> RepoInspector<'g, 'r> {
    pub fn new(git: &'g Git<'r>) -> Self {
        Self { git }
    }

    pub fn exists(&self, path: &Path) -> bool {
        exists(path)
    }

    /// `git remote -v`, absent when nothing is configured.
    pub fn remote_info(&self, path: &Path) -> Option<String> {
        self.git.stdout_in(path, &["remote", "-v"])
    }

    /// URL of `origin`.
    pub fn remote_url(&self, path: &Path) -> Option<String> {
        self.git.stdout_in(path, &["remote", "get-url", "origin"])
    }

    /// Empty on failure or detached HEAD.
    pub fn current_branch(&self, path: &Path) -> String {
        self.git
            .stdout_in(path, &["branch", "--show-current"])
            .unwrap_or_default()
    }

    pub fn last_commit_summary(&self, path: &Path) -> Option<String> {
        self.git.stdout_in(path, &["log", "-1", "--oneline"])
    }

    pub fn change_set(&self, path: &Path) -> ChangeSet {
        ChangeSet {
            unstaged: status::parse_numstat(&self.query(path, &["diff", "--numstat"])),
            staged: status::parse_numstat(&self.query(path, &["diff", "--cached", "--numstat"])),
            untracked: status::parse_path_list(
                &self.query(path, &["ls-files", "--others", "--exclude-standard"]),
            ),
            status: status::parse_porcelain(&self.query(path, &["status", "--porcelain"])),
        }
    }

    /// `(ahead, behind)` relative to `origin/<branch>`; `(0, 0)` when the query fails, e.g.
    /// before the remote branch exists.
    pub fn ahead_behind(&self, path: &Path, branch: &str) -> (u64, u64) {
        let range = format!("origin/{branch}...HEAD");
        let res = self
            .git
            .run(Some(path), &["rev-list", "--left-right", "--count", range.as_str()]);
        if !res.success() {
            tracing::debug!(branch, stderr = %res.stderr.trim(), "ahead/behind query failed");
            return (0, 0);
        }
        status::parse_left_right(&res.stdout).unwrap_or((0, 0))
    }

    /// Pre-flight report: logs remote, branch and last commit. False when `path` is not a
    /// repository.
    pub fn check_repository(&self, path: &Path) -> bool {
        tracing::info!(path = %path.display(), "checking repository");
        if !self.exists(path) {
            tracing::error!(path = %path.display(), "not a git repository");
            return false;
        }
        match self.remote_info(path) {
            Some(remotes) => tracing::info!("remotes:\n{remotes}"),
            None => tracing::warn!("no remote configured"),
        }
        let branch = self.current_branch(path);
        if !branch.is_empty() {
            tracing::info!(branch = %branch, "current branch");
        }
        if let Some(last) = self.last_commit_summary(path) {
            tracing::info!(commit = %last, "last commit");
        }
        true
    }

    /// Raw stdout of a query, empty when it exits non-zero.
    fn query(&self, path: &Path, args: &[&str]) -> String {
        let res = self.git.run(Some(path), args);
        if res.success() {
            res.stdout
        } else {
            tracing::debug!(args = ?args, code = res.code, "query failed; treating as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{CommandResult, ScriptedRunner};

    #[test]
    fn test_change_set_degrades_per_query() {
        let runner = ScriptedRunner::new();
        runner
            .respond(&["diff", "--cached"], CommandResult::failed(128, "fatal: bad"))
            .respond(&["diff", "--numstat"], CommandResult::ok("1\t2\ta.txt\n"))
            .respond(&["ls-files"], CommandResult::ok("b.txt\n"))
            .respond(&["status", "--porcelain"], CommandResult::ok(" M a.txt\n?? b.txt\n"));
        let git = Git::new(&runner);
        let cs = RepoInspector::new(&git).change_set(Path::new("/repo"));

        assert_eq!(cs.unstaged.len(), 1);
        assert!(cs.staged.is_empty());
        assert_eq!(cs.untracked, vec!["b.txt".to_string()]);
        assert_eq!(cs.status.len(), 2);
        assert_eq!(runner.calls().len(), 4);
    }

    #[test]
    fn test_ahead_behind_zero_when_remote_branch_missing() {
        let runner = ScriptedRunner::new();
        runner.respond(
            &["rev-list"],
            CommandResult::failed(128, "fatal: ambiguous argument 'origin/main...HEAD'"),
        );
        let git = Git::new(&runner);
        assert_eq!(RepoInspector::new(&git).ahead_behind(Path::new("/repo"), "main"), (0, 0));
        assert_eq!(
            runner.calls()[0],
            vec!["rev-list", "--left-right", "--count", "origin/main...HEAD"]
        );
    }

    #[test]
    fn test_ahead_behind_parses_counts() {
        let runner = ScriptedRunner::new();
        runner.respond(&["rev-list"], CommandResult::ok("1\t3\n"));
        let git = Git::new(&runner);
        assert_eq!(RepoInspector::new(&git).ahead_behind(Path::new("/repo"), "master"), (3, 1));
    }

    #[test]
    fn test_queries_absent_on_failure() {
        let runner = ScriptedRunner::new();
        runner
            .respond(&["remote"], CommandResult::failed(2, "error: No such remote"))
            .respond(&["branch"], CommandResult::failed(128, "fatal"))
            .respond(&["log"], CommandResult::ok(""));
        let git = Git::new(&runner);
        let inspector = RepoInspector::new(&git);
        let p = Path::new("/repo");
        assert_eq!(inspector.remote_info(p), None);
        assert_eq!(inspector.remote_url(p), None);
        assert_eq!(inspector.current_branch(p), "");
        assert_eq!(inspector.last_commit_summary(p), None);
    }
}

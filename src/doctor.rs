//! Environment pre-flight: git presence, commit identity, connectivity, and the full
//! "run auto push" sequence built on top of them. `run_doctor` prints a read-only report.

use std::path::Path;

use crate::config::Configuration;
use crate::errors::EnvironmentError;
use crate::git::inspect::RepoInspector;
use crate::git::{setup, Git};
use crate::proxy::{self, ProxyManager};
use crate::push::PushOrchestrator;
use crate::ui::prompt::Prompt;
use crate::util::CommandRunner;

/// `git --version` output on success.
pub fn check_git_installed(git: &Git<'_>) -> Result<String, EnvironmentError> {
    let res = git.run(None, &["--version"]);
    if let Some(version) = res.stdout_if_success() {
        tracing::info!(version = %version, "git found");
        return Ok(version);
    }
    if which::which("git").is_err() {
        tracing::error!("git is not installed or not on PATH");
        return Err(EnvironmentError::GitMissing);
    }
    tracing::error!(code = res.code, "git version check failed: {}", res.stderr.trim());
    Err(EnvironmentError::GitVersion(res.stderr.trim().to_string()))
}

/// Prompt for and store any missing global identity key. An empty answer is an error.
pub fn ensure_identity(git: &Git<'_>, prompt: &mut dyn Prompt) -> Result<(), EnvironmentError> {
    for key in setup::missing_identity(git) {
        tracing::warn!(key, "git identity not configured");
        let value = prompt.ask(&format!("Enter git {key}: "));
        if value.is_empty() {
            return Err(EnvironmentError::Identity {
                key,
                detail: "no value entered".to_string(),
            });
        }
        setup::global_config_set(git, key, &value)
            .map_err(|detail| EnvironmentError::Identity { key, detail })?;
        tracing::info!(key, value = %value, "git identity stored");
    }
    tracing::info!("git configuration check complete");
    Ok(())
}

/// git presence plus identity; returns the git version.
pub fn check_environment(git: &Git<'_>, prompt: &mut dyn Prompt) -> Result<String, EnvironmentError> {
    let version = check_git_installed(git)?;
    ensure_identity(git, prompt)?;
    Ok(version)
}

/// The full "run auto push" sequence against the live probe target.
pub fn run_auto_push(
    cfg: &Configuration,
    runner: &dyn CommandRunner,
    prompt: &mut dyn Prompt,
    force: bool,
) -> Result<bool, EnvironmentError> {
    run_auto_push_with(cfg, runner, prompt, force, &proxy::probe)
}

/// Work dir exists, environment checks pass, proxy is applied, remote is reachable and the
/// work dir is a repository; then the push. Any failed step returns an error and nothing
/// after it runs. The returned flag is the push outcome.
pub fn run_auto_push_with(
    cfg: &Configuration,
    runner: &dyn CommandRunner,
    prompt: &mut dyn Prompt,
    force: bool,
    probe: &dyn Fn(&Configuration) -> bool,
) -> Result<bool, EnvironmentError> {
    let work_dir = cfg.git.work_dir.as_path();
    if !work_dir.exists() {
        tracing::error!(path = %work_dir.display(), "work directory does not exist");
        return Err(EnvironmentError::WorkDirMissing(work_dir.to_path_buf()));
    }

    let bare = Git::new(runner);
    check_environment(&bare, prompt)?;
    let env = ProxyManager::new(&bare).apply(cfg);

    if !probe(cfg) {
        return Err(EnvironmentError::Unreachable);
    }

    let git = Git::new(runner).with_env(env);
    if !RepoInspector::new(&git).check_repository(work_dir) {
        return Err(EnvironmentError::NotARepository(work_dir.to_path_buf()));
    }
    Ok(PushOrchestrator::new(&git, cfg).push(work_dir, &cfg.git.branch, force))
}

/// One line of the doctor report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub label: &'static str,
    pub value: String,
    pub ok: bool,
}

impl Check {
    fn new(label: &'static str, value: impl Into<String>, ok: bool) -> Self {
        Self {
            label,
            value: value.into(),
            ok,
        }
    }
}

/// Read-only checks: nothing is prompted for and git's global config is left alone.
pub fn collect_checks(
    cfg: &Configuration,
    config_path: &Path,
    runner: &dyn CommandRunner,
    reachable: Option<bool>,
) -> Vec<Check> {
    let git = Git::new(runner).with_env(proxy::environment(cfg));
    let mut checks = Vec::new();

    match which::which("git") {
        Ok(p) => checks.push(Check::new("git path", p.display().to_string(), true)),
        Err(_) => checks.push(Check::new("git path", "(not found)", false)),
    }
    match git.run(None, &["--version"]).stdout_if_success() {
        Some(v) => checks.push(Check::new("git version", v, true)),
        None => checks.push(Check::new("git version", "(unavailable)", false)),
    }
    for key in setup::IDENTITY_KEYS {
        let label = if key == "user.name" { "git user.name" } else { "git user.email" };
        match setup::global_config_get(&git, key) {
            Some(v) => checks.push(Check::new(label, v, true)),
            None => checks.push(Check::new(label, "(not set)", false)),
        }
    }

    checks.push(Check::new("config file", config_path.display().to_string(), config_path.exists()));

    let work_dir = cfg.git.work_dir.as_path();
    let wd_state = if !work_dir.exists() {
        "missing"
    } else if crate::git::inspect::exists(work_dir) {
        "git repository"
    } else {
        "not a git repository"
    };
    checks.push(Check::new(
        "work dir",
        format!("{} ({wd_state})", work_dir.display()),
        wd_state == "git repository",
    ));

    let proxy_state = if cfg.proxy.enable_proxy {
        format!("enabled ({} / {})", cfg.proxy.http_proxy, cfg.proxy.https_proxy)
    } else {
        "disabled".to_string()
    };
    checks.push(Check::new("proxy", proxy_state, true));

    if let Some(ok) = reachable {
        let value = if ok { "reachable" } else { "unreachable" };
        checks.push(Check::new("remote host", format!("{} {value}", proxy::PROBE_URL), ok));
    }
    checks
}

/// Print the doctor report to stderr. Returns true when every check passed.
pub fn run_doctor(cfg: &Configuration, config_path: &Path, runner: &dyn CommandRunner) -> bool {
    let use_err = crate::color::color_enabled_stderr();
    eprintln!("auto-git-push doctor");
    eprintln!();
    eprintln!("  version: v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("  host:    {} / {}", std::env::consts::OS, std::env::consts::ARCH);
    eprintln!();

    let checks = collect_checks(cfg, config_path, runner, Some(proxy::probe(cfg)));
    let width = checks.iter().map(|c| c.label.len()).max().unwrap_or(0);
    for c in &checks {
        let value = if c.ok {
            crate::color::paint(use_err, "\x1b[34;1m", &c.value)
        } else {
            crate::color::paint(use_err, "\x1b[31;1m", &c.value)
        };
        eprintln!("  {:width$}  {}", format!("{}:", c.label), value, width = width + 1);
    }
    eprintln!();

    let ok = checks.iter().all(|c| c.ok);
    if ok {
        eprintln!("{}", crate::color::success(use_err, "  all checks passed"));
    } else {
        crate::color::log_warn_stderr(use_err, "  some checks need attention");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::prompt::ScriptedPrompt;
    use crate::util::{CommandResult, ScriptedRunner};

    fn cfg_in(dir: &Path) -> Configuration {
        let mut cfg = Configuration::default();
        cfg.git.work_dir = dir.to_path_buf();
        cfg
    }

    fn repo_dir() -> tempfile::TempDir {
        let td = tempfile::tempdir().expect("tmpdir");
        std::fs::create_dir(td.path().join(".git")).expect("repo marker");
        td
    }

    fn identified_runner() -> ScriptedRunner {
        let runner = ScriptedRunner::new();
        runner
            .respond(&["--version"], CommandResult::ok("git version 2.43.0\n"))
            .respond(&["--global", "user.name"], CommandResult::ok("Ada\n"))
            .respond(&["--global", "user.email"], CommandResult::ok("ada@example.com\n"));
        runner
    }

    #[test]
    fn test_identity_prompted_and_stored_when_missing() {
        let runner = ScriptedRunner::new();
        runner
            .respond_exact(&["config", "--global", "user.name"], CommandResult::failed(1, ""))
            .respond_exact(
                &["config", "--global", "user.email"],
                CommandResult::ok("ada@example.com\n"),
            );
        let git = Git::new(&runner);
        let mut prompt = ScriptedPrompt::new(["Ada Lovelace"]);

        ensure_identity(&git, &mut prompt).expect("identity");
        assert_eq!(prompt.questions, vec!["Enter git user.name: ".to_string()]);
        assert_eq!(
            runner.count(&["config", "--global", "user.name", "Ada Lovelace"]),
            1
        );
    }

    #[test]
    fn test_identity_empty_answer_is_an_error() {
        let runner = ScriptedRunner::new();
        runner.respond(&["user.name"], CommandResult::failed(1, ""));
        let git = Git::new(&runner);
        let mut prompt = ScriptedPrompt::new([""]);
        let err = ensure_identity(&git, &mut prompt).expect_err("empty name");
        assert!(matches!(err, EnvironmentError::Identity { key: "user.name", .. }));
    }

    #[test]
    fn test_missing_work_dir_stops_before_any_command() {
        let td = tempfile::tempdir().expect("tmpdir");
        let cfg = cfg_in(&td.path().join("gone"));
        let runner = ScriptedRunner::new();
        let mut prompt = ScriptedPrompt::default();
        let err = run_auto_push_with(&cfg, &runner, &mut prompt, false, &|_: &Configuration| true).expect_err("missing");
        assert!(matches!(err, EnvironmentError::WorkDirMissing(_)));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_unreachable_remote_aborts_before_push() {
        let td = repo_dir();
        let cfg = cfg_in(td.path());
        let runner = identified_runner();
        let mut prompt = ScriptedPrompt::default();
        let err = run_auto_push_with(&cfg, &runner, &mut prompt, false, &|_: &Configuration| false).expect_err("offline");
        assert!(matches!(err, EnvironmentError::Unreachable));
        assert_eq!(runner.count(&["--unset", "http.proxy"]), 1);
        assert_eq!(runner.count(&["status"]), 0);
        assert_eq!(runner.count(&["push"]), 0);
    }

    #[test]
    fn test_full_sequence_pushes_changes() {
        let td = repo_dir();
        let cfg = cfg_in(td.path());
        let runner = identified_runner();
        runner.respond(&["status", "--porcelain"], CommandResult::ok("?? notes.md\n"));
        let mut prompt = ScriptedPrompt::default();

        let pushed = run_auto_push_with(&cfg, &runner, &mut prompt, false, &|_: &Configuration| true).expect("sequence");
        assert!(pushed);
        assert_eq!(runner.count(&["add", "."]), 1);
        assert_eq!(runner.count(&["push", "origin", "master"]), 1);
        assert!(prompt.questions.is_empty());
    }

    #[test]
    fn test_not_a_repository_is_reported() {
        let td = tempfile::tempdir().expect("tmpdir");
        let cfg = cfg_in(td.path());
        let runner = identified_runner();
        let mut prompt = ScriptedPrompt::default();
        let err = run_auto_push_with(&cfg, &runner, &mut prompt, false, &|_: &Configuration| true).expect_err("no repo");
        assert!(matches!(err, EnvironmentError::NotARepository(_)));
    }

    #[test]
    fn test_collect_checks_flags_missing_identity_and_work_dir() {
        let td = tempfile::tempdir().expect("tmpdir");
        let cfg = cfg_in(&td.path().join("gone"));
        let runner = ScriptedRunner::new();
        runner
            .respond(&["--version"], CommandResult::ok("git version 2.43.0\n"))
            .respond(&["user.email"], CommandResult::failed(1, ""))
            .respond(&["user.name"], CommandResult::ok("Ada\n"));
        let checks = collect_checks(&cfg, &td.path().join("git_config.toml"), &runner, None);

        let find = |label: &str| checks.iter().find(|c| c.label == label).expect("check");
        assert!(find("git version").ok);
        assert!(find("git user.name").ok);
        assert!(!find("git user.email").ok);
        assert!(!find("work dir").ok);
        assert!(find("work dir").value.ends_with("(missing)"));
        assert!(!find("config file").ok);
        assert!(checks.iter().all(|c| c.label != "remote host"));
    }
}

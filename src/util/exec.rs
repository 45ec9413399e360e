use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;

/// Outcome of one external command. A non-zero `code` is a normal result, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            code: 0,
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            code,
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Trimmed stdout when the command succeeded and printed something.
    pub fn stdout_if_success(&self) -> Option<String> {
        if !self.success() {
            return None;
        }
        let t = self.stdout.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    }
}

/// An explicit argument vector plus working directory and environment overlay.
#[derive(Debug, Clone, Default)]
pub struct ExecRequest {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    env_remove: Vec<OsString>,
}

impl ExecRequest {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.env_remove.push(key.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn get_env(&self) -> &[(OsString, OsString)] {
        &self.env
    }

    pub fn get_env_remove(&self) -> &[OsString] {
        &self.env_remove
    }

    /// Arguments as UTF-8 strings (lossy), for logging and matching.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for ExecRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = vec![self.program.to_string_lossy().into_owned()];
        words.extend(self.args_lossy());
        f.write_str(&crate::util::command_preview(&words))
    }
}

/// Executes external commands. Implementations never fail: spawn problems are reported as
/// exit code 1 with the error text in `stderr`.
pub trait CommandRunner: Send + Sync {
    fn run(&self, request: &ExecRequest) -> CommandResult;
}

/// Spawns real processes, blocking until they exit. No timeout is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, request: &ExecRequest) -> CommandResult {
        let mut cmd = Command::new(request.program());
        cmd.args(request.get_args());
        if let Some(cwd) = request.get_cwd() {
            cmd.current_dir(cwd);
        }
        for key in request.get_env_remove() {
            cmd.env_remove(key);
        }
        for (key, value) in request.get_env() {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            // CREATE_NO_WINDOW: keep background runs from flashing console windows
            cmd.creation_flags(0x08000000);
        }

        tracing::debug!(command = %request, "exec");
        match cmd.output() {
            Ok(out) => CommandResult {
                stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                // Terminated by a signal
                code: out.status.code().unwrap_or(-1),
            },
            Err(e) => {
                tracing::error!(command = %request, error = %e, "failed to execute command");
                CommandResult::failed(
                    1,
                    format!("failed to spawn {:?}: {e}", request.program()),
                )
            }
        }
    }
}

/// In-memory runner that records every request and answers from scripted rules.
///
/// A `respond` rule matches when its words appear as a contiguous run inside the request's
/// argument list; a `respond_exact` rule only matches the whole list. The first matching
/// rule wins. Unmatched requests succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<ExecRequest>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, words: &[&str], result: CommandResult) -> &Self {
        self.push_rule(words, false, result)
    }

    /// Answer only requests whose argument list is exactly `args`, so a query such as
    /// `config --global user.name` is not confused with the matching set call.
    pub fn respond_exact(&self, args: &[&str], result: CommandResult) -> &Self {
        self.push_rule(args, true, result)
    }

    fn push_rule(&self, words: &[&str], exact: bool, result: CommandResult) -> &Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                words: words.iter().map(|w| w.to_string()).collect(),
                exact,
                result,
            });
        }
        self
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ExecRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Argument lists of every request seen so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.requests().iter().map(ExecRequest::args_lossy).collect()
    }

    /// Number of recorded requests containing `words` as a contiguous run.
    pub fn count(&self, words: &[&str]) -> usize {
        self.calls()
            .iter()
            .filter(|args| contains_run(args, words))
            .count()
    }
}

#[derive(Debug)]
struct Rule {
    words: Vec<String>,
    exact: bool,
    result: CommandResult,
}

impl Rule {
    fn matches(&self, args: &[String]) -> bool {
        let words: Vec<&str> = self.words.iter().map(String::as_str).collect();
        if self.exact {
            args.len() == words.len() && args.iter().zip(&words).all(|(a, b)| a == b)
        } else {
            contains_run(args, &words)
        }
    }
}

fn contains_run(args: &[String], words: &[&str]) -> bool {
    if words.is_empty() {
        return true;
    }
    args.windows(words.len())
        .any(|w| w.iter().zip(words).all(|(a, b)| a == b))
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, request: &ExecRequest) -> CommandResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        let args = request.args_lossy();
        let rules = match self.rules.lock() {
            Ok(r) => r,
            Err(_) => return CommandResult::failed(1, "scripted runner poisoned"),
        };
        if let Some(rule) = rules.iter().find(|r| r.matches(&args)) {
            return rule.result.clone();
        }
        CommandResult::default()
    }
}

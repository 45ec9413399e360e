//! git invocation: a thin handle that turns argument lists into requests for the runner.
//!
//! - inspect: read-only repository queries (status, branch, remote, ahead/behind)
//! - status: parsing of porcelain/numstat output and change labels
//! - setup: repository initialization, remote wiring and global identity

pub mod inspect;
pub mod setup;
pub mod status;

use std::path::Path;

use crate::proxy::ProxyEnv;
use crate::util::{CommandResult, CommandRunner, ExecRequest};

/// git executable plus the effective environment every invocation runs under.
pub struct Git<'r> {
    runner: &'r dyn CommandRunner,
    env: ProxyEnv,
}

impl<'r> Git<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self {
            runner,
            env: ProxyEnv::default(),
        }
    }

    pub fn with_env(mut self, env: ProxyEnv) -> Self {
        self.env = env;
        self
    }

    /// Build the request for `git <args>` in `dir` (process default when None).
    pub fn request(&self, dir: Option<&Path>, args: &[&str]) -> ExecRequest {
        let mut req = ExecRequest::new("git").args(args.iter().copied());
        if let Some(d) = dir {
            req = req.cwd(d);
        }
        self.env.apply_to(req)
    }

    pub fn run(&self, dir: Option<&Path>, args: &[&str]) -> CommandResult {
        self.runner.run(&self.request(dir, args))
    }

    /// Run in `dir` and return trimmed stdout on success.
    pub fn stdout_in(&self, dir: &Path, args: &[&str]) -> Option<String> {
        self.run(Some(dir), args).stdout_if_success()
    }
}

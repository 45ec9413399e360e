#![allow(clippy::module_name_repetitions)]
//! auto-git-push library: configuration, git plumbing, proxy handling, the push pipeline
//! and the recurring scheduler behind the `auto-git-push` binary.
//!
//! Layout:
//! - config: persistent settings and input validation
//! - util: command execution (`CommandRunner`) and file helpers
//! - git: repository queries, status parsing and repository setup
//! - proxy: global proxy settings, effective environment and reachability probe
//! - push: stage/commit/push pipeline
//! - scheduler: timer registry, time window and the background tick
//! - doctor: environment pre-flight and the full "run auto push" sequence
//! - startup: autostart registration
//! - menu, ui: interactive foreground surface
//! - color, logging, lock, errors: ambient concerns

pub mod color;
pub mod config;
pub mod doctor;
pub mod errors;
pub mod git;
pub mod lock;
pub mod logging;
pub mod menu;
pub mod proxy;
pub mod push;
pub mod scheduler;
pub mod startup;
pub mod ui;
pub mod util;

pub use color::{
    color_enabled_stderr, color_enabled_stdout, log_error_stderr, log_warn_stderr, paint,
    set_color_mode, ColorMode,
};
pub use config::{ConfigStore, Configuration};
pub use errors::{
    exit_code_for_error, exit_code_for_io_error, ConfigError, EnvironmentError, StartupError,
    ValidationError,
};
pub use proxy::{ProxyEnv, ProxyManager};
pub use push::PushOrchestrator;
pub use scheduler::Scheduler;
pub use util::{CommandResult, CommandRunner, ExecRequest, ScriptedRunner, SystemRunner};

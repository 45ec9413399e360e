mod cli;
mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use auto_git_push::logging::{self, log_path_for, logging_init};
use clap::Parser;

use crate::cli::{Cli, Command};

/// Panic records go straight to the log file; the non-blocking writer is not flushed on abort.
fn install_panic_hook(log_file: Option<PathBuf>) {
    std::panic::set_hook(Box::new(move |info| {
        if let Some(path) = &log_file {
            let _ = logging::append_sync(path, "ERROR", &format!("panic: {info}"));
        }
        let use_err = auto_git_push::color_enabled_stderr();
        auto_git_push::log_error_stderr(use_err, &format!("auto-git-push: internal error: {info}"));
    }));
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(mode) = cli.color {
        auto_git_push::set_color_mode(mode);
    }
    let log_guard = logging_init(&log_path_for(&cli.config));
    install_panic_hook(log_guard.as_ref().and_then(|g| g.path()).map(PathBuf::from));

    if cli.background {
        return commands::run_background(&cli);
    }
    match &cli.command {
        None => commands::run_menu(&cli),
        Some(Command::Push { force }) => commands::run_push(&cli, *force),
        Some(Command::Config) => commands::run_config(&cli),
        Some(Command::Doctor) => commands::run_doctor_command(&cli),
    }
}

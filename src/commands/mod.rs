use std::process::ExitCode;

use anyhow::{Context, Result};
use auto_git_push::config::ConfigStore;
use auto_git_push::git::{setup, Git};
use auto_git_push::lock::{acquire_lock_at, lock_path_for};
use auto_git_push::menu::{self, Menu};
use auto_git_push::scheduler::{self, POLL_INTERVAL};
use auto_git_push::startup::SystemAutostart;
use auto_git_push::ui::prompt::{Prompt, TerminalPrompt};
use auto_git_push::{doctor, SystemRunner};

use crate::cli::Cli;

/// Report a top-level failure and map it to an exit code. Interactive sessions wait for
/// Enter so the message stays on screen.
pub(crate) fn finish(res: Result<()>, interactive: bool) -> ExitCode {
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            let use_err = auto_git_push::color_enabled_stderr();
            auto_git_push::log_error_stderr(use_err, &format!("auto-git-push: {e:#}"));
            if interactive {
                let _ = TerminalPrompt::new().ask("Press Enter to exit...");
            }
            ExitCode::from(auto_git_push::exit_code_for_error(&e))
        }
    }
}

pub(crate) fn run_menu(cli: &Cli) -> ExitCode {
    let store = ConfigStore::new(&cli.config);
    let runner = SystemRunner;
    let autostart = SystemAutostart::new(&runner);
    let mut prompt = TerminalPrompt::new();
    let res = Menu::new(&store, &runner, &autostart, &mut prompt)
        .with_color(auto_git_push::color_enabled_stdout())
        .run();
    finish(res, TerminalPrompt::is_interactive())
}

pub(crate) fn run_push(cli: &Cli, force: bool) -> ExitCode {
    finish(push_once(cli, force), false)
}

fn push_once(cli: &Cli, force: bool) -> Result<()> {
    let cfg = ConfigStore::new(&cli.config).load()?;
    let mut prompt = TerminalPrompt::new();
    let pushed = doctor::run_auto_push(&cfg, &SystemRunner, &mut prompt, force)?;
    anyhow::ensure!(pushed, "push failed; see the log for details");
    Ok(())
}

pub(crate) fn run_config(cli: &Cli) -> ExitCode {
    finish(print_config(cli), false)
}

fn print_config(cli: &Cli) -> Result<()> {
    let store = ConfigStore::new(&cli.config);
    let cfg = store.load()?;
    let git = Git::new(&SystemRunner);
    let name = setup::global_config_get(&git, "user.name");
    let email = setup::global_config_get(&git, "user.email");
    println!("# {}", store.path().display());
    for line in menu::describe(&cfg, name.as_deref(), email.as_deref()) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_doctor_command(cli: &Cli) -> ExitCode {
    let store = ConfigStore::new(&cli.config);
    let cfg = match store.load() {
        Ok(cfg) => cfg,
        Err(e) => return finish(Err(e.into()), false),
    };
    if doctor::run_doctor(&cfg, store.path(), &SystemRunner) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

pub(crate) fn run_background(cli: &Cli) -> ExitCode {
    finish(background(cli), false)
}

/// Scheduler-only mode. Returns immediately when scheduling is disabled; otherwise runs
/// until the process is killed.
fn background(cli: &Cli) -> Result<()> {
    let store = ConfigStore::new(&cli.config);
    let cfg = store.load()?;
    if !cfg.schedule.enable {
        tracing::info!("scheduling is disabled; nothing to run in the background");
        return Ok(());
    }
    let lock_path = lock_path_for(store.path());
    let _lock = acquire_lock_at(&lock_path)
        .with_context(|| format!("cannot lock {}", lock_path.display()))?;

    let runner = SystemRunner;
    let now = chrono::Local::now().naive_local();
    let mut jobs = scheduler::background_jobs(&store, &cfg, &runner, now)?
        .context("scheduling is disabled")?;
    tracing::info!(config = %store.path().display(), "background scheduler running");
    jobs.run_forever(POLL_INTERVAL);
    Ok(())
}

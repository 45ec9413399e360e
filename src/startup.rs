//! Autostart registration for `<exe> --config <path> --background`.
//!
//! Windows uses the task scheduler (`schtasks`, run on start). Elsewhere an XDG autostart
//! desktop entry is written under `$XDG_CONFIG_HOME/autostart` (default `~/.config`).

use std::path::{Path, PathBuf};

use crate::errors::StartupError;
use crate::util::{CommandRunner, ExecRequest};

pub const TASK_NAME: &str = "GitAutoPush";
pub const DESKTOP_FILE_NAME: &str = "auto-git-push.desktop";

/// Argument vector the autostart entry launches.
pub fn launch_args(exe: &Path, config_path: &Path) -> Vec<String> {
    vec![
        exe.display().to_string(),
        "--config".to_string(),
        config_path.display().to_string(),
        "--background".to_string(),
    ]
}

/// Quote one argument for a desktop entry `Exec` line: reserved characters force double
/// quotes, inside which `"`, `` ` ``, `$` and `\` are backslash-escaped.
fn desktop_exec_quote(arg: &str) -> String {
    const RESERVED: &[char] = &[
        ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#',
        '(', ')', '`',
    ];
    if !arg.is_empty() && !arg.contains(RESERVED) {
        return arg.replace('%', "%%");
    }
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('"');
    for ch in arg.chars() {
        match ch {
            '"' | '`' | '$' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '%' => out.push_str("%%"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn desktop_entry(exe: &Path, config_path: &Path) -> String {
    let exec = launch_args(exe, config_path)
        .iter()
        .map(|a| desktop_exec_quote(a))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Git Auto Push\n\
         Comment=Periodically commit and push a git working directory\n\
         Exec={exec}\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n"
    )
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn xdg_config_home() -> Result<PathBuf, StartupError> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    home::home_dir()
        .map(|h| h.join(".config"))
        .ok_or(StartupError::NoHome)
}

pub fn desktop_entry_path(config_home: &Path) -> PathBuf {
    config_home.join("autostart").join(DESKTOP_FILE_NAME)
}

pub fn register_xdg(config_home: &Path, exe: &Path, config_path: &Path) -> Result<PathBuf, StartupError> {
    let path = desktop_entry_path(config_home);
    let write = |source| StartupError::Write {
        path: path.clone(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write)?;
    }
    crate::util::fs::write_atomic(&path, &desktop_entry(exe, config_path)).map_err(write)?;
    tracing::info!(path = %path.display(), "autostart entry written");
    Ok(path)
}

/// Removing an entry that does not exist succeeds.
pub fn unregister_xdg(config_home: &Path) -> Result<(), StartupError> {
    let path = desktop_entry_path(config_home);
    match std::fs::remove_file(&path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "autostart entry removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StartupError::Remove { path, source }),
    }
}

/// Value of `schtasks /tr`: the launch command line with Windows-style quoting.
fn task_command_line(exe: &Path, config_path: &Path) -> String {
    launch_args(exe, config_path)
        .iter()
        .map(|a| {
            if a.contains([' ', '\t']) {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn register_scheduled_task(
    runner: &dyn CommandRunner,
    exe: &Path,
    config_path: &Path,
) -> Result<(), StartupError> {
    let command_line = task_command_line(exe, config_path);
    let req = ExecRequest::new("schtasks").args([
        "/create",
        "/tn",
        TASK_NAME,
        "/tr",
        command_line.as_str(),
        "/sc",
        "onstart",
        "/f",
    ]);
    let res = runner.run(&req);
    if !res.success() {
        return Err(StartupError::Scheduler(res.stderr.trim().to_string()));
    }
    tracing::info!(task = TASK_NAME, "scheduled task created");
    Ok(())
}

pub fn unregister_scheduled_task(runner: &dyn CommandRunner) -> Result<(), StartupError> {
    let req = ExecRequest::new("schtasks").args(["/delete", "/tn", TASK_NAME, "/f"]);
    let res = runner.run(&req);
    if !res.success() {
        return Err(StartupError::Scheduler(res.stderr.trim().to_string()));
    }
    tracing::info!(task = TASK_NAME, "scheduled task deleted");
    Ok(())
}

/// Register autostart for the running executable with the platform mechanism.
pub fn register(runner: &dyn CommandRunner, config_path: &Path) -> Result<(), StartupError> {
    let exe = std::env::current_exe().map_err(StartupError::CurrentExe)?;
    let config_path = absolute(config_path);
    if cfg!(windows) {
        register_scheduled_task(runner, &exe, &config_path)
    } else {
        register_xdg(&xdg_config_home()?, &exe, &config_path).map(|_| ())
    }
}

pub fn unregister(runner: &dyn CommandRunner) -> Result<(), StartupError> {
    if cfg!(windows) {
        unregister_scheduled_task(runner)
    } else {
        unregister_xdg(&xdg_config_home()?)
    }
}

/// Platform autostart mechanism as seen by the interactive settings.
pub trait Autostart {
    fn enable(&self, config_path: &Path) -> Result<(), StartupError>;
    fn disable(&self) -> Result<(), StartupError>;
}

/// Registers the running executable via `register`/`unregister`.
pub struct SystemAutostart<'r> {
    runner: &'r dyn CommandRunner,
}

impl<'r> SystemAutostart<'r> {
    pub fn new(runner: &'r dyn CommandRunner) -> Self {
        Self { runner }
    }
}

impl Autostart for SystemAutostart<'_> {
    fn enable(&self, config_path: &Path) -> Result<(), StartupError> {
        register(self.runner, config_path)
    }

    fn disable(&self) -> Result<(), StartupError> {
        unregister(self.runner)
    }
}

fn absolute(p: &Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    std::env::current_dir()
        .map(|d| d.join(p))
        .unwrap_or_else(|_| p.to_path_buf())
}

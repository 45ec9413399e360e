use std::path::PathBuf;

use auto_git_push::config::DEFAULT_CONFIG_FILE;
use auto_git_push::ColorMode;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "auto-git-push",
    version,
    about = "Commit and push a git working directory on demand or on a schedule."
)]
pub(crate) struct Cli {
    /// Configuration file; created with defaults when missing
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub(crate) config: PathBuf,

    /// Colorize console output: auto|always|never
    #[arg(long, global = true, value_enum)]
    pub(crate) color: Option<ColorMode>,

    /// Run only the scheduler (no menu); takes precedence over any subcommand
    #[arg(long)]
    pub(crate) background: bool,

    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Command {
    /// Run environment checks, apply the proxy, probe the remote and push once
    Push {
        /// Skip staging and committing and push with -f
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Config,
    /// Run diagnostics to check environment and configuration
    Doctor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_selects_the_menu() {
        let cli = Cli::try_parse_from(["auto-git-push"]).expect("parse");
        assert!(cli.command.is_none());
        assert!(!cli.background);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "auto-git-push",
            "push",
            "--force",
            "--config",
            "/srv/git_config.toml",
            "--color",
            "never",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Some(Command::Push { force: true })));
        assert_eq!(cli.config, PathBuf::from("/srv/git_config.toml"));
        assert_eq!(cli.color, Some(ColorMode::Never));
    }

    #[test]
    fn test_background_flag() {
        let cli = Cli::try_parse_from(["auto-git-push", "--background"]).expect("parse");
        assert!(cli.background);
    }
}

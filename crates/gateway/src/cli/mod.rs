pub mod config;
pub mod console;

use clap::{Args, Parser, Subcommand};

use sb_domain::config::TimingOverrides;

/// StudyBuddy: Pomodoro study sessions with AI-generated quizzes.
#[derive(Debug, Parser)]
#[command(name = "studybuddy", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the connector-facing HTTP server (default when no subcommand is given).
    Serve,
    /// Run study sessions for a single local user in the terminal.
    Console(ConsoleArgs),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Local user id.
    #[arg(long, default_value = "console-user")]
    pub user: String,
    /// Local community id (community settings are stored under this id).
    #[arg(long, default_value = "local")]
    pub community: String,
    /// Work period override, in seconds.
    #[arg(long)]
    pub work_secs: Option<u64>,
    /// Short break override, in seconds.
    #[arg(long)]
    pub short_break_secs: Option<u64>,
    /// Long break override, in seconds.
    #[arg(long)]
    pub long_break_secs: Option<u64>,
}

impl ConsoleArgs {
    pub fn timing_overrides(&self) -> TimingOverrides {
        TimingOverrides {
            work_secs: self.work_secs,
            short_break_secs: self.short_break_secs,
            long_break_secs: self.long_break_secs,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `SB_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: sb_domain::config::Config
pub fn load_config() -> anyhow::Result<(sb_domain::config::Config, String)> {
    let config_path = std::env::var("SB_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        sb_domain::config::Config::default()
    };

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["studybuddy"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn console_flags_become_overrides() {
        let cli = Cli::parse_from(["studybuddy", "console", "--work-secs", "60", "--user", "me"]);
        let Some(Command::Console(args)) = cli.command else {
            panic!("expected console subcommand");
        };
        assert_eq!(args.user, "me");
        assert_eq!(args.community, "local");
        let overrides = args.timing_overrides();
        assert_eq!(overrides.work_secs, Some(60));
        assert_eq!(overrides.short_break_secs, None);
    }
}

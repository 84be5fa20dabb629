use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "slack-issue-actions")]
#[command(about = "Slack interactive action endpoint for issue triage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, global = true, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the action endpoint (default)")]
    Serve,

    #[command(about = "Create or upgrade the database schema and exit")]
    Migrate,

    #[command(about = "Validate the configuration file")]
    ValidateConfig,
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["slack-issue-actions"]).unwrap();
        assert_eq!(cli.command(), &Commands::Serve);
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["slack-issue-actions", "migrate", "--config", "/etc/actions.yaml"])
                .unwrap();
        assert_eq!(cli.command(), &Commands::Migrate);
        assert_eq!(cli.config, PathBuf::from("/etc/actions.yaml"));
    }

    #[test]
    fn validate_config_subcommand() {
        let cli = Cli::try_parse_from(["slack-issue-actions", "validate-config"]).unwrap();
        assert_eq!(cli.command(), &Commands::ValidateConfig);
    }
}

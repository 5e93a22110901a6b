use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "related-lists")]
#[command(about = "Browse and edit the contacts and opportunities of a parent record")]
#[command(version)]
pub struct Cli {
    /// Config file (default: config.yaml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the first page of both collections and print them
    #[command(visible_alias = "s")]
    Show {
        /// Dataset file (.json, or YAML otherwise)
        #[arg(long)]
        data: PathBuf,

        /// Parent record ID
        #[arg(long)]
        parent: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read commands from stdin and apply them to both collections
    Shell {
        /// Dataset file (.json, or YAML otherwise)
        #[arg(long)]
        data: PathBuf,

        /// Parent record ID
        #[arg(long)]
        parent: String,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the config file location
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::parse_from([
            "related-lists",
            "show",
            "--data",
            "data.yaml",
            "--parent",
            "001A",
            "--json",
        ]);
        match cli.command {
            Commands::Show { parent, json, .. } => {
                assert_eq!(parent, "001A");
                assert!(json);
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["related-lists", "config", "path", "--config", "/tmp/c.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}

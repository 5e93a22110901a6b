use clap::Parser;
use std::process::ExitCode;

use related_lists::cli::{Cli, Commands, ConfigAction};
use related_lists::commands::{cmd_config_path, cmd_config_show, cmd_shell, cmd_show};
use related_lists::config::Config;
use related_lists::error::Result;

/// Log filter, e.g. `RELATED_LISTS_LOG=related_lists=debug`
const LOG_ENV: &str = "RELATED_LISTS_LOG";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Config {
        action: ConfigAction::Path,
    } = cli.command
    {
        return cmd_config_path(cli.config.as_deref());
    }

    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Show { data, parent, json } => cmd_show(&config, &data, &parent, json).await,
        Commands::Shell { data, parent } => cmd_shell(&config, &data, &parent).await,
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(&config, json),
            ConfigAction::Path => cmd_config_path(cli.config.as_deref()),
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

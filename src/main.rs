use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskpilot::{
    Config,
    cli::{Cli, Commands, ConfigCommands},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;

    // No subcommand = launch the chat TUI
    let Some(command) = cli.command else {
        return taskpilot::tui::run(&config).await;
    };

    match command {
        Commands::Send { message } => {
            let storage = taskpilot::core::storage::Storage::new()?;
            let mut state = taskpilot::client::ConversationState::load(&storage)?;
            let client = taskpilot::client::AgentClient::new(config.client.endpoint.clone());

            taskpilot::client::send_message(&mut state, &storage, &client, &message).await?;

            if let Some(turn) = state.turns.last() {
                println!("{}", turn.bot);
            }
        }

        Commands::Serve { host, port } => {
            taskpilot::api::serve(&config, &host, port).await?;
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                println!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigCommands::Path => {
                let path = Config::config_path()?;
                println!("{}", path.display());
            }
        },
    }

    Ok(())
}

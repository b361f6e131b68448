mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{appointment, auth, availability, business};

#[derive(Parser)]
#[command(name = "alicetant")]
#[command(about = "AliceTant CLI - Interact with the AliceTant booking service")]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "API server URL")]
    server: Option<String>,

    #[arg(long, global = true, help = "Auth token")]
    token: Option<String>,

    #[arg(long, global = true, help = "Output format", default_value = "table")]
    format: output::Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure CLI settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign up, log in, inspect the current account
    Auth {
        #[command(subcommand)]
        command: auth::Commands,
    },
    /// Manage businesses
    Business {
        #[command(subcommand)]
        command: business::Commands,
    },
    /// Book and manage appointments
    #[command(alias = "appt")]
    Appointment {
        #[command(subcommand)]
        command: appointment::Commands,
    },
    /// Manage weekly availability windows
    #[command(alias = "avail")]
    Availability {
        #[command(subcommand)]
        command: availability::Commands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration values
    Set {
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Show current configuration
    Show,
    /// Get config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::Config::load()?;

    if let Some(server) = &cli.server {
        cfg.server = server.clone();
    }
    if let Some(token) = &cli.token {
        cfg.token = Some(token.clone());
    }

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommands::Set { server, token } => {
                if let Some(s) = server {
                    cfg.server = s;
                }
                if let Some(t) = token {
                    cfg.token = Some(t);
                }
                cfg.save()?;
                println!("Configuration saved");
            }
            ConfigCommands::Show => {
                println!("Server: {}", cfg.server);
                println!(
                    "Token: {}",
                    cfg.token
                        .as_ref()
                        .map(|t| format!("{}...", &t[..12.min(t.len())]))
                        .unwrap_or_else(|| "(not set)".into())
                );
            }
            ConfigCommands::Path => {
                println!("{}", config::config_path()?.display());
            }
        },
        Commands::Auth { command } => {
            auth::run(command, &mut cfg, cli.format).await?;
        }
        Commands::Business { command } => {
            business::run(command, &cfg, cli.format).await?;
        }
        Commands::Appointment { command } => {
            appointment::run(command, &cfg, cli.format).await?;
        }
        Commands::Availability { command } => {
            availability::run(command, &cfg, cli.format).await?;
        }
    }

    Ok(())
}

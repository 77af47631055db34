use clap::{Parser, Subcommand};
use pickup_share_core::WeekKey;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod render;
mod session;

use commands::{ConfigCommand, ExportCommand, NoteCommand, SetCommand, ShowCommand, WatchCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "pickup")]
#[command(version)]
#[command(about = "A shared weekly pickup and drop-off schedule", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Any date in the week to open (YYYY-MM-DD); defaults to this week
    #[arg(long, short, global = true)]
    week: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a week's schedule
    Show(ShowCommand),

    /// Assign a duty
    Set(SetCommand),

    /// Set or clear a note on a duty
    Note(NoteCommand),

    /// Export a week as CSV
    Export(ExportCommand),

    /// Follow the schedule live and edit it interactively
    Watch(WatchCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so they never mix with command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pickup=warn,pickup_share_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Save config path for config commands
    let cli_config_path = cli.config.clone();

    // Load configuration
    let config = Config::load(cli.config)?;
    let week = resolve_week(cli.week.as_deref())?;

    match &cli.command {
        Some(Commands::Show(cmd)) => cmd.run(&config, week).await?,
        Some(Commands::Set(cmd)) => cmd.run(&config, week).await?,
        Some(Commands::Note(cmd)) => cmd.run(&config, week).await?,
        Some(Commands::Export(cmd)) => cmd.run(&config, week).await?,
        Some(Commands::Watch(cmd)) => cmd.run(&config, week).await?,
        Some(Commands::Config(cmd)) => cmd.run(&config, cli_config_path)?,
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// The week named on the command line, or the current one.
fn resolve_week(arg: Option<&str>) -> Result<WeekKey, String> {
    match arg {
        None | Some("today") => Ok(WeekKey::current()),
        Some(date) => date.parse::<WeekKey>().map_err(|e| e.to_string()),
    }
}

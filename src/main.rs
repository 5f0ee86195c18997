use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use badgecat::{Catalog, Config};
use commands::{ConfigCommand, IndexCommand, ItemCommand};

#[derive(Parser)]
#[command(name = "badgecat")]
#[command(version)]
#[command(about = "Manage the badge catalog and its search index", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage catalog items
    Item(ItemCommand),

    /// Manage the search index
    Index(IndexCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let config = Config::load(Some(config_path.clone()))?;

    match cli.command {
        Some(Commands::Item(cmd)) => {
            let catalog = Catalog::open(&config).await?;
            cmd.run(&catalog).await?;
        }
        Some(Commands::Index(cmd)) => {
            let catalog = Catalog::open(&config).await?;
            cmd.run(&catalog, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, &config_path)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

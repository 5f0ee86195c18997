use clap::{Args, Subcommand};
use std::path::Path;

use super::OutputFormat;
use badgecat::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config, config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if config_path.exists() {
                            println!("Config file: {}", config_path.display());
                        } else {
                            println!("Config file: {} (not found)", config_path.display());
                        }
                        println!();

                        println!("database_path: {}", config.database_path.display());
                        println!("port: {}", config.port);
                        println!();

                        let search = &config.search;
                        println!("search:");
                        println!("  enabled: {}", search.enabled);
                        println!("  backend: {}", search.backend);
                        println!("  url: {}", search.url);
                        println!("  index: {}", search.index);
                        println!("  match_mode: {}", search.match_mode);
                        println!("  timeout_secs: {}", search.timeout_secs);
                        println!("  max_results: {}", search.max_results);
                        println!("  reindex_on_startup: {}", search.reindex_on_startup);
                    }
                }
                Ok(())
            }
        }
    }
}

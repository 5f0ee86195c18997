use clap::{Args, Subcommand};

use super::item::truncate;
use super::OutputFormat;
use badgecat::config::SearchBackend;
use badgecat::{Catalog, Config};

#[derive(Args)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub command: IndexSubcommand,
}

#[derive(Subcommand)]
pub enum IndexSubcommand {
    /// Rebuild the search index from the database
    Reindex,

    /// Search the index by name and/or category
    Search {
        /// Name fragment to match
        #[arg(long)]
        name: Option<String>,

        /// Category fragment to match
        #[arg(long)]
        category: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show index sync status
    Status {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl IndexCommand {
    pub async fn run(
        &self,
        catalog: &Catalog,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            IndexSubcommand::Reindex => {
                if !config.search.enabled {
                    println!("Search index sync is disabled; nothing to reindex");
                    return Ok(());
                }
                let count = catalog.reindex().await;
                println!("Reindexed {} item(s)", count);
                Ok(())
            }

            IndexSubcommand::Search {
                name,
                category,
                format,
            } => {
                if config.search.enabled && config.search.backend == SearchBackend::Memory {
                    eprintln!("Note: the memory index only lives inside the server process");
                }

                let outcome = catalog.search(name.as_deref(), category.as_deref()).await;
                if outcome.is_disabled() {
                    println!("Search index sync is disabled");
                    return Ok(());
                }

                let docs = outcome.into_results();
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&docs)?);
                    }
                    OutputFormat::Text => {
                        if docs.is_empty() {
                            println!("No matches");
                            return Ok(());
                        }
                        println!("{:<8}  {:<30}  {:<20}  STOCK", "ID", "NAME", "CATEGORY");
                        println!("{}", "-".repeat(72));
                        for doc in &docs {
                            println!(
                                "{:<8}  {:<30}  {:<20}  {}",
                                doc.id,
                                truncate(&doc.name, 30),
                                truncate(&doc.category, 20),
                                doc.stock
                            );
                        }
                        println!("\nTotal: {} match(es)", docs.len());
                    }
                }
                Ok(())
            }

            IndexSubcommand::Status { format } => {
                let status = catalog.status().await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&status)?);
                    }
                    OutputFormat::Text => {
                        println!("enabled: {}", status.enabled);
                        println!("match_mode: {}", status.match_mode);
                        println!("store_count: {}", status.store_count);
                        println!("index_count: {}", status.index_count);
                    }
                }
                Ok(())
            }
        }
    }
}

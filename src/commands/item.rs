use clap::{Args, Subcommand};
use std::io::{self, Write};

use super::OutputFormat;
use badgecat::{Catalog, Item, ItemInput};

#[derive(Args)]
pub struct ItemCommand {
    #[command(subcommand)]
    pub command: ItemSubcommand,
}

#[derive(Subcommand)]
pub enum ItemSubcommand {
    /// Create a new item
    Create {
        /// Name of the item
        name: String,

        /// Category the item belongs to
        #[arg(long)]
        category: String,

        /// Initial stock (default: 0)
        #[arg(long)]
        stock: Option<i64>,
    },

    /// List items from the database
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Only items whose name contains this text
        #[arg(long)]
        name: Option<String>,

        /// Only items in this category
        #[arg(long)]
        category: Option<String>,
    },

    /// Show an item's details
    Show {
        /// Item ID
        id: i64,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing item
    Update {
        /// Item ID
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New stock
        #[arg(long)]
        stock: Option<i64>,
    },

    /// Delete an item
    Delete {
        /// Item ID
        id: i64,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Take stock away from an item, failing if there is not enough
    Decrement {
        /// Item ID
        id: i64,

        /// Quantity to remove
        #[arg(long, default_value_t = 1)]
        qty: i64,
    },
}

impl ItemCommand {
    pub async fn run(&self, catalog: &Catalog) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ItemSubcommand::Create {
                name,
                category,
                stock,
            } => {
                if name.trim().is_empty() {
                    return Err("Item name cannot be empty".into());
                }

                let mut input = ItemInput::new(name.trim(), category.trim());
                if let Some(stock) = stock {
                    input = input.with_stock(*stock);
                }

                let created = catalog.create(input).await?;
                println!("Created item:");
                println!("{}", created);
                Ok(())
            }

            ItemSubcommand::List {
                format,
                name,
                category,
            } => {
                let items = catalog.list(name.as_deref(), category.as_deref()).await?;

                if items.is_empty() {
                    println!("No items found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&items)?);
                    }
                    OutputFormat::Text => print_items(&items),
                }
                Ok(())
            }

            ItemSubcommand::Show { id, format } => {
                let item = catalog.get(*id).await?;
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&item)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", item);
                    }
                }
                Ok(())
            }

            ItemSubcommand::Update {
                id,
                name,
                category,
                stock,
            } => {
                if name.is_none() && category.is_none() && stock.is_none() {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                // Unspecified name and category keep their current values
                let current = catalog.get(*id).await?;
                let name = name.clone().unwrap_or(current.name);
                let category = category.clone().unwrap_or(current.category);

                // Without --stock the stock column is not written at all
                let updated = match stock {
                    Some(stock) => {
                        let input = ItemInput::new(name, category).with_stock(*stock);
                        catalog.update(*id, input).await?
                    }
                    None => catalog.update_details(*id, &name, &category).await?,
                };
                println!("Updated item:");
                println!("{}", updated);
                Ok(())
            }

            ItemSubcommand::Delete { id, force } => {
                let item = catalog.get(*id).await?;

                // Confirm deletion unless --force is used
                if !force {
                    print!("Delete item '{}' ({})? [y/N] ", item.name, item.category);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                catalog.delete(item.id).await?;
                println!("Deleted item: {}", item.name);
                Ok(())
            }

            ItemSubcommand::Decrement { id, qty } => {
                let item = catalog.decrement(*id, *qty).await?;
                println!("Decremented item:");
                println!("{}", item);
                Ok(())
            }
        }
    }
}

pub(super) fn print_items(items: &[Item]) {
    println!("{:<8}  {:<30}  {:<20}  STOCK", "ID", "NAME", "CATEGORY");
    println!("{}", "-".repeat(72));
    for item in items {
        println!(
            "{:<8}  {:<30}  {:<20}  {}",
            item.id,
            truncate(&item.name, 30),
            truncate(&item.category, 20),
            item.stock
        );
    }
    println!("\nTotal: {} item(s)", items.len());
}

pub(super) fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let cut: String = value.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}

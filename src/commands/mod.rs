mod config_cmd;
mod index;
mod item;

use clap::ValueEnum;

pub use config_cmd::ConfigCommand;
pub use index::IndexCommand;
pub use item::ItemCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

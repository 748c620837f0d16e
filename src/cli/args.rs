//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, filament::FilamentCommands,
    import::ImportArgs, inventory::InventoryArgs, item::ItemCommands,
    purchase::PurchaseCommands, spool::SpoolCommands, vendor::VendorCommands,
};

#[derive(Parser)]
#[command(name = "spoolr")]
#[command(author, version, about = "Filament inventory tracker")]
#[command(long_about = "Track 3D-printing filament vendors, purchases, spools and stock against an inventory service.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Inventory service URL (overrides config and SPOOLR_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Vendor management
    #[command(subcommand)]
    Vendor(VendorCommands),

    /// Filament catalog management
    #[command(subcommand)]
    Filament(FilamentCommands),

    /// Purchase management
    #[command(subcommand)]
    Purchase(PurchaseCommands),

    /// Purchase line items
    #[command(subcommand)]
    Item(ItemCommands),

    /// Spool tracking (open, use, finish)
    #[command(subcommand)]
    Spool(SpoolCommands),

    /// Per-filament inventory summary
    Inventory(InventoryArgs),

    /// Import records from a CSV file
    Import(ImportArgs),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pick per command (tables for lists)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Aligned columns (for terminals and piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "spoolr",
            "vendor",
            "list",
            "--api-url",
            "http://nas:8000",
            "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.global.api_url.as_deref(), Some("http://nas:8000"));
        assert_eq!(cli.global.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Vendor(_)));
    }

    #[test]
    fn test_purchase_item_specs_parse() {
        let cli = Cli::try_parse_from([
            "spoolr",
            "purchase",
            "new",
            "--item",
            "eSUN PLA+ White:2:1:19.99",
            "--item",
            "Sunlu PETG Red:1:1:15:B1",
            "--create-filaments",
            "--manufacturer",
            "Sunlu",
        ])
        .unwrap();
        match cli.command {
            Commands::Purchase(PurchaseCommands::New(args)) => {
                assert_eq!(args.items.len(), 2);
                assert_eq!(args.items[1].shelf.as_deref(), Some("B1"));
            }
            _ => panic!("expected purchase new"),
        }
    }

    #[test]
    fn test_manufacturer_requires_create_filaments() {
        let result = Cli::try_parse_from([
            "spoolr",
            "purchase",
            "new",
            "--item",
            "X:1:1:1",
            "--manufacturer",
            "Sunlu",
        ]);
        assert!(result.is_err());
    }
}

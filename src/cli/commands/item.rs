//! `spoolr item` command - Purchase line items
//!
//! Items are created through `spoolr purchase new`; the service exposes no
//! create route for them.

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{api_error, confirm, connect, print_structured, resolve_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Backend;
use crate::entities::{PurchaseItem, PurchaseItemUpdate};

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// List purchase items
    List(ListArgs),

    /// Change fields of a purchase item
    Edit(EditArgs),

    /// Delete a purchase item
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only items of this purchase
    #[arg(long, short = 'p')]
    pub purchase: Option<i64>,

    /// Only items for this filament (exact name)
    #[arg(long)]
    pub filament: Option<String>,

    /// Only items not yet received
    #[arg(long)]
    pub pending: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Item id
    pub id: i64,

    #[arg(long)]
    pub filament: Option<String>,

    #[arg(long)]
    pub seller: Option<String>,

    /// Date the spools arrived (YYYY-MM-DD)
    #[arg(long)]
    pub received: Option<NaiveDate>,

    #[arg(long)]
    pub spools: Option<u32>,

    #[arg(long)]
    pub kg_per_spool: Option<f64>,

    #[arg(long)]
    pub unit_price: Option<f64>,

    #[arg(long)]
    pub shelf: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Item id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("purchase", "ORDER", 7),
    ColumnDef::new("filament", "FILAMENT", 34),
    ColumnDef::new("ordered", "ORDERED", 12),
    ColumnDef::new("received", "RECEIVED", 12),
    ColumnDef::new("spools", "SPOOLS", 8),
    ColumnDef::new("kg", "KG/SPOOL", 10),
    ColumnDef::new("price", "UNIT", 10),
    ColumnDef::new("shelf", "SHELF", 10),
];

/// Run an item subcommand
pub fn run(cmd: ItemCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ItemCommands::List(args) => run_list(args, global),
        ItemCommands::Edit(args) => run_edit(args, global),
        ItemCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let mut items = backend
        .list::<PurchaseItem>()
        .map_err(|e| api_error("List purchase items", e))?;

    items.retain(|item| {
        args.purchase.map_or(true, |id| item.purchase_id == id)
            && args
                .filament
                .as_deref()
                .map_or(true, |name| item.filament_name == name)
            && (!args.pending || item.date_received.is_none())
    });
    items.sort_by(|a, b| {
        b.date_ordered
            .cmp(&a.date_ordered)
            .then_with(|| a.id.cmp(&b.id))
    });

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    let format = resolve_format(global, OutputFormat::Tsv);
    if print_structured(&items, format)? {
        return Ok(());
    }

    if items.is_empty() {
        println!("No purchase items found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = items
        .iter()
        .map(|item| {
            TableRow::new(item.id)
                .cell("purchase", CellValue::Text(format!("#{}", item.purchase_id)))
                .cell("filament", CellValue::Text(item.filament_name.clone()))
                .cell("ordered", CellValue::Date(item.date_ordered))
                .cell("received", CellValue::opt_date(item.date_received))
                .cell("spools", CellValue::Count(item.spools))
                .cell("kg", CellValue::Kg(item.kg_per_spool))
                .cell("price", CellValue::Money(item.unit_price))
                .cell("shelf", CellValue::opt_text(item.shelf.as_deref()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "item")
        .quiet(global.quiet)
        .output(&rows, format);

    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let update = PurchaseItemUpdate {
        filament_name: args.filament,
        seller: args.seller,
        date_ordered: None,
        date_received: args.received,
        spools: args.spools,
        kg_per_spool: args.kg_per_spool,
        unit_price: args.unit_price,
        shelf: args.shelf,
        notes: args.notes,
    };
    if update.is_empty() {
        return Err(miette::miette!("Nothing to change (see spoolr item edit --help)"));
    }
    update.check().map_err(|e| miette::miette!("{}", e))?;

    let backend = connect(global)?;
    let item = backend
        .update::<PurchaseItem>(args.id, &update)
        .map_err(|e| api_error("Update purchase item", e))?;

    println!(
        "{} Updated item {} {} x {} ({:.2} kg)",
        style("✓").green(),
        style(format!("#{}", item.id)).cyan(),
        item.spools,
        style(&item.filament_name).yellow(),
        item.total_kg()
    );
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let item = backend
        .get::<PurchaseItem>(args.id)
        .map_err(|e| api_error("Find purchase item", e))?;

    let prompt = format!(
        "Delete item #{} ({} x {}) from purchase #{}?",
        item.id, item.spools, item.filament_name, item.purchase_id
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    backend
        .delete::<PurchaseItem>(args.id)
        .map_err(|e| api_error("Delete purchase item", e))?;
    println!(
        "{} Deleted item {}",
        style("✓").green(),
        style(format!("#{}", item.id)).cyan()
    );
    Ok(())
}

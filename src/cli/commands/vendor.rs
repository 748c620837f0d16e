//! `spoolr vendor` command - Vendor management

use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{api_error, confirm, connect, print_created, print_structured, resolve_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Backend;
use crate::entities::{NewVendor, Vendor, VendorUpdate};

#[derive(Subcommand, Debug)]
pub enum VendorCommands {
    /// List vendors
    List(ListArgs),

    /// Create a new vendor
    New(NewArgs),

    /// Change a vendor's name or notes
    Edit(EditArgs),

    /// Delete a vendor
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name and notes (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Vendor name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Vendor id
    pub id: i64,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Vendor id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("notes", "NOTES", 50),
];

/// Run a vendor subcommand
pub fn run(cmd: VendorCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        VendorCommands::List(args) => run_list(args, global),
        VendorCommands::New(args) => run_new(args, global),
        VendorCommands::Edit(args) => run_edit(args, global),
        VendorCommands::Rm(args) => run_rm(args, global),
    }
}

/// Case-insensitive search over name and notes
pub fn matches_search(vendor: &Vendor, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    vendor.name.to_lowercase().contains(&needle)
        || vendor
            .notes
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let mut vendors = backend
        .list::<Vendor>()
        .map_err(|e| api_error("List vendors", e))?;

    if let Some(ref needle) = args.search {
        vendors.retain(|v| matches_search(v, needle));
    }
    vendors.sort_by_key(|v| v.name.to_lowercase());
    if let Some(limit) = args.limit {
        vendors.truncate(limit);
    }

    if args.count {
        println!("{}", vendors.len());
        return Ok(());
    }

    let format = resolve_format(global, OutputFormat::Tsv);
    if print_structured(&vendors, format)? {
        return Ok(());
    }

    if vendors.is_empty() {
        println!("No vendors found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = vendors
        .iter()
        .map(|v| {
            TableRow::new(v.id)
                .cell("name", CellValue::Text(v.name.clone()))
                .cell("notes", CellValue::opt_text(v.notes.as_deref()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "vendor")
        .quiet(global.quiet)
        .output(&rows, format);

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let (name, notes) = if args.interactive {
        let theme = ColorfulTheme::default();
        let name: String = Input::with_theme(&theme)
            .with_prompt("Vendor name")
            .interact_text()
            .into_diagnostic()?;
        let notes: String = Input::with_theme(&theme)
            .with_prompt("Notes")
            .allow_empty(true)
            .interact_text()
            .into_diagnostic()?;
        (name, Some(notes).filter(|n| !n.trim().is_empty()))
    } else {
        let name = args.name.ok_or_else(|| {
            miette::miette!("Name is required (use --name or -i for interactive)")
        })?;
        (name, args.notes)
    };

    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(miette::miette!("Vendor name cannot be empty"));
    }

    let backend = connect(global)?;
    let vendor = backend
        .create::<Vendor>(&NewVendor { name, notes })
        .map_err(|e| api_error("Create vendor", e))?;

    print_created("vendor", vendor.id, &vendor.name);
    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let update = VendorUpdate {
        name: args.name,
        notes: args.notes,
    };
    if update.is_empty() {
        return Err(miette::miette!("Nothing to change (use --name or --notes)"));
    }

    let backend = connect(global)?;
    let vendor = backend
        .update::<Vendor>(args.id, &update)
        .map_err(|e| api_error("Update vendor", e))?;

    println!(
        "{} Updated vendor {} {}",
        style("✓").green(),
        style(format!("#{}", vendor.id)).cyan(),
        style(&vendor.name).yellow()
    );
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let vendor = backend
        .get::<Vendor>(args.id)
        .map_err(|e| api_error("Find vendor", e))?;

    if !confirm(&format!("Delete vendor '{}'?", vendor.name), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    backend
        .delete::<Vendor>(args.id)
        .map_err(|e| api_error("Delete vendor", e))?;
    println!(
        "{} Deleted vendor {} {}",
        style("✓").green(),
        style(format!("#{}", vendor.id)).cyan(),
        vendor.name
    );
    Ok(())
}

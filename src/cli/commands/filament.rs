//! `spoolr filament` command - Filament catalog management

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{
    api_error, confirm, connect, parse_material, print_created, print_structured, resolve_format,
    today,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Backend;
use crate::entities::{Filament, FilamentUpdate, Material, NewFilament, Vendor};

#[derive(Subcommand, Debug)]
pub enum FilamentCommands {
    /// List catalog filaments with filtering
    List(ListArgs),

    /// Add a filament to the catalog
    New(NewArgs),

    /// Change fields of a filament
    Edit(EditArgs),

    /// Delete a filament
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by material (PLA, PETG, ABS, TPU, Nylon, ASA, Other)
    #[arg(long, short = 'm', value_parser = parse_material)]
    pub material: Option<Material>,

    /// Filter by manufacturer (case-insensitive)
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Search in name, color, line, and product
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug, Default)]
pub struct FilamentFields {
    /// Product line (e.g., "PolyLite")
    #[arg(long)]
    pub line: Option<String>,

    /// Product name (e.g., "Matte Black")
    #[arg(long)]
    pub product: Option<String>,

    /// Color
    #[arg(long, short = 'c')]
    pub color: Option<String>,

    /// Special property (e.g., "Silk", "Glow")
    #[arg(long)]
    pub feature: Option<String>,

    /// Product page URL
    #[arg(long)]
    pub url: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Unique filament name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// Manufacturer (must be an existing vendor)
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Material
    #[arg(long, short = 'm', default_value = "PLA", value_parser = parse_material)]
    pub material: Material,

    /// Date added (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date_added: Option<NaiveDate>,

    #[command(flatten)]
    pub fields: FilamentFields,

    /// Interactive mode (prompt for fields)
    #[arg(long, short = 'i')]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Filament id
    pub id: i64,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New manufacturer
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// New material
    #[arg(long, short = 'm', value_parser = parse_material)]
    pub material: Option<Material>,

    /// New date added (YYYY-MM-DD)
    #[arg(long)]
    pub date_added: Option<NaiveDate>,

    #[command(flatten)]
    pub fields: FilamentFields,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Filament id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 34),
    ColumnDef::new("manufacturer", "MANUFACTURER", 16),
    ColumnDef::new("material", "MATERIAL", 10),
    ColumnDef::new("color", "COLOR", 14),
    ColumnDef::new("feature", "FEATURE", 12),
    ColumnDef::new("added", "ADDED", 12),
];

/// Run a filament subcommand
pub fn run(cmd: FilamentCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        FilamentCommands::List(args) => run_list(args, global),
        FilamentCommands::New(args) => run_new(args, global),
        FilamentCommands::Edit(args) => run_edit(args, global),
        FilamentCommands::Rm(args) => run_rm(args, global),
    }
}

/// Apply the list filters to one filament
pub fn matches_filters(filament: &Filament, args: &ListArgs) -> bool {
    if let Some(material) = args.material {
        if filament.material != material {
            return false;
        }
    }
    if let Some(ref manufacturer) = args.manufacturer {
        if !filament.manufacturer.eq_ignore_ascii_case(manufacturer) {
            return false;
        }
    }
    if let Some(ref needle) = args.search {
        let needle = needle.to_lowercase();
        let haystack = [
            Some(filament.name.as_str()),
            filament.color.as_deref(),
            filament.line.as_deref(),
            filament.product.as_deref(),
        ];
        if !haystack
            .iter()
            .flatten()
            .any(|s| s.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    true
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let mut filaments = backend
        .list::<Filament>()
        .map_err(|e| api_error("List filaments", e))?;

    filaments.retain(|f| matches_filters(f, &args));
    filaments.sort_by(|a, b| {
        a.manufacturer
            .to_lowercase()
            .cmp(&b.manufacturer.to_lowercase())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    if let Some(limit) = args.limit {
        filaments.truncate(limit);
    }

    if args.count {
        println!("{}", filaments.len());
        return Ok(());
    }

    let format = resolve_format(global, OutputFormat::Tsv);
    if print_structured(&filaments, format)? {
        return Ok(());
    }

    if filaments.is_empty() {
        println!("No filaments found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = filaments
        .iter()
        .map(|f| {
            TableRow::new(f.id)
                .cell("name", CellValue::Text(f.name.clone()))
                .cell("manufacturer", CellValue::Text(f.manufacturer.clone()))
                .cell("material", CellValue::Material(f.material))
                .cell("color", CellValue::opt_text(f.color.as_deref()))
                .cell("feature", CellValue::opt_text(f.feature.as_deref()))
                .cell("added", CellValue::Date(f.date_added))
        })
        .collect();
    TableFormatter::new(COLUMNS, "filament")
        .quiet(global.quiet)
        .output(&rows, format);

    Ok(())
}

/// Prompt for a new filament, picking the manufacturer from known vendors
fn prompt_new<B: Backend>(backend: &B) -> Result<NewFilament> {
    let theme = ColorfulTheme::default();

    let mut vendors: Vec<String> = backend
        .list::<Vendor>()
        .map_err(|e| api_error("List vendors", e))?
        .into_iter()
        .map(|v| v.name)
        .collect();
    if vendors.is_empty() {
        return Err(miette::miette!(
            "No vendors yet. Create one first with: spoolr vendor new --name <NAME>"
        ));
    }
    vendors.sort_by_key(|v| v.to_lowercase());

    let name: String = Input::with_theme(&theme)
        .with_prompt("Filament name")
        .interact_text()
        .into_diagnostic()?;

    let vendor_idx = Select::with_theme(&theme)
        .with_prompt("Manufacturer")
        .items(&vendors)
        .default(0)
        .interact()
        .into_diagnostic()?;

    let material_names: Vec<&str> = Material::ALL.iter().map(Material::as_str).collect();
    let material_idx = Select::with_theme(&theme)
        .with_prompt("Material")
        .items(&material_names)
        .default(0)
        .interact()
        .into_diagnostic()?;

    let color: String = Input::with_theme(&theme)
        .with_prompt("Color")
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;

    let mut filament = NewFilament::new(
        name.trim(),
        vendors[vendor_idx].clone(),
        Material::ALL[material_idx],
        today(),
    );
    filament.color = Some(color.trim().to_string()).filter(|c| !c.is_empty());
    Ok(filament)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;

    let filament = if args.interactive {
        prompt_new(&backend)?
    } else {
        let name = args.name.ok_or_else(|| {
            miette::miette!("Name is required (use --name or -i for interactive)")
        })?;
        let manufacturer = args
            .manufacturer
            .ok_or_else(|| miette::miette!("Manufacturer is required (use --manufacturer)"))?;
        NewFilament {
            name: name.trim().to_string(),
            manufacturer,
            line: args.fields.line,
            material: args.material,
            product: args.fields.product,
            color: args.fields.color,
            feature: args.fields.feature,
            url: args.fields.url,
            notes: args.fields.notes,
            date_added: args.date_added.unwrap_or_else(today),
        }
    };

    if filament.name.is_empty() {
        return Err(miette::miette!("Filament name cannot be empty"));
    }

    let created = backend
        .create::<Filament>(&filament)
        .map_err(|e| api_error("Create filament", e))?;

    print_created("filament", created.id, &created.name);
    println!(
        "   {} {} from {}",
        style(created.material).magenta(),
        created.color.as_deref().unwrap_or("-"),
        created.manufacturer
    );
    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let update = FilamentUpdate {
        name: args.name,
        manufacturer: args.manufacturer,
        line: args.fields.line,
        material: args.material,
        product: args.fields.product,
        color: args.fields.color,
        feature: args.fields.feature,
        url: args.fields.url,
        notes: args.fields.notes,
        date_added: args.date_added,
    };
    if update.is_empty() {
        return Err(miette::miette!("Nothing to change (see spoolr filament edit --help)"));
    }

    let backend = connect(global)?;
    let filament = backend
        .update::<Filament>(args.id, &update)
        .map_err(|e| api_error("Update filament", e))?;

    println!(
        "{} Updated filament {} {}",
        style("✓").green(),
        style(format!("#{}", filament.id)).cyan(),
        style(&filament.name).yellow()
    );
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let filament = backend
        .get::<Filament>(args.id)
        .map_err(|e| api_error("Find filament", e))?;

    let spools = backend
        .spools_for_filament(&filament.name)
        .map_err(|e| api_error("List spools", e))?;
    if !spools.is_empty() {
        println!(
            "{} {} spool record(s) still reference '{}'",
            style("!").yellow(),
            spools.len(),
            filament.name
        );
    }

    if !confirm(&format!("Delete filament '{}'?", filament.name), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    backend
        .delete::<Filament>(args.id)
        .map_err(|e| api_error("Delete filament", e))?;
    println!(
        "{} Deleted filament {} {}",
        style("✓").green(),
        style(format!("#{}", filament.id)).cyan(),
        filament.name
    );
    Ok(())
}

//! `spoolr purchase` command - Purchase orders and their line items

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use miette::{IntoDiagnostic, Result};
use std::collections::HashSet;
use std::str::FromStr;

use crate::cli::helpers::{
    api_error, confirm, connect, parse_material, print_structured, resolve_format, today,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Backend, DraftError, DraftItem, ListCache, PurchaseDraft};
use crate::entities::{
    Filament, Material, NewFilament, NewPurchaseItem, Purchase, PurchaseUpdate,
};

#[derive(Subcommand, Debug)]
pub enum PurchaseCommands {
    /// List purchases, newest first
    List(ListArgs),

    /// Show one purchase with its items
    Show(ShowArgs),

    /// Record a new purchase
    New(NewArgs),

    /// Change purchase-level fields (use `spoolr item edit` for lines)
    Edit(EditArgs),

    /// Delete a purchase and its items
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by marketplace (case-insensitive)
    #[arg(long)]
    pub marketplace: Option<String>,

    /// Only purchases on or after this date
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Purchase id
    pub id: i64,
}

/// One `--item` value: `NAME:SPOOLS:KG_PER_SPOOL:UNIT_PRICE[:SHELF]`
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpec {
    pub filament_name: String,
    pub spools: u32,
    pub kg_per_spool: f64,
    pub unit_price: f64,
    pub shelf: Option<String>,
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().trim_start_matches('$').parse::<f64>().ok()
}

impl FromStr for ItemSpec {
    type Err = String;

    /// The name may itself contain ':'; fields are taken from the right.
    /// A fifth field counts as the shelf when the three before it are numeric.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 4 {
            return Err(format!(
                "expected NAME:SPOOLS:KG_PER_SPOOL:UNIT_PRICE[:SHELF], got '{}'",
                s
            ));
        }

        let numeric = |fields: &[&str]| {
            fields[0].trim().parse::<u32>().is_ok()
                && fields[1].trim().parse::<f64>().is_ok()
                && parse_price(fields[2]).is_some()
        };
        let n = parts.len();
        let (head, fields, shelf) = if n >= 5 && numeric(&parts[n - 4..n - 1]) {
            (&parts[..n - 4], &parts[n - 4..n - 1], Some(parts[n - 1].trim()))
        } else {
            (&parts[..n - 3], &parts[n - 3..], None)
        };

        let filament_name = head.join(":").trim().to_string();
        if filament_name.is_empty() {
            return Err("filament name is empty".to_string());
        }
        let spools = fields[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid spool count '{}'", fields[0].trim()))?;
        let kg_per_spool = fields[1]
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid kg per spool '{}'", fields[1].trim()))?;
        let unit_price = parse_price(fields[2])
            .ok_or_else(|| format!("invalid unit price '{}'", fields[2].trim()))?;

        Ok(ItemSpec {
            filament_name,
            spools,
            kg_per_spool,
            unit_price,
            shelf: shelf.filter(|s| !s.is_empty()).map(str::to_string),
        })
    }
}

impl ItemSpec {
    fn into_item(self, date_ordered: NaiveDate, seller: Option<String>) -> NewPurchaseItem {
        NewPurchaseItem {
            filament_name: self.filament_name,
            seller,
            date_ordered,
            date_received: None,
            spools: self.spools,
            kg_per_spool: self.kg_per_spool,
            unit_price: self.unit_price,
            shelf: self.shelf,
            notes: None,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Line item as NAME:SPOOLS:KG_PER_SPOOL:UNIT_PRICE[:SHELF] (repeatable;
    /// NAME may contain ':')
    #[arg(long = "item", value_name = "SPEC")]
    pub items: Vec<ItemSpec>,

    /// Order date (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Where it was bought; also the seller of every line
    #[arg(long)]
    pub marketplace: Option<String>,

    /// Order URL
    #[arg(long)]
    pub order_url: Option<String>,

    /// Subtotal (default: sum of the line totals)
    #[arg(long)]
    pub subtotal: Option<f64>,

    /// Tax
    #[arg(long, default_value_t = 0.0)]
    pub tax: f64,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Add filaments not yet in the catalog
    #[arg(long)]
    pub create_filaments: bool,

    /// Manufacturer for filaments created inline
    #[arg(long, requires = "create_filaments")]
    pub manufacturer: Option<String>,

    /// Material for filaments created inline
    #[arg(long, default_value = "PLA", value_parser = parse_material)]
    pub material: Material,

    /// Interactive mode (build the order line by line)
    #[arg(long, short = 'i', conflicts_with = "items")]
    pub interactive: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Purchase id
    pub id: i64,

    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub marketplace: Option<String>,

    #[arg(long)]
    pub order_url: Option<String>,

    #[arg(long)]
    pub subtotal: Option<f64>,

    #[arg(long)]
    pub tax: Option<f64>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Purchase id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("date", "DATE", 12),
    ColumnDef::new("marketplace", "MARKETPLACE", 20),
    ColumnDef::new("items", "ITEMS", 7),
    ColumnDef::new("spools", "SPOOLS", 8),
    ColumnDef::new("kg", "KG", 8),
    ColumnDef::new("total", "TOTAL", 12),
];

const ITEM_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("filament", "FILAMENT", 34),
    ColumnDef::new("spools", "SPOOLS", 8),
    ColumnDef::new("kg", "KG/SPOOL", 10),
    ColumnDef::new("price", "UNIT", 10),
    ColumnDef::new("shelf", "SHELF", 10),
];

/// Run a purchase subcommand
pub fn run(cmd: PurchaseCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        PurchaseCommands::List(args) => run_list(args, global),
        PurchaseCommands::Show(args) => run_show(args, global),
        PurchaseCommands::New(args) => run_new(args, global),
        PurchaseCommands::Edit(args) => run_edit(args, global),
        PurchaseCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let mut purchases = backend
        .list::<Purchase>()
        .map_err(|e| api_error("List purchases", e))?;

    if let Some(ref marketplace) = args.marketplace {
        purchases.retain(|p| {
            p.marketplace
                .as_deref()
                .is_some_and(|m| m.eq_ignore_ascii_case(marketplace))
        });
    }
    if let Some(since) = args.since {
        purchases.retain(|p| p.date_ordered >= since);
    }
    purchases.sort_by(|a, b| {
        b.date_ordered
            .cmp(&a.date_ordered)
            .then_with(|| b.id.cmp(&a.id))
    });
    if let Some(limit) = args.limit {
        purchases.truncate(limit);
    }

    if args.count {
        println!("{}", purchases.len());
        return Ok(());
    }

    let format = resolve_format(global, OutputFormat::Tsv);
    if print_structured(&purchases, format)? {
        return Ok(());
    }

    if purchases.is_empty() {
        println!("No purchases found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = purchases
        .iter()
        .map(|p| {
            TableRow::new(p.id)
                .cell("date", CellValue::Date(p.date_ordered))
                .cell("marketplace", CellValue::opt_text(p.marketplace.as_deref()))
                .cell("items", CellValue::Count(p.items.len() as u32))
                .cell("spools", CellValue::Count(p.total_spools()))
                .cell("kg", CellValue::Kg(p.total_kg()))
                .cell("total", CellValue::Money(p.total()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "purchase")
        .quiet(global.quiet)
        .output(&rows, format);

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let purchase = backend
        .get::<Purchase>(args.id)
        .map_err(|e| api_error("Find purchase", e))?;

    let format = resolve_format(global, OutputFormat::Tsv);
    if print_structured(&purchase, format)? {
        return Ok(());
    }

    println!(
        "{} {}  {}",
        style(format!("Purchase #{}", purchase.id)).bold(),
        purchase.date_ordered,
        purchase.marketplace.as_deref().unwrap_or("-")
    );
    if let Some(ref url) = purchase.order_url {
        println!("   {}", style(url).dim());
    }
    println!(
        "   subtotal ${:.2} + tax ${:.2} = {}",
        purchase.subtotal,
        purchase.tax,
        style(format!("${:.2}", purchase.total())).green()
    );
    if let Some(ref notes) = purchase.notes {
        println!("   {}", notes);
    }
    println!();

    let rows: Vec<TableRow> = purchase
        .items
        .iter()
        .map(|item| {
            TableRow::new(item.id)
                .cell("filament", CellValue::Text(item.filament_name.clone()))
                .cell("spools", CellValue::Count(item.spools))
                .cell("kg", CellValue::Kg(item.kg_per_spool))
                .cell("price", CellValue::Money(item.unit_price))
                .cell("shelf", CellValue::opt_text(item.shelf.as_deref()))
        })
        .collect();
    TableFormatter::new(ITEM_COLUMNS, "item")
        .quiet(global.quiet)
        .output(&rows, format);
    Ok(())
}

/// Turn item specs into draft lines, attaching a new filament to unknown names
fn build_items(
    specs: Vec<ItemSpec>,
    known: &HashSet<String>,
    args: &NewArgs,
    date_ordered: NaiveDate,
) -> Result<Vec<DraftItem>> {
    let mut drafts = Vec::with_capacity(specs.len());
    for spec in specs {
        let item = spec.into_item(date_ordered, args.marketplace.clone());
        if known.contains(&item.filament_name) {
            drafts.push(DraftItem::existing(item));
            continue;
        }
        if !args.create_filaments {
            return Err(miette::miette!(
                "Filament '{}' is not in the catalog (add it first, or pass --create-filaments --manufacturer <NAME>)",
                item.filament_name
            ));
        }
        let manufacturer = args.manufacturer.clone().ok_or_else(|| {
            miette::miette!(
                "--manufacturer is required to create filament '{}'",
                item.filament_name
            )
        })?;
        let filament = NewFilament::new(
            item.filament_name.clone(),
            manufacturer,
            args.material,
            date_ordered,
        );
        drafts.push(DraftItem::with_new_filament(item, filament));
    }
    Ok(drafts)
}

/// Build a draft by prompting for one line at a time
fn prompt_draft(draft: &mut PurchaseDraft, catalog: &[Filament]) -> Result<()> {
    let theme = ColorfulTheme::default();

    let marketplace: String = Input::with_theme(&theme)
        .with_prompt("Marketplace")
        .allow_empty(true)
        .interact_text()
        .into_diagnostic()?;
    draft.marketplace = Some(marketplace.trim().to_string()).filter(|m| !m.is_empty());

    let mut choices: Vec<String> = catalog.iter().map(|f| f.name.clone()).collect();
    choices.push("+ New filament".to_string());

    loop {
        let idx = Select::with_theme(&theme)
            .with_prompt(format!("Filament for item {}", draft.items.len() + 1))
            .items(&choices)
            .default(0)
            .interact()
            .into_diagnostic()?;

        let new_filament = if idx == catalog.len() {
            let name: String = Input::with_theme(&theme)
                .with_prompt("New filament name")
                .interact_text()
                .into_diagnostic()?;
            let manufacturer: String = Input::with_theme(&theme)
                .with_prompt("Manufacturer")
                .interact_text()
                .into_diagnostic()?;
            let material_names: Vec<&str> = Material::ALL.iter().map(Material::as_str).collect();
            let material = Select::with_theme(&theme)
                .with_prompt("Material")
                .items(&material_names)
                .default(0)
                .interact()
                .into_diagnostic()?;
            Some(NewFilament::new(
                name.trim(),
                manufacturer.trim(),
                Material::ALL[material],
                draft.date_ordered,
            ))
        } else {
            None
        };
        let filament_name = match (&new_filament, catalog.get(idx)) {
            (Some(f), _) => f.name.clone(),
            (None, Some(f)) => f.name.clone(),
            (None, None) => return Err(miette::miette!("No filament selected")),
        };

        let spools: u32 = Input::with_theme(&theme)
            .with_prompt("Spools")
            .default(1)
            .interact_text()
            .into_diagnostic()?;
        let kg_per_spool: f64 = Input::with_theme(&theme)
            .with_prompt("Kg per spool")
            .default(1.0)
            .interact_text()
            .into_diagnostic()?;
        let unit_price: f64 = Input::with_theme(&theme)
            .with_prompt("Unit price")
            .interact_text()
            .into_diagnostic()?;

        let item = NewPurchaseItem {
            filament_name,
            seller: draft.marketplace.clone(),
            date_ordered: draft.date_ordered,
            date_received: None,
            spools,
            kg_per_spool,
            unit_price,
            shelf: None,
            notes: None,
        };
        draft.push(match new_filament {
            Some(filament) => DraftItem::with_new_filament(item, filament),
            None => DraftItem::existing(item),
        });

        let more = Confirm::with_theme(&theme)
            .with_prompt("Add another item?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !more {
            break;
        }
    }

    let tax: f64 = Input::with_theme(&theme)
        .with_prompt("Tax")
        .default(0.0)
        .interact_text()
        .into_diagnostic()?;
    draft.tax = tax;
    Ok(())
}

fn draft_error(err: DraftError) -> miette::Report {
    match err {
        DraftError::Filament { name, source } => {
            api_error(&format!("Create filament '{}'", name), source)
        }
        DraftError::Purchase(source) => api_error("Create purchase", source),
        other => miette::miette!("{}", other),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let mut catalog: ListCache<Filament> = ListCache::new();
    let filaments = catalog
        .get(&backend)
        .map_err(|e| api_error("List filaments", e))?;

    let date_ordered = args.date.unwrap_or_else(today);
    let mut draft = PurchaseDraft::new(date_ordered);
    draft.order_url = args.order_url.clone();
    draft.subtotal = args.subtotal;
    draft.notes = args.notes.clone();

    if args.interactive {
        prompt_draft(&mut draft, filaments)?;
    } else {
        if args.items.is_empty() {
            return Err(miette::miette!(
                "At least one --item is required (or use -i for interactive)"
            ));
        }
        let known: HashSet<String> = filaments.iter().map(|f| f.name.clone()).collect();
        draft.marketplace = args.marketplace.clone();
        draft.tax = args.tax;
        for item in build_items(args.items.clone(), &known, &args, date_ordered)? {
            draft.push(item);
        }
    }

    let pending: Vec<String> = draft
        .pending_filaments()
        .into_iter()
        .map(str::to_string)
        .collect();
    let purchase = draft.submit(&backend).map_err(draft_error)?;

    for name in &pending {
        println!(
            "{} Created filament {}",
            style("✓").green(),
            style(name).yellow()
        );
    }
    println!(
        "{} Created purchase {} with {} item(s): {} spool(s), {:.2} kg, {}",
        style("✓").green(),
        style(format!("#{}", purchase.id)).cyan(),
        purchase.items.len(),
        purchase.total_spools(),
        purchase.total_kg(),
        style(format!("${:.2}", purchase.total())).green()
    );
    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let update = PurchaseUpdate {
        date_ordered: args.date,
        marketplace: args.marketplace,
        order_url: args.order_url,
        subtotal: args.subtotal,
        tax: args.tax,
        notes: args.notes,
    };
    if update.is_empty() {
        return Err(miette::miette!("Nothing to change (see spoolr purchase edit --help)"));
    }

    let backend = connect(global)?;
    let purchase = backend
        .update::<Purchase>(args.id, &update)
        .map_err(|e| api_error("Update purchase", e))?;

    println!(
        "{} Updated purchase {} ({}, {})",
        style("✓").green(),
        style(format!("#{}", purchase.id)).cyan(),
        purchase.date_ordered,
        style(format!("${:.2}", purchase.total())).green()
    );
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let purchase = backend
        .get::<Purchase>(args.id)
        .map_err(|e| api_error("Find purchase", e))?;

    let prompt = format!(
        "Delete purchase #{} from {} and its {} item(s)?",
        purchase.id,
        purchase.date_ordered,
        purchase.items.len()
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    backend
        .delete::<Purchase>(args.id)
        .map_err(|e| api_error("Delete purchase", e))?;
    println!(
        "{} Deleted purchase {}",
        style("✓").green(),
        style(format!("#{}", purchase.id)).cyan()
    );
    Ok(())
}

//! `spoolr spool` command - Physical spool tracking

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    api_error, confirm, connect, print_created, print_structured, resolve_format, today,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Backend;
use crate::entities::{NewSpool, Spool, SpoolState, SpoolUpdate};

#[derive(Subcommand, Debug)]
pub enum SpoolCommands {
    /// List spools
    List(ListArgs),

    /// Open a new spool
    New(NewArgs),

    /// Record filament used from a spool
    Use(UseArgs),

    /// Mark a spool as finished
    Finish(FinishArgs),

    /// Change fields of a spool
    Edit(EditArgs),

    /// Delete a spool
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only spools of this filament (exact name)
    #[arg(long)]
    pub filament: Option<String>,

    /// Filter by state (opened, empty, finished)
    #[arg(long, short = 's')]
    pub state: Option<SpoolState>,

    /// Filter by shelf
    #[arg(long)]
    pub shelf: Option<String>,

    /// Include finished spools
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Filament name (must exist in the catalog)
    #[arg(long)]
    pub filament: String,

    /// Date opened (YYYY-MM-DD, default today)
    #[arg(long)]
    pub opened: Option<NaiveDate>,

    /// Filament left on the spool, in kg
    #[arg(long, default_value_t = 1.0)]
    pub remaining: f64,

    #[arg(long)]
    pub shelf: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UseArgs {
    /// Spool id
    pub id: i64,

    /// Kilograms used
    pub kg: f64,
}

#[derive(clap::Args, Debug)]
pub struct FinishArgs {
    /// Spool id
    pub id: i64,

    /// Date finished (YYYY-MM-DD, default today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Spool id
    pub id: i64,

    #[arg(long)]
    pub opened: Option<NaiveDate>,

    #[arg(long)]
    pub remaining: Option<f64>,

    #[arg(long)]
    pub shelf: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Spool id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("filament", "FILAMENT", 34),
    ColumnDef::new("state", "STATE", 10),
    ColumnDef::new("remaining", "KG LEFT", 9),
    ColumnDef::new("opened", "OPENED", 12),
    ColumnDef::new("finished", "FINISHED", 12),
    ColumnDef::new("shelf", "SHELF", 10),
];

/// Run a spool subcommand
pub fn run(cmd: SpoolCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SpoolCommands::List(args) => run_list(args, global),
        SpoolCommands::New(args) => run_new(args, global),
        SpoolCommands::Use(args) => run_use(args, global),
        SpoolCommands::Finish(args) => run_finish(args, global),
        SpoolCommands::Edit(args) => run_edit(args, global),
        SpoolCommands::Rm(args) => run_rm(args, global),
    }
}

/// Finished spools are hidden unless asked for
pub fn matches_filters(spool: &Spool, args: &ListArgs) -> bool {
    let state = spool.state();
    if let Some(wanted) = args.state {
        if state != wanted {
            return false;
        }
    } else if !args.all && state == SpoolState::Finished {
        return false;
    }
    if let Some(ref shelf) = args.shelf {
        if !spool
            .shelf
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(shelf))
        {
            return false;
        }
    }
    true
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let mut spools = match args.filament.as_deref() {
        Some(name) => backend.spools_for_filament(name),
        None => backend.list::<Spool>(),
    }
    .map_err(|e| api_error("List spools", e))?;

    spools.retain(|s| matches_filters(s, &args));
    spools.sort_by(|a, b| {
        a.filament_name
            .cmp(&b.filament_name)
            .then_with(|| a.date_opened.cmp(&b.date_opened))
    });

    if args.count {
        println!("{}", spools.len());
        return Ok(());
    }

    let format = resolve_format(global, OutputFormat::Tsv);
    if print_structured(&spools, format)? {
        return Ok(());
    }

    if spools.is_empty() {
        println!("No spools found.");
        return Ok(());
    }

    let rows: Vec<TableRow> = spools
        .iter()
        .map(|s| {
            TableRow::new(s.id)
                .cell("filament", CellValue::Text(s.filament_name.clone()))
                .cell("state", CellValue::State(s.state()))
                .cell("remaining", CellValue::Kg(s.remaining_kg))
                .cell("opened", CellValue::Date(s.date_opened))
                .cell("finished", CellValue::opt_date(s.date_finished))
                .cell("shelf", CellValue::opt_text(s.shelf.as_deref()))
        })
        .collect();
    TableFormatter::new(COLUMNS, "spool")
        .quiet(global.quiet)
        .output(&rows, format);

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    if !args.remaining.is_finite() || args.remaining < 0.0 {
        return Err(miette::miette!(
            "Remaining must be zero or more kilograms, got {}",
            args.remaining
        ));
    }

    let backend = connect(global)?;
    let spool = backend
        .create::<Spool>(&NewSpool {
            filament_name: args.filament,
            date_opened: args.opened.unwrap_or_else(today),
            date_finished: None,
            shelf: args.shelf,
            remaining_kg: args.remaining,
            notes: args.notes,
        })
        .map_err(|e| api_error("Create spool", e))?;

    print_created("spool", spool.id, &spool.filament_name);
    Ok(())
}

fn run_use(args: UseArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let spool = backend
        .get::<Spool>(args.id)
        .map_err(|e| api_error("Find spool", e))?;
    let update = spool.consume(args.kg).map_err(|e| miette::miette!("{}", e))?;

    let updated = backend
        .update::<Spool>(args.id, &update)
        .map_err(|e| api_error("Update spool", e))?;

    println!(
        "{} Spool {} {}: {:.2} kg -> {:.2} kg",
        style("✓").green(),
        style(format!("#{}", updated.id)).cyan(),
        updated.filament_name,
        spool.remaining_kg,
        updated.remaining_kg
    );
    if updated.state() == SpoolState::Empty {
        println!(
            "{} Spool is empty; mark it with: spoolr spool finish {}",
            style("→").blue(),
            updated.id
        );
    }
    Ok(())
}

fn run_finish(args: FinishArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let spool = backend
        .get::<Spool>(args.id)
        .map_err(|e| api_error("Find spool", e))?;
    let date = args.date.unwrap_or_else(today);
    let update = spool.finish(date).map_err(|e| miette::miette!("{}", e))?;

    let updated = backend
        .update::<Spool>(args.id, &update)
        .map_err(|e| api_error("Update spool", e))?;

    println!(
        "{} Finished spool {} {} on {}",
        style("✓").green(),
        style(format!("#{}", updated.id)).cyan(),
        updated.filament_name,
        updated.date_finished.unwrap_or(date)
    );
    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let update = SpoolUpdate {
        date_opened: args.opened,
        date_finished: None,
        shelf: args.shelf,
        remaining_kg: args.remaining,
        notes: args.notes,
    };
    if update.is_empty() {
        return Err(miette::miette!("Nothing to change (see spoolr spool edit --help)"));
    }
    if update.remaining_kg.is_some_and(|kg| !kg.is_finite() || kg < 0.0) {
        return Err(miette::miette!("Remaining must be zero or more kilograms"));
    }

    let backend = connect(global)?;
    let spool = backend
        .update::<Spool>(args.id, &update)
        .map_err(|e| api_error("Update spool", e))?;

    println!(
        "{} Updated spool {} {} ({})",
        style("✓").green(),
        style(format!("#{}", spool.id)).cyan(),
        spool.filament_name,
        spool.state()
    );
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let spool = backend
        .get::<Spool>(args.id)
        .map_err(|e| api_error("Find spool", e))?;

    let prompt = format!(
        "Delete spool #{} of {} ({:.2} kg left)?",
        spool.id, spool.filament_name, spool.remaining_kg
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    backend
        .delete::<Spool>(args.id)
        .map_err(|e| api_error("Delete spool", e))?;
    println!(
        "{} Deleted spool {}",
        style("✓").green(),
        style(format!("#{}", spool.id)).cyan()
    );
    Ok(())
}

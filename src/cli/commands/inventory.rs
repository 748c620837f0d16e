//! `spoolr inventory` command - Per-filament stock summary

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{api_error, connect, parse_material, print_structured, resolve_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{summarize, ApiError, Backend, InventoryRow, InventoryTotals};
use crate::entities::{Filament, Material, Purchase, Spool};

#[derive(clap::Args, Debug)]
pub struct InventoryArgs {
    /// Use the service's precomputed summary instead of aggregating locally
    #[arg(long)]
    pub server: bool,

    /// Only filaments of this material
    #[arg(long, short = 'm', value_parser = parse_material)]
    pub material: Option<Material>,

    /// Only filaments with something left (remaining kg or unopened spools)
    #[arg(long)]
    pub in_stock: bool,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Rows plus the grand totals over exactly those rows
#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub rows: Vec<InventoryRow>,
    pub totals: InventoryTotals,
}

impl InventoryReport {
    pub fn new(rows: Vec<InventoryRow>) -> Self {
        let totals = InventoryTotals::from_rows(&rows);
        Self { rows, totals }
    }
}

pub fn run(args: InventoryArgs, global: &GlobalOpts) -> Result<()> {
    let backend = connect(global)?;
    let rows = load_rows(&backend, args.server).map_err(|e| api_error("Load inventory", e))?;
    let report = InventoryReport::new(filter_rows(rows, &args));

    let format = resolve_format(global, OutputFormat::Tsv);
    if args.output.is_none() && print_structured(&report, format)? {
        return Ok(());
    }

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report).into_diagnostic()? + "\n",
        OutputFormat::Yaml => serde_yml::to_string(&report).into_diagnostic()?,
        OutputFormat::Csv => render_csv(&report.rows)?,
        OutputFormat::Md => render_table(&report, true),
        OutputFormat::Id => report
            .rows
            .iter()
            .map(|r| format!("{}\n", r.filament_name))
            .collect(),
        _ => render_table(&report, false),
    };
    write_output(&content, args.output)
}

/// Aggregate locally from the three lists, or take the service's rows as-is
pub fn load_rows<B: Backend>(backend: &B, server: bool) -> Result<Vec<InventoryRow>, ApiError> {
    if server {
        return backend.inventory_summary();
    }
    let filaments = backend.list::<Filament>()?;
    let items: Vec<_> = backend
        .list::<Purchase>()?
        .into_iter()
        .flat_map(|p| p.items)
        .collect();
    let spools = backend.list::<Spool>()?;
    tracing::debug!(
        filaments = filaments.len(),
        items = items.len(),
        spools = spools.len(),
        "aggregating inventory"
    );
    Ok(summarize(&filaments, &items, &spools))
}

fn filter_rows(mut rows: Vec<InventoryRow>, args: &InventoryArgs) -> Vec<InventoryRow> {
    if let Some(material) = args.material {
        rows.retain(|r| r.material == material);
    }
    if args.in_stock {
        rows.retain(|r| r.total_remaining_kg > 0.0 || r.unopened_spools > 0);
    }
    rows
}

fn render_table(report: &InventoryReport, markdown: bool) -> String {
    if report.rows.is_empty() {
        return "No filaments found.\n".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record([
        "Filament",
        "Manufacturer",
        "Material",
        "Color",
        "Purchased kg",
        "Remaining kg",
        "Unopened",
        "Opened",
        "Empty",
        "Finished",
    ]);
    for row in &report.rows {
        builder.push_record([
            row.filament_name.clone(),
            row.manufacturer.clone(),
            row.material.to_string(),
            row.color.clone().unwrap_or_else(|| "-".to_string()),
            format!("{:.2}", row.total_purchased_kg),
            format!("{:.2}", row.total_remaining_kg),
            row.unopened_spools.to_string(),
            row.opened_spools.to_string(),
            row.empty_spools.to_string(),
            row.finished_spools.to_string(),
        ]);
    }
    let t = &report.totals;
    builder.push_record([
        "Total".to_string(),
        String::new(),
        String::new(),
        String::new(),
        format!("{:.2}", t.purchased_kg),
        format!("{:.2}", t.remaining_kg),
        t.unopened_spools.to_string(),
        t.opened_spools.to_string(),
        t.empty_spools.to_string(),
        t.finished_spools.to_string(),
    ]);

    let mut table = builder.build();
    let mut output = if markdown {
        table.with(Style::markdown()).to_string()
    } else {
        table.with(Style::rounded()).to_string()
    };
    output.push('\n');

    if !markdown {
        output.push_str(&format!(
            "\n{} filament(s), {} kg on hand, {} active spool(s)\n",
            style(t.filaments).cyan(),
            style(format!("{:.2}", t.remaining_kg)).green(),
            style(t.active_spools()).cyan()
        ));
    }
    output
}

fn render_csv(rows: &[InventoryRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "filament_name",
            "manufacturer",
            "material",
            "color",
            "total_purchased_kg",
            "total_remaining_kg",
            "unopened_spools",
            "opened_spools",
            "empty_spools",
            "finished_spools",
        ])
        .into_diagnostic()?;
    for row in rows {
        writer
            .write_record([
                row.filament_name.clone(),
                row.manufacturer.clone(),
                row.material.to_string(),
                row.color.clone().unwrap_or_default(),
                format!("{:.2}", row.total_purchased_kg),
                format!("{:.2}", row.total_remaining_kg),
                row.unopened_spools.to_string(),
                row.opened_spools.to_string(),
                row.empty_spools.to_string(),
                row.finished_spools.to_string(),
            ])
            .into_diagnostic()?;
    }
    let bytes = writer.into_inner().map_err(|e| miette::miette!("{}", e))?;
    String::from_utf8(bytes).into_diagnostic()
}

fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            println!(
                "{} Inventory written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", content),
    }
    Ok(())
}

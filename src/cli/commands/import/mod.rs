//! `spoolr import` command - Import records from CSV files

mod common;
mod filament;
mod purchase;
mod spool;
mod vendor;

use chrono::NaiveDate;
use console::style;
use miette::Result;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{connect, today, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::{ApiError, Backend, ListCache, MemoryBackend, Resource};
use crate::entities::{Filament, Purchase, Spool, Vendor};

pub use common::{
    csv_example, csv_headers, parse_money, parse_rows, CsvRow, ImportError, ImportKind,
    ImportReport, ImportStats, RowError, RowOutcome,
};
pub use purchase::{convert_group, group_rows, OrderGroup};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Record kind to import (vendor, filament, spool, purchase)
    #[arg(value_enum)]
    pub kind: Option<ImportKind>,

    /// CSV file to import
    pub file: Option<PathBuf>,

    /// Print a CSV template for the record kind
    #[arg(long)]
    pub template: bool,

    /// Convert and check rows against an in-memory copy; nothing is sent
    #[arg(long)]
    pub dry_run: bool,

    /// With --dry-run, start from an empty inventory instead of the server's
    #[arg(long, requires = "dry_run")]
    pub offline: bool,
}

/// Parse `content` and submit every row (or purchase group) to `backend`
///
/// A malformed file fails before anything is submitted. After that every
/// record is attempted, in file order, and its outcome recorded.
pub fn import<B: Backend>(
    backend: &B,
    kind: ImportKind,
    content: &str,
    today: NaiveDate,
) -> Result<ImportReport, ImportError> {
    let rows = parse_rows(content)?;
    tracing::debug!(kind = %kind, rows = rows.len(), "parsed CSV");

    let mut report = ImportReport::new(kind, rows.len());
    match kind {
        ImportKind::Vendor => vendor::import(backend, &rows, &mut report),
        ImportKind::Filament => filament::import(backend, &rows, today, &mut report),
        ImportKind::Spool => spool::import(backend, &rows, today, &mut report),
        ImportKind::Purchase => purchase::import(backend, &rows, today, &mut report),
    }
    Ok(report)
}

/// Read a CSV file; invalid UTF-8 counts as a malformed file
pub fn read_csv(path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        let kind = args.kind.ok_or_else(|| {
            miette::miette!(
                "Record kind required for template generation. Usage: spoolr import --template vendor"
            )
        })?;
        generate_template(kind);
        return Ok(());
    }

    let kind = args
        .kind
        .ok_or_else(|| miette::miette!("Record kind required. Usage: spoolr import vendor vendors.csv"))?;

    let file_path = args
        .file
        .clone()
        .ok_or_else(|| miette::miette!("CSV file required. Usage: spoolr import vendor vendors.csv"))?;

    if !file_path.exists() {
        return Err(miette::miette!("File not found: {}", file_path.display()));
    }

    let content = read_csv(&file_path).map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Importing {} records from {}{}",
            style("→").blue(),
            style(kind).cyan(),
            style(file_path.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    let report = if args.dry_run {
        let sandbox = MemoryBackend::new();
        if !args.offline {
            let live = connect(global)?;
            seed_sandbox(&sandbox, &live).map_err(|e| {
                miette::miette!("{} (use --offline to dry-run without the server)", e)
            })?;
        }
        let report =
            import(&sandbox, kind, &content, today()).map_err(|e| miette::miette!("{}", e))?;
        print_outcomes(&report, true);
        print_summary(&report.stats, true);
        report
    } else {
        let backend = connect(global)?;
        let report =
            import(&backend, kind, &content, today()).map_err(|e| miette::miette!("{}", e))?;
        print_outcomes(&report, false);
        print_summary(&report.stats, false);

        if report.succeeded() > 0 {
            match reload_count(&backend, kind) {
                Ok(total) if !global.quiet => println!(
                    "{} Reloaded {} list: {} record(s) on the server",
                    style("→").blue(),
                    kind,
                    style(total).cyan()
                ),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "could not reload list after import"),
            }
        }
        report
    };

    if report.failed() > 0 {
        return Err(miette::miette!(
            "Import completed with {} error(s)",
            report.failed()
        ));
    }

    Ok(())
}

/// Copy the live vendors and filaments so references resolve in a dry run
fn seed_sandbox<B: Backend>(sandbox: &MemoryBackend, live: &B) -> Result<(), ApiError> {
    sandbox.seed(&live.list::<Vendor>()?)?;
    sandbox.seed(&live.list::<Filament>()?)?;
    Ok(())
}

/// Invalidate and refetch the imported collection
fn reload_count<B: Backend>(backend: &B, kind: ImportKind) -> Result<usize, ApiError> {
    match kind {
        ImportKind::Vendor => reload::<B, Vendor>(backend),
        ImportKind::Filament => reload::<B, Filament>(backend),
        ImportKind::Spool => reload::<B, Spool>(backend),
        ImportKind::Purchase => reload::<B, Purchase>(backend),
    }
}

fn reload<B: Backend, R: Resource>(backend: &B) -> Result<usize, ApiError> {
    let mut cache = ListCache::<R>::new();
    Ok(cache.reload(backend)?.len())
}

fn print_outcomes(report: &ImportReport, dry_run: bool) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(_) if dry_run => println!(
                "{} {}: Would create {} {}",
                style("○").dim(),
                outcome.rows_label(),
                report.kind,
                truncate_str(&outcome.label, 40)
            ),
            Ok(id) => println!(
                "{} {}: Created {} {} - {}",
                style("✓").green(),
                outcome.rows_label(),
                report.kind,
                style(format!("#{}", id)).cyan(),
                truncate_str(&outcome.label, 40)
            ),
            Err(message) if outcome.label.is_empty() => eprintln!(
                "{} {}: {}",
                style("✗").red(),
                outcome.rows_label(),
                message
            ),
            Err(message) => eprintln!(
                "{} {}: {} - {}",
                style("✗").red(),
                outcome.rows_label(),
                truncate_str(&outcome.label, 40),
                message
            ),
        }
    }
}

fn print_summary(stats: &ImportStats, dry_run: bool) {
    println!();
    println!("{}", style("─".repeat(50)).dim());
    println!("{}", style("Import Summary").bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  Rows processed:   {}", style(stats.rows_processed).cyan());
    if dry_run {
        println!("  Would create:     {}", style(stats.records_created).green());
    } else {
        println!("  Records created:  {}", style(stats.records_created).green());
    }
    if stats.errors > 0 {
        println!("  Errors:           {}", style(stats.errors).red());
    }

    if dry_run {
        println!();
        println!(
            "{}",
            style("Dry run complete. Nothing was sent to the server.").yellow()
        );
    }
}

/// Print the canonical header and an example row to stdout
pub fn generate_template(kind: ImportKind) {
    println!("{}", csv_headers(kind).join(","));
    println!("{}", csv_example(kind).join(","));

    // Usage hint on stderr so redirected output stays a clean CSV
    eprintln!();
    eprintln!(
        "{} Template generated. Redirect to file: spoolr import --template {} > {}s.csv",
        style("→").blue(),
        kind,
        kind
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Material, NewFilament, NewVendor};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    }

    fn stocked() -> MemoryBackend {
        let api = MemoryBackend::new();
        for name in ["eSUN", "Polymaker"] {
            api.create::<Vendor>(&NewVendor {
                name: name.to_string(),
                notes: None,
            })
            .unwrap();
        }
        api.create::<Filament>(&NewFilament::new(
            "eSUN PLA+ White",
            "eSUN",
            Material::Pla,
            day(),
        ))
        .unwrap();
        api.create::<Filament>(&NewFilament::new(
            "PolyLite PETG Grey",
            "Polymaker",
            Material::Petg,
            day(),
        ))
        .unwrap();
        api
    }

    // ========================================================================
    // Vendors
    // ========================================================================

    #[test]
    fn test_vendor_rows_each_create_one_record() {
        let api = MemoryBackend::new();
        let csv = "Name,Notes\neSUN,cheap PLA\nSunlu,\n";
        let report = import(&api, ImportKind::Vendor, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 0);
        assert_eq!(api.create_calls("vendors"), 2);

        let vendors = api.list::<Vendor>().unwrap();
        assert_eq!(vendors[0].notes.as_deref(), Some("cheap PLA"));
        assert_eq!(vendors[1].notes, None);
    }

    #[test]
    fn test_vendor_without_name_is_skipped_and_failed() {
        let api = MemoryBackend::new();
        let csv = "Name,Notes\neSUN,ok\n,orphan note\n";
        let report = import(&api, ImportKind::Vendor, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(api.create_calls("vendors"), 1);
        assert_eq!(report.outcomes[1].lines, vec![3]);
    }

    #[test]
    fn test_vendor_alias_header() {
        let api = MemoryBackend::new();
        let report = import(&api, ImportKind::Vendor, "VENDOR\nAmolen\n", day()).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(api.list::<Vendor>().unwrap()[0].name, "Amolen");
    }

    #[test]
    fn test_duplicate_vendor_fails_but_import_continues() {
        let api = MemoryBackend::new();
        let csv = "Name\neSUN\neSUN\nSunlu\n";
        let report = import(&api, ImportKind::Vendor, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        let failure = report.outcomes[1].result.as_ref().unwrap_err();
        assert!(failure.contains("Vendor already exists"));
    }

    #[test]
    fn test_malformed_file_creates_nothing() {
        let api = MemoryBackend::new();
        let csv = "Name,Notes\neSUN,a\nSunlu,b,c\n";
        assert!(import(&api, ImportKind::Vendor, csv, day()).is_err());
        assert!(api.requests().is_empty());
    }

    // ========================================================================
    // Filaments
    // ========================================================================

    #[test]
    fn test_filament_defaults() {
        let api = stocked();
        let csv = "Name,Manufacturer,Color\nSunlu Silk Gold,eSUN,Gold\n";
        let report = import(&api, ImportKind::Filament, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 1);

        let created = api
            .list::<Filament>()
            .unwrap()
            .into_iter()
            .find(|f| f.name == "Sunlu Silk Gold")
            .unwrap();
        assert_eq!(created.material, Material::Pla);
        assert_eq!(created.date_added, day());
        assert_eq!(created.color.as_deref(), Some("Gold"));
    }

    #[test]
    fn test_filament_name_alias_order() {
        let api = stocked();
        let csv = "Filament name,Name,Manufacturer,Material,Date added\nFull Name,Short,eSUN,petg,2024-06-01\n";
        import(&api, ImportKind::Filament, csv, day()).unwrap();
        let created = api.list::<Filament>().unwrap().pop().unwrap();
        assert_eq!(created.name, "Full Name");
        assert_eq!(created.material, Material::Petg);
        assert_eq!(created.date_added, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_filament_with_unknown_manufacturer_fails() {
        let api = stocked();
        let csv = "Filament name,Manufacturer\nMystery PLA,Nobody\n";
        let report = import(&api, ImportKind::Filament, csv, day()).unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 0);
    }

    #[test]
    fn test_filament_bad_date_counts_as_failure() {
        let api = stocked();
        let csv = "Filament name,Manufacturer,Date added\nX,eSUN,yesterday\n";
        let report = import(&api, ImportKind::Filament, csv, day()).unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(api.create_calls("filaments"), 2);
    }

    // ========================================================================
    // Spools
    // ========================================================================

    #[test]
    fn test_spool_defaults_and_remaining_alias() {
        let api = stocked();
        let csv = "Filament,Remaining,Shelf\neSUN PLA+ White,,A1\nPolyLite PETG Grey,0.4,\n";
        let report = import(&api, ImportKind::Spool, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 2);

        let spools = api.list::<Spool>().unwrap();
        assert_eq!(spools[0].remaining_kg, 1.0);
        assert_eq!(spools[0].date_opened, day());
        assert_eq!(spools[0].shelf.as_deref(), Some("A1"));
        assert_eq!(spools[1].remaining_kg, 0.4);
        assert!(spools[1].date_finished.is_none());
    }

    #[test]
    fn test_spool_without_filament_is_not_submitted() {
        let api = stocked();
        let csv = "Filament,Remaining (kg)\n,0.5\n";
        let report = import(&api, ImportKind::Spool, csv, day()).unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(api.create_calls("spools"), 0);
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    #[test]
    fn test_rows_sharing_an_order_become_one_purchase() {
        let api = stocked();
        let csv = "\
Order,Date ordered,Marketplace,Subtotal,Tax,Filament,Spools,KG/spool,Unit price
A-1,2024-11-15,Amazon,$59.97,$4.80,eSUN PLA+ White,3,1.0,$19.99
A-1,,,,,PolyLite PETG Grey,2,0.5,12.50
";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].lines, vec![2, 3]);
        assert_eq!(api.create_calls("purchases"), 1);

        let purchase = &api.list::<Purchase>().unwrap()[0];
        assert_eq!(purchase.items.len(), 2);
        assert_eq!(purchase.order_url.as_deref(), Some("A-1"));
        assert_eq!(purchase.marketplace.as_deref(), Some("Amazon"));
        assert!((purchase.subtotal - 59.97).abs() < 1e-9);
        assert!((purchase.tax - 4.80).abs() < 1e-9);
        assert_eq!(purchase.items[1].unit_price, 12.5);
        assert_eq!(purchase.items[1].seller.as_deref(), Some("Amazon"));
        assert_eq!(purchase.total_kg(), 4.0);
    }

    #[test]
    fn test_distinct_orders_become_separate_purchases() {
        let api = stocked();
        let csv = "\
Order,Filament
B-2,eSUN PLA+ White
A-1,PolyLite PETG Grey
B-2,PolyLite PETG Grey
";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 2);
        let purchases = api.list::<Purchase>().unwrap();
        // first-seen order
        assert_eq!(purchases[0].order_url.as_deref(), Some("B-2"));
        assert_eq!(purchases[0].items.len(), 2);
        assert_eq!(purchases[1].items.len(), 1);
    }

    #[test]
    fn test_rows_without_order_collapse_into_one_purchase() {
        let api = stocked();
        let csv = "Filament,Spools\neSUN PLA+ White,1\nPolyLite PETG Grey,2\n";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 1);

        let purchase = &api.list::<Purchase>().unwrap()[0];
        assert_eq!(purchase.items.len(), 2);
        assert_eq!(purchase.order_url, None);
        assert_eq!(purchase.date_ordered, day());
        assert_eq!(purchase.subtotal, 0.0);
        assert_eq!(purchase.items[0].kg_per_spool, 1.0);
    }

    #[test]
    fn test_item_rows_without_filament_are_dropped() {
        let api = stocked();
        let csv = "Order,Filament,Spools\nA,eSUN PLA+ White,1\nA,,4\nB,,1\n";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        // A keeps one item and its empty row fails; B has no items at all
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(api.create_calls("purchases"), 1);
        assert_eq!(api.list::<Purchase>().unwrap()[0].items.len(), 1);

        let created = report.outcomes.iter().find(|o| o.is_success()).unwrap();
        assert_eq!(created.lines, vec![2]);
        let dropped = report
            .outcomes
            .iter()
            .find(|o| o.lines == vec![3])
            .unwrap();
        assert!(dropped.result.as_ref().unwrap_err().contains("Filament"));
    }

    #[test]
    fn test_zero_spools_fails_the_order() {
        let api = stocked();
        let csv = "Order,Filament,Spools,KG/spool\nA,eSUN PLA+ White,0,1.0\nB,eSUN PLA+ White,2,1.0\n";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(report.outcomes[0]
            .result
            .as_ref()
            .unwrap_err()
            .contains("Spools"));
        assert_eq!(api.create_calls("purchases"), 1);
    }

    #[test]
    fn test_non_positive_mass_fails_the_order() {
        let api = stocked();
        let csv = "Order,Filament,Spools,KG/spool\nA,eSUN PLA+ White,2,-1.5\nA,PolyLite PETG Grey,1,1.0\nB,eSUN PLA+ White,1,0\n";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        assert_eq!(report.succeeded(), 0);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.outcomes[0].lines, vec![2, 3]);
        assert!(report.outcomes[0]
            .result
            .as_ref()
            .unwrap_err()
            .contains("KG/spool"));
        assert_eq!(api.create_calls("purchases"), 0);
        assert!(api.list::<Purchase>().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_filament_fails_only_its_group() {
        let api = stocked();
        let csv = "Order,Filament\nA,Nope PLA\nB,eSUN PLA+ White\n";
        let report = import(&api, ImportKind::Purchase, csv, day()).unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        let err = report.outcomes[0].result.as_ref().unwrap_err();
        assert!(err.contains("Filament 'Nope PLA' not found"));
    }

    #[test]
    fn test_date_header_alias_and_received() {
        let api = stocked();
        let csv = "Date,Filament,Date received\n2024-10-01,eSUN PLA+ White,2024-10-05\n";
        import(&api, ImportKind::Purchase, csv, day()).unwrap();
        let purchase = &api.list::<Purchase>().unwrap()[0];
        let ordered = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        assert_eq!(purchase.date_ordered, ordered);
        assert_eq!(purchase.items[0].date_ordered, ordered);
        assert_eq!(
            purchase.items[0].date_received,
            NaiveDate::from_ymd_opt(2024, 10, 5)
        );
    }

    #[test]
    fn test_marketplace_from_later_row_fills_group() {
        let rows = parse_rows("Order,Marketplace,Filament\nX,,A\nX,AliExpress,B\n").unwrap();
        let groups = group_rows(&rows);
        assert_eq!(groups.len(), 1);
        let purchase = convert_group(&groups[0], day()).unwrap();
        assert_eq!(purchase.marketplace.as_deref(), Some("AliExpress"));
        assert_eq!(purchase.items[0].seller.as_deref(), Some("AliExpress"));
    }

    #[test]
    fn test_import_then_reload_sees_new_records() {
        let api = stocked();
        import(&api, ImportKind::Vendor, "Name\nOvertures\n", day()).unwrap();
        assert_eq!(reload_count(&api, ImportKind::Vendor).unwrap(), 3);
    }
}

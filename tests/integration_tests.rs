//! Integration tests for the spoolr CLI
//!
//! These tests exercise the CLI end-to-end using assert_cmd. Nothing here
//! needs a running inventory service: imports run as offline dry runs and
//! network commands point at a closed port.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Closed local port; connections are refused immediately
const DEAD_URL: &str = "http://127.0.0.1:9";

/// Helper to get a spoolr command isolated from the user's config and env
fn spoolr(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("spoolr").unwrap();
    cmd.current_dir(tmp.path())
        .env("SPOOLR_CONFIG", tmp.path().join("config.yaml"))
        .env("SPOOLR_TIMEOUT", "2")
        .env_remove("SPOOLR_API_URL")
        .env_remove("SPOOLR_LOG");
    cmd
}

/// Helper to write a CSV file into the temp directory
fn write_csv(tmp: &TempDir, name: &str, content: &str) -> String {
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

// ============================================================================
// Basic Commands
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("vendor"))
        .stdout(predicate::str::contains("inventory"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn test_version() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spoolr"));
}

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("spoolr"));
}

// ============================================================================
// Import
// ============================================================================

#[test]
fn test_import_template_vendor() {
    let tmp = TempDir::new().unwrap();
    let output = spoolr(&tmp)
        .args(["import", "--template", "vendor"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    insta::assert_snapshot!(stdout, @r#"
    Name,Notes
    Polymaker,"Good PETG, ships fast"
    "#);
}

#[test]
fn test_import_requires_kind() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["import", "--template"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Record kind required"));
}

#[test]
fn test_import_missing_file() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["import", "vendor", "nope.csv", "--dry-run", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_offline_requires_dry_run() {
    let tmp = TempDir::new().unwrap();
    let file = write_csv(&tmp, "vendors.csv", "Name,Notes\nPolymaker,\n");
    spoolr(&tmp)
        .args(["import", "vendor", &file, "--offline"])
        .assert()
        .failure();
}

#[test]
fn test_dry_run_vendor_import() {
    let tmp = TempDir::new().unwrap();
    let file = write_csv(
        &tmp,
        "vendors.csv",
        "Name,Notes\nPolymaker,Good PETG\neSUN,\n",
    );
    spoolr(&tmp)
        .args(["import", "vendor", &file, "--dry-run", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would create vendor Polymaker"))
        .stdout(predicate::str::contains("Would create vendor eSUN"))
        .stdout(predicate::str::contains("Rows processed:   2"))
        .stdout(predicate::str::contains("Would create:     2"))
        .stdout(predicate::str::contains("Nothing was sent"));
}

#[test]
fn test_dry_run_vendor_import_counts_empty_name_as_error() {
    let tmp = TempDir::new().unwrap();
    let file = write_csv(&tmp, "vendors.csv", "Name,Notes\nPolymaker,\n,orphan note\n");
    spoolr(&tmp)
        .args(["import", "vendor", &file, "--dry-run", "--offline"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Would create:     1"))
        .stdout(predicate::str::contains("Errors:           1"))
        .stderr(predicate::str::contains("Row 3"))
        .stderr(predicate::str::contains("Import completed with 1 error(s)"));
}

#[test]
fn test_dry_run_malformed_csv_creates_nothing() {
    let tmp = TempDir::new().unwrap();
    let file = write_csv(&tmp, "vendors.csv", "Name,Notes\nPolymaker,a,extra\n");
    spoolr(&tmp)
        .args(["import", "vendor", &file, "--dry-run", "--offline"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Would create").not())
        .stderr(predicate::str::contains("malformed CSV"));
}

#[test]
fn test_dry_run_purchase_with_unknown_filament_fails() {
    let tmp = TempDir::new().unwrap();
    let file = write_csv(
        &tmp,
        "purchases.csv",
        "Order,Date ordered,Marketplace,Filament,Spools,KG/spool,Unit price\n\
         A-1,2024-11-02,Amazon,Ghost PLA,2,1,$19.99\n",
    );
    spoolr(&tmp)
        .args(["import", "purchase", &file, "--dry-run", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ghost PLA"))
        .stderr(predicate::str::contains("Import completed with 1 error(s)"));
}

#[test]
fn test_dry_run_without_offline_needs_server() {
    let tmp = TempDir::new().unwrap();
    let file = write_csv(&tmp, "vendors.csv", "Name\nPolymaker\n");
    spoolr(&tmp)
        .args(["--api-url", DEAD_URL, "import", "vendor", &file, "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--offline"));
}

// ============================================================================
// Entity Commands
// ============================================================================

#[test]
fn test_vendor_list_reports_unreachable_service() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["--api-url", DEAD_URL, "vendor", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("List vendors failed"));
}

#[test]
fn test_vendor_edit_without_changes() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["vendor", "edit", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

#[test]
fn test_spool_new_rejects_negative_remaining() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["spool", "new", "--filament", "eSUN PLA+", "--remaining=-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Remaining must be zero or more"));
}

#[test]
fn test_item_edit_rejects_non_positive_quantities() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["--api-url", DEAD_URL, "item", "edit", "1", "--spools", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Spool count must be positive"));
    spoolr(&tmp)
        .args(["--api-url", DEAD_URL, "item", "edit", "1", "--kg-per-spool=-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KG per spool must be positive"));
}

#[test]
fn test_purchase_new_rejects_bad_item_spec() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["purchase", "new", "--item", "eSUN PLA+"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NAME:SPOOLS:KG_PER_SPOOL:UNIT_PRICE"));
}

#[test]
fn test_filament_list_rejects_unknown_material() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["filament", "list", "--material", "wood"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid material"));
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_set_and_show() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["config", "set", "timeout_secs", "12"])
        .assert()
        .success();
    spoolr(&tmp)
        .env_remove("SPOOLR_TIMEOUT")
        .args(["config", "show", "timeout_secs"])
        .assert()
        .success()
        .stdout("12\n");

    let saved = fs::read_to_string(tmp.path().join("config.yaml")).unwrap();
    assert!(saved.contains("timeout_secs: 12"));
}

#[test]
fn test_config_env_beats_file() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["config", "set", "api_url", "http://from-file:8000"])
        .assert()
        .success();
    spoolr(&tmp)
        .env("SPOOLR_API_URL", "http://from-env:8000")
        .args(["config", "show", "api_url"])
        .assert()
        .success()
        .stdout("http://from-env:8000\n");
}

#[test]
fn test_config_rejects_unknown_key_and_bad_format() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["config", "set", "author", "me"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));
    spoolr(&tmp)
        .args(["config", "set", "default_format", "xml"])
        .assert()
        .failure();
}

#[test]
fn test_config_unset() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["config", "set", "default_format", "json"])
        .assert()
        .success();
    spoolr(&tmp)
        .args(["config", "unset", "default_format"])
        .assert()
        .success();
    spoolr(&tmp)
        .args(["config", "unset", "default_format"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_config_path_honours_override() {
    let tmp = TempDir::new().unwrap();
    spoolr(&tmp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yaml"));
}

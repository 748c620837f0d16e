//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use console::style;
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{ApiError, Config, HttpBackend};
use crate::entities::Material;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Strict material parser for flags
///
/// Reading records maps unknown names to `Other`; on the command line an
/// unknown name is a typo and gets rejected.
pub fn parse_material(s: &str) -> std::result::Result<Material, String> {
    s.parse()
}

/// HTTP backend for the configured service
pub fn connect(global: &GlobalOpts) -> Result<HttpBackend> {
    let config = Config::load();
    let url = config.api_url(global.api_url.as_deref());
    tracing::debug!(url = %url, "connecting");
    HttpBackend::new(&url, config.timeout()).map_err(|e| miette::miette!("{}", e))
}

/// Resolve `auto` against the configured default, then the command's own default
pub fn resolve_format(global: &GlobalOpts, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    Config::load()
        .default_format
        .and_then(|name| <OutputFormat as ValueEnum>::from_str(&name, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(fallback)
}

/// Print JSON or YAML; returns false for the tabular formats
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Ask before a destructive action unless `--yes` was given
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Turn a backend failure into a diagnostic that carries the service message
pub fn api_error(action: &str, err: ApiError) -> miette::Report {
    match err.detail() {
        Some(detail) => miette::miette!("{} failed: {}", action, detail),
        None => miette::miette!("{} failed: {}", action, err),
    }
}

/// Standard "✓ Created ..." line
pub fn print_created(label: &str, id: i64, name: &str) {
    println!(
        "{} Created {} {} {}",
        style("✓").green(),
        label,
        style(format!("#{}", id)).cyan(),
        style(name).yellow()
    );
}

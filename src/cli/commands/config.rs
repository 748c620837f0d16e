//! `spoolr config` command - Configuration management
//!
//! Provides commands to view and modify the spoolr configuration file.

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show the path to the configuration file
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,

    /// Show only what the config file contains (no env or defaults)
    #[arg(long = "file-only")]
    pub file_only: bool,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (api_url, timeout_secs, default_format)
    pub key: String,

    /// Value to set
    pub value: String,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("api_url", "Base URL of the inventory service"),
    ("timeout_secs", "HTTP request timeout in seconds"),
    (
        "default_format",
        "Default output format (tsv, json, yaml, csv, md, id)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, _global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let config = if args.file_only {
        read_config_file(&config_path()?)?
    } else {
        Config::load()
    };

    if let Some(key) = &args.key {
        return match get_config_value(&config, key)? {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    if args.file_only {
        println!(
            "{} {}",
            style("Config file:").bold(),
            style(config_path()?.display()).dim()
        );
        println!();
        print_config_value("api_url", config.api_url.as_deref());
        print_config_value(
            "timeout_secs",
            config.timeout_secs.map(|t| t.to_string()).as_deref(),
        );
        print_config_value("default_format", config.default_format.as_deref());
        return Ok(());
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    print_config_value("api_url", Some(&config.api_url(None)));
    print_config_value("timeout_secs", Some(&config.timeout().as_secs().to_string()));
    print_config_value("default_format", config.default_format.as_deref());

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. --api-url flag");
    println!("  2. Environment variables (SPOOLR_API_URL, SPOOLR_TIMEOUT)");
    println!("  3. Config file ({})", config_path()?.display());
    println!(
        "  4. Defaults ({}, {}s)",
        DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS
    );

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let path = config_path()?;
    let mut config = read_config_file(&path)?;
    set_config_value(&mut config, &args.key, &args.value)?;
    write_config_file(&path, &config)?;

    println!(
        "{} Set {} {} {}",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow()
    );
    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let path = config_path()?;
    if !path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            path.display()
        ));
    }

    let mut config = read_config_file(&path)?;
    if !unset_config_value(&mut config, &args.key)? {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }
    write_config_file(&path, &config)?;

    println!(
        "{} Removed {} from config",
        style("✓").green(),
        style(&args.key).cyan()
    );
    Ok(())
}

fn run_path() -> Result<()> {
    let path = config_path()?;
    println!("{}", path.display());
    if path.exists() {
        eprintln!("{}", style("(exists)").green());
    } else {
        eprintln!("{}", style("(not created)").dim());
    }
    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in VALID_KEYS {
        println!("  {:<20} {}", style(key).cyan(), style(description).dim());
    }

    println!();
    println!(
        "{}",
        style("Use 'spoolr config set <key> <value>' to set a value.").dim()
    );
    Ok(())
}

// Helper functions

fn config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn read_config_file(path: &std::path::Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yml::from_str(&content)
        .map_err(|e| miette::miette!("Invalid config file {}: {}", path.display(), e))
}

fn write_config_file(path: &std::path::Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let yaml = serde_yml::to_string(config).into_diagnostic()?;
    fs::write(path, yaml).into_diagnostic()
}

fn unknown_key(key: &str) -> miette::Report {
    miette::miette!(
        "Unknown config key '{}' (see: spoolr config keys)",
        key
    )
}

fn get_config_value(config: &Config, key: &str) -> Result<Option<String>> {
    match key {
        "api_url" => Ok(config.api_url.clone()),
        "timeout_secs" => Ok(config.timeout_secs.map(|t| t.to_string())),
        "default_format" => Ok(config.default_format.clone()),
        _ => Err(unknown_key(key)),
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "api_url" => {
            reqwest::Url::parse(value)
                .map_err(|e| miette::miette!("Invalid URL '{}': {}", value, e))?;
            config.api_url = Some(value.trim_end_matches('/').to_string());
        }
        "timeout_secs" => {
            let secs = value
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| miette::miette!("timeout_secs must be a positive integer"))?;
            config.timeout_secs = Some(secs);
        }
        "default_format" => {
            let format = <OutputFormat as ValueEnum>::from_str(value, true)
                .map_err(|_| miette::miette!("Unknown output format '{}'", value))?;
            let name = format
                .to_possible_value()
                .map(|v| v.get_name().to_string())
                .unwrap_or_else(|| value.to_lowercase());
            config.default_format = Some(name);
        }
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn unset_config_value(config: &mut Config, key: &str) -> Result<bool> {
    let was_set = match key {
        "api_url" => config.api_url.take().is_some(),
        "timeout_secs" => config.timeout_secs.take().is_some(),
        "default_format" => config.default_format.take().is_some(),
        _ => return Err(unknown_key(key)),
    };
    Ok(was_set)
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_validates_values() {
        let mut config = Config::default();
        set_config_value(&mut config, "api_url", "http://nas.local:8000/").unwrap();
        assert_eq!(config.api_url.as_deref(), Some("http://nas.local:8000"));

        assert!(set_config_value(&mut config, "api_url", "not a url").is_err());
        assert!(set_config_value(&mut config, "timeout_secs", "0").is_err());
        assert!(set_config_value(&mut config, "timeout_secs", "ten").is_err());
        assert!(set_config_value(&mut config, "default_format", "xml").is_err());
        assert!(set_config_value(&mut config, "author", "me").is_err());

        set_config_value(&mut config, "default_format", "JSON").unwrap();
        assert_eq!(config.default_format.as_deref(), Some("json"));
    }

    #[test]
    fn test_unset_reports_whether_key_was_set() {
        let mut config = Config {
            timeout_secs: Some(5),
            ..Config::default()
        };
        assert!(unset_config_value(&mut config, "timeout_secs").unwrap());
        assert!(!unset_config_value(&mut config, "timeout_secs").unwrap());
        assert!(unset_config_value(&mut config, "bogus").is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        assert_eq!(read_config_file(&path).unwrap(), Config::default());

        let mut config = Config::default();
        set_config_value(&mut config, "timeout_secs", "12").unwrap();
        write_config_file(&path, &config).unwrap();

        let back = read_config_file(&path).unwrap();
        assert_eq!(back.timeout_secs, Some(12));
        assert!(back.api_url.is_none());
    }
}

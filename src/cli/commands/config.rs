//! `cartons config` command - Configuration management
//!
//! Provides commands to view and modify global and workspace configuration.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::helpers::Context;
use crate::cli::OutputFormat;
use crate::core::config::{ENV_BUSY_TIMEOUT_MS, ENV_LEDGER, ENV_USER};
use crate::core::{Config, Workspace};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration values
    Show(ShowArgs),

    /// Set a configuration value
    Set(SetArgs),

    /// Unset (remove) a configuration value
    Unset(UnsetArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Configuration key (e.g., user, ledger)
    pub key: String,

    /// Value to set
    pub value: String,

    /// Set in global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Configuration key to remove
    pub key: String,

    /// Remove from global (user) config instead of workspace config
    #[arg(long, short = 'g')]
    pub global: bool,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("ledger", "Ledger database path"),
    ("user", "User recorded on reservations"),
    ("busy_timeout_ms", "Milliseconds a reservation waits for the ledger lock"),
    (
        "default_format",
        "Default output format (tsv, json, yaml, csv, md, id)",
    ),
];

/// Run a config subcommand
pub fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args),
        ConfigCommands::Set(args) => run_set(args),
        ConfigCommands::Unset(args) => run_unset(args),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs) -> Result<()> {
    let ctx = Context::load();
    let config = &ctx.config;

    if let Some(key) = &args.key {
        check_key(key)?;
        return match get_config_value(config, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, _) in VALID_KEYS {
        print_config_value(key, get_config_value(config, key).as_deref());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Command-line flags (--ledger, --user)");
    println!(
        "  2. Environment variables ({}, {}, {})",
        ENV_LEDGER, ENV_USER, ENV_BUSY_TIMEOUT_MS
    );
    println!("  3. Workspace config (.cartons/config.yaml)");
    println!("  4. Global config (~/.config/cartons/config.yaml)");

    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    check_key(&args.key)?;
    let value = parse_value(&args.key, &args.value)?;

    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_workspace_config_path()?
    };

    let mut config_map = read_mapping(&config_path)?;
    config_map.insert(serde_yml::Value::String(args.key.clone()), value);

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Set {} {} {} in {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        style("→").dim(),
        style(&args.value).yellow(),
        scope
    );

    Ok(())
}

fn run_unset(args: UnsetArgs) -> Result<()> {
    let config_path = if args.global {
        get_global_config_path()?
    } else {
        get_workspace_config_path()?
    };

    if !config_path.exists() {
        return Err(miette::miette!(
            "Config file does not exist: {}",
            config_path.display()
        ));
    }

    let mut config_map = read_mapping(&config_path)?;
    let removed = config_map
        .remove(&serde_yml::Value::String(args.key.clone()))
        .is_some();

    if !removed {
        return Err(miette::miette!("Key '{}' not found in config", args.key));
    }

    let yaml = serde_yml::to_string(&config_map).into_diagnostic()?;
    fs::write(&config_path, yaml).into_diagnostic()?;

    let scope = if args.global { "global" } else { "workspace" };
    println!(
        "{} Removed {} from {} config",
        style("✓").green(),
        style(&args.key).cyan(),
        scope
    );

    Ok(())
}

fn run_path() -> Result<()> {
    let global_path = get_global_config_path()?;

    println!("{}", style("Configuration file paths:").bold());
    println!();
    println!("  {} {}", style("Global:").cyan(), global_path.display());
    print_exists(&global_path, 9);

    println!();
    match get_workspace_config_path() {
        Ok(path) => {
            println!("  {} {}", style("Workspace:").cyan(), path.display());
            print_exists(&path, 12);
        }
        Err(_) => println!(
            "  {} {}",
            style("Workspace:").cyan(),
            style("(not in a cartons workspace)").dim()
        ),
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
        style("Use 'cartons config set <key> <value>' to set a value.").dim()
    );

    Ok(())
}

// Helper functions

fn get_global_config_path() -> Result<PathBuf> {
    Config::global_config_path()
        .ok_or_else(|| miette::miette!("Could not determine global config directory"))
}

fn get_workspace_config_path() -> Result<PathBuf> {
    let workspace = Workspace::discover().map_err(|e| miette::miette!("{}", e))?;
    Ok(workspace.config_path())
}

fn check_key(key: &str) -> Result<()> {
    if VALID_KEYS.iter().any(|(k, _)| *k == key) {
        Ok(())
    } else {
        Err(miette::miette!(
            help = "run `cartons config keys` to list valid keys",
            "Unknown configuration key '{}'",
            key
        ))
    }
}

/// Convert a command-line value into the YAML type the key expects
fn parse_value(key: &str, raw: &str) -> Result<serde_yml::Value> {
    match key {
        "busy_timeout_ms" => {
            let ms: u64 = raw
                .trim()
                .parse()
                .map_err(|_| miette::miette!("busy_timeout_ms must be a whole number of milliseconds"))?;
            Ok(serde_yml::Value::Number(ms.into()))
        }
        "default_format" => {
            if OutputFormat::from_name(raw).is_none() {
                return Err(miette::miette!("Unknown output format '{}'", raw));
            }
            Ok(serde_yml::Value::String(raw.to_lowercase()))
        }
        _ => Ok(serde_yml::Value::String(raw.to_string())),
    }
}

/// Load a config file as a YAML mapping, empty if missing or blank
///
/// Unparseable files and files whose top level is not a mapping are errors,
/// so a write never replaces content it could not read.
fn read_mapping(path: &Path) -> Result<serde_yml::Mapping> {
    if !path.exists() {
        return Ok(serde_yml::Mapping::new());
    }
    let content = fs::read_to_string(path).into_diagnostic()?;
    let parsed: serde_yml::Value = serde_yml::from_str(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))?;

    match parsed {
        serde_yml::Value::Null => Ok(serde_yml::Mapping::new()),
        serde_yml::Value::Mapping(map) => Ok(map),
        _ => Err(miette::miette!(
            help = "fix or remove the file, then retry",
            "Config file {} is not a key/value mapping",
            path.display()
        )),
    }
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "ledger" => config.ledger.as_ref().map(|p| p.display().to_string()),
        "user" => config.user.clone(),
        "busy_timeout_ms" => config.busy_timeout_ms.map(|ms| ms.to_string()),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn print_exists(path: &Path, indent: usize) {
    let note = if path.exists() {
        style("(exists)").green()
    } else {
        style("(not created)").dim()
    };
    println!("{:indent$}{}", "", note, indent = indent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_check_key() {
        assert!(check_key("user").is_ok());
        assert!(check_key("author").is_err());
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(
            parse_value("busy_timeout_ms", "2500").unwrap(),
            serde_yml::Value::Number(2500u64.into())
        );
        assert!(parse_value("busy_timeout_ms", "soon").is_err());
        assert!(parse_value("default_format", "xml").is_err());
        assert_eq!(
            parse_value("default_format", "JSON").unwrap(),
            serde_yml::Value::String("json".to_string())
        );
    }

    #[test]
    fn test_written_mapping_reads_back_as_config() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");

        let mut mapping = read_mapping(&path).unwrap();
        mapping.insert(
            serde_yml::Value::String("busy_timeout_ms".to_string()),
            parse_value("busy_timeout_ms", "900").unwrap(),
        );
        mapping.insert(
            serde_yml::Value::String("user".to_string()),
            parse_value("user", "bodega").unwrap(),
        );
        fs::write(&path, serde_yml::to_string(&mapping).unwrap()).unwrap();

        let config = Config::read_file(&path).unwrap();
        assert_eq!(config.busy_timeout_ms, Some(900));
        assert_eq!(config.user.as_deref(), Some("bodega"));
    }

    #[test]
    fn test_read_mapping_keeps_existing_keys() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "# comment only\n").unwrap();
        assert!(read_mapping(&path).unwrap().is_empty());

        fs::write(&path, "user: maria\nbusy_timeout_ms: 250\n").unwrap();
        assert_eq!(read_mapping(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_read_mapping_rejects_malformed_yaml() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "user: maria\nledger: [unterminated\n").unwrap();

        assert!(read_mapping(&path).is_err());
    }

    #[test]
    fn test_read_mapping_rejects_non_mapping() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        fs::write(&path, "- user\n- maria\n").unwrap();

        let err = read_mapping(&path).unwrap_err();
        assert!(err.to_string().contains("not a key/value mapping"));
    }
}

//! CLI argument parsing and config file support.
//!
//! The daemon can be configured via CLI flags, a JSON config file, or
//! a combination of both (CLI overrides config file).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CLI arguments (manual parsing, no clap dependency)
// ---------------------------------------------------------------------------

/// Parsed command-line arguments.
pub struct CliArgs {
    pub data_dir: Option<PathBuf>,
    pub new_vault: bool,
    pub import: bool,
    pub password: Option<String>,
    pub allowed_origins: Vec<String>,
    pub open_origins: bool,
    pub config_path: Option<PathBuf>,
}

impl CliArgs {
    /// Parses CLI arguments from `std::env::args`.
    pub fn parse_from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut cli = Self {
            data_dir: None,
            new_vault: false,
            import: false,
            password: None,
            allowed_origins: Vec::new(),
            open_origins: false,
            config_path: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--data-dir" => {
                    i += 1;
                    cli.data_dir = args.get(i).map(PathBuf::from);
                }
                "--new-vault" => {
                    cli.new_vault = true;
                }
                "--import" => {
                    cli.import = true;
                }
                "--password" => {
                    i += 1;
                    cli.password = args.get(i).cloned();
                }
                "--allow-origin" => {
                    i += 1;
                    if let Some(origin) = args.get(i) {
                        cli.allowed_origins.push(origin.clone());
                    }
                }
                "--open-origins" => {
                    cli.open_origins = true;
                }
                "--config" => {
                    i += 1;
                    cli.config_path = args.get(i).map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("unknown argument: {other}");
                    eprintln!("use --help for usage information");
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        cli
    }
}

// ---------------------------------------------------------------------------
// Config file (JSON)
// ---------------------------------------------------------------------------

/// JSON config file format.
///
/// Example `daemon.json`:
/// ```json
/// {
///   "data_dir": "/opt/palisade/data",
///   "allowed_origins": ["https://dapp.example"],
///   "open_origins": false,
///   "request_timeout_secs": 30
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DaemonConfigFile {
    pub data_dir: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
    pub open_origins: Option<bool>,
    pub request_timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Merged daemon configuration
// ---------------------------------------------------------------------------

/// Effective daemon configuration after merging file and CLI sources.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub new_vault: bool,
    pub import: bool,
    pub password: Option<String>,
    pub allowed_origins: Vec<String>,
    pub open_origins: bool,
    pub request_timeout_secs: u64,
}

impl DaemonConfig {
    /// Loads a JSON config file.
    pub fn load(path: &Path) -> Result<DaemonConfigFile, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file: {e}"))?;
        serde_json::from_str(&json).map_err(|e| format!("failed to parse config file: {e}"))
    }

    /// Builds the effective config from CLI flags alone.
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self::merge(&DaemonConfigFile::default(), cli)
    }

    /// Merges a config file with CLI flags; CLI wins on conflicts.
    pub fn merge(file: &DaemonConfigFile, cli: &CliArgs) -> Self {
        let data_dir = cli
            .data_dir
            .clone()
            .or_else(|| file.data_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let mut allowed_origins = file.allowed_origins.clone().unwrap_or_default();
        allowed_origins.extend(cli.allowed_origins.iter().cloned());

        Self {
            data_dir,
            new_vault: cli.new_vault,
            import: cli.import,
            password: cli.password.clone(),
            allowed_origins,
            open_origins: cli.open_origins || file.open_origins.unwrap_or(false),
            request_timeout_secs: file.request_timeout_secs.unwrap_or(30),
        }
    }
}

fn default_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".palisade")
    } else {
        PathBuf::from(".palisade")
    }
}

// ---------------------------------------------------------------------------
// Help text
// ---------------------------------------------------------------------------

pub fn print_help() {
    println!(
        r#"palisade-daemon — headless multi-chain wallet host

USAGE:
    palisade-daemon [OPTIONS]

OPTIONS:
    --data-dir <PATH>       Data directory (default: ~/.palisade)
    --new-vault             Create a new vault on first run
    --import                Import a recovery phrase from PALISADE_IMPORT_MNEMONIC
    --password <PASSWORD>   Vault password (prefer PALISADE_PASSPHRASE)
    --allow-origin <ADDR>   Add an origin to the allow-list (repeatable)
    --open-origins          Accept requests from any origin (trusted local use)
    --config <PATH>         Load config from a JSON file
    -h, --help              Show this help

ENVIRONMENT:
    PALISADE_PASSPHRASE       Vault password (avoids interactive prompt)
    PALISADE_IMPORT_MNEMONIC  Recovery phrase consumed by --import

The daemon reads JSON wire requests line-by-line on stdin and writes
matching responses to stdout. It runs until stdin closes or Ctrl+C."#
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

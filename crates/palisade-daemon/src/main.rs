//! Palisade Daemon -- headless multi-chain wallet host.
//!
//! Usage:
//!
//!   palisade-daemon [OPTIONS]
//!
//! Options:
//!
//!   --data-dir <PATH>       Data directory (default: ~/.palisade)
//!   --new-vault             Create a new vault on first run
//!   --import                Import a phrase from PALISADE_IMPORT_MNEMONIC
//!   --password <PASSWORD>   Vault password (prefer PALISADE_PASSPHRASE)
//!   --allow-origin <ADDR>   Add an origin to the allow-list (repeatable)
//!   --open-origins          Accept requests from any origin
//!   --config <PATH>         Load config from JSON file
//!
//! Environment:
//!
//!   PALISADE_PASSPHRASE       Vault password (avoids interactive prompt)
//!   PALISADE_IMPORT_MNEMONIC  Recovery phrase consumed by --import
//!
//! The daemon speaks the Palisade wire protocol over stdio: one JSON
//! request per stdin line, one JSON response per stdout line. It runs
//! until stdin closes or Ctrl+C (SIGINT/SIGTERM), locking the keyring
//! before exit.

use std::sync::Arc;
use std::time::Duration;

use palisade_crypto::mnemonic::generate_mnemonic;
use palisade_keyring::store::KeyringStore;
use palisade_keyring::vault_file::VAULT_FILE_NAME;
use palisade_signer::approval::AutoApprove;
use palisade_signer::service::SigningService;
use palisade_transport::events::EventBus;
use palisade_transport::message::{WireRequest, WireResponse};
use palisade_transport::origin::OriginPolicy;
use palisade_transport::transport::SecureTransport;
use palisade_types::config::CoreConfig;
use palisade_types::{ChainFamily, WalletEvent};
use tokio::io::AsyncBufReadExt;
use tokio::sync::{mpsc, RwLock};

mod config;
mod vault_io;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    // Tracing / logging. Goes to stderr so stdout stays a clean
    // response stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments.
    let cli = config::CliArgs::parse_from_env();

    // Load or merge config file if provided.
    let daemon_config = match &cli.config_path {
        Some(path) => match config::DaemonConfig::load(path) {
            Ok(file) => config::DaemonConfig::merge(&file, &cli),
            Err(e) => {
                tracing::error!("failed to load config file: {e}");
                std::process::exit(1);
            }
        },
        None => config::DaemonConfig::from_cli(&cli),
    };

    // Run the daemon.
    if let Err(e) = run_daemon(daemon_config).await {
        tracing::error!("daemon error: {e}");
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Daemon main logic
// ---------------------------------------------------------------------------

async fn run_daemon(cfg: config::DaemonConfig) -> Result<(), String> {
    let data_dir = &cfg.data_dir;
    let vault_path = data_dir.join(VAULT_FILE_NAME);

    std::fs::create_dir_all(data_dir)
        .map_err(|e| format!("failed to create data directory: {e}"))?;

    tracing::info!(data_dir = %data_dir.display(), "data directory ready");

    // -----------------------------------------------------------------------
    // 1. Vault
    // -----------------------------------------------------------------------

    let password = cfg
        .password
        .clone()
        .unwrap_or_else(|| read_password("Enter vault password: "));

    let store = if cfg.new_vault || cfg.import || !vault_path.exists() {
        if vault_path.exists() && !(cfg.new_vault || cfg.import) {
            tracing::info!("loading existing vault");
            vault_io::load_store(&vault_path)?
        } else if cfg.import {
            // Import an existing recovery phrase.
            let phrase = std::env::var("PALISADE_IMPORT_MNEMONIC")
                .map_err(|_| "--import requires PALISADE_IMPORT_MNEMONIC to be set".to_string())?;
            tracing::info!("importing vault from recovery phrase");
            let store = KeyringStore::import(phrase.trim(), &password)
                .map_err(|e| format!("import failed: {e}"))?;
            vault_io::save_store(&vault_path, &store)?;
            store
        } else {
            // Create new.
            tracing::info!("creating new vault");
            let phrase =
                generate_mnemonic().map_err(|e| format!("mnemonic generation failed: {e}"))?;

            println!();
            println!("============================================================");
            println!("  NEW VAULT CREATED -- SAVE YOUR RECOVERY PHRASE!");
            println!("============================================================");
            println!();
            println!("  {}", phrase.as_str());
            println!();
            println!("  Write these words down and store them safely.");
            println!("  You will need them to recover your accounts.");
            println!("============================================================");
            println!();

            let store = KeyringStore::create(phrase.as_str(), &password)
                .map_err(|e| format!("vault creation failed: {e}"))?;
            vault_io::save_store(&vault_path, &store)?;
            store
        }
    } else {
        tracing::info!("loading existing vault");
        vault_io::load_store(&vault_path)?
    };

    // -----------------------------------------------------------------------
    // 2. Core configuration
    // -----------------------------------------------------------------------

    let core_config = CoreConfig {
        allowed_origins: cfg.allowed_origins.clone(),
        request_timeout_secs: cfg.request_timeout_secs,
        ..CoreConfig::default()
    };
    core_config
        .validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    // -----------------------------------------------------------------------
    // 3. Unlock
    // -----------------------------------------------------------------------

    // Deliberately slow (password KDF). Runs on a blocking thread so
    // the runtime stays responsive.
    let families = core_config.enabled_families.clone();
    let store = tokio::task::spawn_blocking(move || {
        let mut store = store;
        store
            .unlock_families(&password, &families)
            .map(|()| store)
            .map_err(|e| format!("failed to unlock vault: {e}"))
    })
    .await
    .map_err(|e| format!("unlock task failed: {e}"))??;

    for family in ChainFamily::ALL {
        if let Ok(entry) = store.keyring_for(family) {
            for account in entry.accounts() {
                tracing::info!(%family, account = %account.public_key(), path = %account.path(), "account ready");
            }
        }
    }

    let store = Arc::new(RwLock::new(store));

    // -----------------------------------------------------------------------
    // 4. Core services
    // -----------------------------------------------------------------------

    let events = EventBus::new();
    events.publish(WalletEvent::Unlocked);

    let signer = Arc::new(SigningService::new(Arc::clone(&store), Arc::new(AutoApprove)));

    let origin_policy = if cfg.open_origins {
        tracing::warn!("origin policy is OPEN -- every origin is accepted");
        OriginPolicy::Open
    } else {
        OriginPolicy::allow_list(core_config.allowed_origins.clone())
    };

    let transport = Arc::new(SecureTransport::new(
        origin_policy,
        Duration::from_secs(core_config.request_timeout_secs),
        events.clone(),
    ));

    // -----------------------------------------------------------------------
    // 5. Status summary
    // -----------------------------------------------------------------------

    eprintln!();
    eprintln!("============================================================");
    eprintln!("  Palisade Daemon running");
    eprintln!("============================================================");
    eprintln!("  Vault:        {}", vault_path.display());
    eprintln!("  Families:     {}", ChainFamily::ALL.map(|f| f.as_str()).join(", "));
    eprintln!(
        "  Origins:      {}",
        if cfg.open_origins { "open".to_string() } else { format!("{} allowed", cfg.allowed_origins.len()) }
    );
    eprintln!("  Protocol:     JSON lines on stdin/stdout");
    eprintln!("============================================================");
    eprintln!("  Press Ctrl+C to stop");
    eprintln!("============================================================");
    eprintln!();

    // -----------------------------------------------------------------------
    // 6. Serve the wire protocol over stdio
    // -----------------------------------------------------------------------

    serve_stdio(Arc::clone(&transport), signer).await;

    // -----------------------------------------------------------------------
    // 7. Teardown: lock before exit
    // -----------------------------------------------------------------------

    transport.shutdown().await;
    store.write().await.lock();
    events.publish(WalletEvent::Locked);

    tracing::info!("daemon stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Stdio service loop
// ---------------------------------------------------------------------------

/// Reads one JSON request per line, answers one JSON response per
/// line. Requests are handled concurrently; responses are serialized
/// through a single writer task so lines never interleave.
async fn serve_stdio(transport: Arc<SecureTransport>, signer: Arc<SigningService>) {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);
    let writer = tokio::spawn(async move {
        while let Some(line) = out_rx.recv().await {
            println!("{line}");
        }
    });

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received Ctrl+C, shutting down...");
                break;
            }
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let transport = Arc::clone(&transport);
                        let signer = Arc::clone(&signer);
                        let out_tx = out_tx.clone();
                        tokio::spawn(async move {
                            let response = handle_line(&transport, signer, &line).await;
                            match serde_json::to_string(&response) {
                                Ok(json) => {
                                    let _ = out_tx.send(json).await;
                                }
                                Err(e) => tracing::error!("response serialization failed: {e}"),
                            }
                        });
                    }
                    Ok(None) => {
                        tracing::info!("stdin closed, shutting down...");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        }
    }

    drop(out_tx);
    let _ = writer.await;
}

/// Parses and dispatches a single request line.
async fn handle_line(
    transport: &Arc<SecureTransport>,
    signer: Arc<SigningService>,
    line: &str,
) -> WireResponse {
    match serde_json::from_str::<WireRequest>(line) {
        Ok(request) => transport.handle(request, signer).await,
        Err(e) => {
            tracing::warn!("malformed request line: {e}");
            WireResponse {
                id: String::new(),
                result: None,
                error: Some("transport_error".into()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_password(prompt: &str) -> String {
    // Try env var first (for non-interactive / CI usage).
    if let Ok(password) = std::env::var("PALISADE_PASSPHRASE") {
        return password;
    }

    // Interactive prompt (simple, no echo hiding).
    eprint!("{prompt}");
    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_err() {
        eprintln!("failed to read password");
        std::process::exit(1);
    }
    input.trim().to_string()
}

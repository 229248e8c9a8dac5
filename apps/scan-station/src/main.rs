//! # ESCS Scan Station
//!
//! Terminal front end for the scan engine. Each stdin line is one scan, as a
//! keyboard-wedge scanner would type it followed by Enter.
//!
//! ## Usage
//! ```bash
//! # Defaults: platform config dir for scanner.toml, data dir for escs.db
//! cargo run -p scan-station
//!
//! # Explicit files
//! cargo run -p scan-station -- --config ./scanner.toml --db ./escs_dev.db
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Logging       tracing-subscriber, RUST_LOG overrides the default   │
//! │  2. Config        scanner.toml + ESCS_* environment                    │
//! │  3. Database      SQLite, migrations applied                           │
//! │  4. Engine        catalog → legacy → Open Library (if enabled)         │
//! │  5. Station       stdin reader feeds ScanStation::run until EOF        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod terminal;

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use escs_db::{Database, DbConfig};
use escs_scan::{
    CheckoutEngine, KeyInput, LibraryStore, MetadataLookup, MetadataResolver, OpenLibraryLookup,
    ScanConfig, ScanStation,
};
use terminal::{parse_command, ConfirmSlot, TerminalUi};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    db: Option<PathBuf>,
}

fn parse_args() -> Option<Args> {
    let argv: Vec<String> = std::env::args().collect();
    let mut args = Args::default();

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < argv.len() {
                    args.config = Some(PathBuf::from(&argv[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < argv.len() {
                    args.db = Some(PathBuf::from(&argv[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ESCS Scan Station");
                println!();
                println!("Usage: scan-station [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  scanner.toml to load");
                println!("  -d, --db <PATH>      Database file (overrides config)");
                println!("  -h, --help           Show this help message");
                println!();
                println!("Scan a student card to select the student, then scan books.");
                println!("Selection commands: :select <id>, :toggle <id>, :all, :clear");
                return None;
            }
            _ => {}
        }
        i += 1;
    }

    Some(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(args) = parse_args() else {
        return Ok(());
    };

    init_tracing();
    info!("Starting ESCS scan station");

    let config = ScanConfig::load_or_default(args.config);

    let db_path = args
        .db
        .or_else(|| config.database_path())
        .context("Could not determine a database path; pass --db")?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Creating {}", parent.display()))?;
    }
    info!(?db_path, "Database path determined");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("Opening database")?;
    let store: Arc<dyn LibraryStore> = Arc::new(db.clone());

    let lookup = OpenLibraryLookup::from_settings(&config.lookup)?
        .map(|l| Arc::new(l) as Arc<dyn MetadataLookup>);
    if lookup.is_none() {
        info!("External lookup disabled");
    }
    let resolver = MetadataResolver::standard(store.clone(), lookup, config.lookup.timeout());

    let confirms = ConfirmSlot::new();
    let ui = Arc::new(TerminalUi::new(confirms.clone()));
    let engine = CheckoutEngine::new(store, resolver, ui);

    let mut station = ScanStation::new(engine, &config.scanner);
    let render = station.engine().render().clone();
    render
        .refresh(station.selection_mut())
        .await
        .context("Loading students")?;

    let (keys_tx, keys_rx) = mpsc::channel(256);
    let reader = tokio::spawn(read_stdin(keys_tx, confirms));

    println!("Ready. Scan a student card or a book (Ctrl-D to quit).");
    let stats = station.run(keys_rx).await;

    reader.abort();
    db.close().await;

    println!(
        "Scans: {} processed, {} dropped while busy, {} duplicates ignored",
        stats.dispatched, stats.dropped_busy, stats.dropped_duplicate
    );
    Ok(())
}

/// Forwards stdin lines as keystrokes, selection commands, or as the answer
/// to a pending prompt.
async fn read_stdin(keys: mpsc::Sender<KeyInput>, confirms: ConfirmSlot) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "stdin closed");
                break;
            }
        };

        if confirms.answer(&line) {
            continue;
        }

        let inputs = match parse_command(&line) {
            Ok(Some(command)) => vec![KeyInput::Select(command)],
            Ok(None) => line
                .chars()
                .map(KeyInput::Char)
                .chain(std::iter::once(KeyInput::Submit))
                .collect(),
            Err(message) => {
                warn!(line = %line, "Unknown command");
                eprintln!("! {}", message);
                continue;
            }
        };

        if forward(&keys, inputs).await.is_err() {
            break;
        }
    }

    // Prompts opened from here on, or still open, read as "no".
    confirms.close();
}

async fn forward(
    keys: &mpsc::Sender<KeyInput>,
    inputs: Vec<KeyInput>,
) -> Result<(), mpsc::error::SendError<KeyInput>> {
    for input in inputs {
        keys.send(input).await?;
    }
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=escs_scan=trace` - Trace the engine only
/// - Default: `info,escs=debug,sqlx=warn`
///
/// Logs go to stderr so they don't interleave with the student list.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,escs=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

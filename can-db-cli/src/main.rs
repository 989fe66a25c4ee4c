//! CAN Database Matrix CLI
//!
//! Command-line front end for the can-db-matrix library. It loads a run
//! configuration (channel -> database file stacks plus an optional signal
//! worklist), builds the merged channel matrix, resolves the worklist and
//! prints a summary. The merged model can be exported as JSON for the
//! downstream decoding and reporting collaborators.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod config;
mod report;

/// CAN Database Matrix - parse bus database files and build channel indices
#[derive(Parser, Debug)]
#[command(name = "can-db-cli")]
#[command(about = "Parse CAN database files and build per-channel signal indices", long_about = None)]
#[command(version)]
struct Args {
    /// Path to run configuration (run.toml) with channels and worklist
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to database file(s) to inspect directly (can be repeated)
    #[arg(long, value_name = "FILE")]
    dbc: Vec<PathBuf>,

    /// Write the merged channel matrix as pretty JSON to this file
    #[arg(short, long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("CAN Database Matrix CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using library v{}", can_db_matrix::VERSION);

    if !args.dbc.is_empty() {
        inspect_mode(&args)?;
    } else if let Some(config_path) = &args.config {
        matrix_mode(config_path, &args)?;
    } else {
        println!("CAN Database Matrix - no input specified");
        println!("\nQuick start:");
        println!("  can-db-cli --dbc powertrain.dbc");
        println!("  can-db-cli --config run.toml --json matrix.json");
        println!("\nUse --help for more options");
    }

    Ok(())
}

/// Inspect mode - load each file into its own database and print statistics
fn inspect_mode(args: &Args) -> Result<()> {
    use can_db_matrix::Database;

    for path in &args.dbc {
        let database = Database::load(path)?;
        println!("{:?}", path);
        if let Some(version) = database.version() {
            println!("  version:  {}", version);
        }
        println!("  ecus:     {}", database.ecus().join(", "));
        println!("  messages: {}", database.message_count());
        println!("  signals:  {}", database.signal_count());

        let mut ids: Vec<_> = database.messages().map(|m| m.id_dec).collect();
        ids.sort_unstable();
        for id in ids {
            let message = database.message_by_id(id).expect("id from iteration");
            println!(
                "    {} {} ({} signals, dlc {})",
                message.id_hex(),
                message.name,
                message.signals.len(),
                message.dlc
            );
        }
    }
    Ok(())
}

/// Matrix mode - build the channel matrix from a run configuration
fn matrix_mode(config_path: &PathBuf, args: &Args) -> Result<()> {
    use can_db_matrix::{classify, locate, ChannelMatrix};

    log::info!("Loading configuration from: {:?}", config_path);
    let config = config::load_config(config_path)?;

    let matrix = ChannelMatrix::build(&config.root_dir, &config.channels);

    println!("Channel matrix ({} channels):", matrix.channel_count());
    for key in config.channels.keys() {
        let index = matrix.channel(key).expect("configured channel");
        println!(
            "  {}: {} files loaded, {} messages, {} signals",
            key,
            index.loaded_paths().len(),
            index.message_count(),
            index.signal_count()
        );
    }

    if let Some(worklist) = &config.worklist {
        let plan = classify(&worklist.signals, &worklist.fallback_identity);
        println!("\nWorklist ({} signals):", worklist.signals.len());
        println!("  identity key: {}", plan.identity_key);
        println!("  categorical:  {}", plan.categorical.join(", "));
        println!("  continuous:   {}", plan.continuous.join(", "));

        let locations = locate(&worklist.signals, &matrix);
        for (name, owners) in &locations {
            if owners.is_empty() {
                println!("  {} -> (not defined on any channel)", name);
            } else {
                println!("  {} -> {}", name, owners.join(", "));
            }
        }
    }

    if let Some(json_path) = &args.json {
        let export = report::channel_matrix_export(&matrix);
        std::fs::write(json_path, serde_json::to_string_pretty(&export)?)?;
        println!("\nMatrix written to {:?}", json_path);
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

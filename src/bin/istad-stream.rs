//! istad-stream CLI - drives the stream functions from an NDJSON message feed
//!
//! Reads inbound message envelopes (one JSON object per line), dispatches each
//! to the function bound to its destination and writes transform output as
//! NDJSON on stdout. Logs and trace lines go to stderr.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use istad_stream::{
    process_feed, BindingConfig, Dispatcher, FunctionRegistry, LogTraceSink, NdjsonWriter,
    StreamError,
};

#[derive(Parser)]
#[command(name = "istad-stream")]
#[command(version, about = "Run named stream functions over a message feed", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch every envelope in the input feed
    Run {
        /// Path to the binding configuration
        #[arg(short, long, default_value = "bindings.yaml")]
        config: PathBuf,

        /// NDJSON file of inbound envelopes (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Load the binding configuration and print the resolved routes
    Validate {
        /// Path to the binding configuration
        #[arg(short, long, default_value = "bindings.yaml")]
        config: PathBuf,
    },

    /// List registered stream functions
    Functions,
}

fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = FunctionRegistry::with_builtin_functions();

    let result = match cli.command {
        Commands::Run { config, input } => run(&registry, config, input),
        Commands::Validate { config } => validate(&registry, config),
        Commands::Functions => {
            list_functions(&registry);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(
    registry: &FunctionRegistry,
    config: PathBuf,
    input: Option<PathBuf>,
) -> Result<(), StreamError> {
    let config = BindingConfig::load_from_file(&config)?;
    let dispatcher = Dispatcher::new(registry, &config)?;

    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            let file = File::open(&path).map_err(|e| {
                StreamError::Config(format!("Failed to open input {}: {}", path.display(), e))
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stdout = io::stdout();
    let mut writer = NdjsonWriter::new(stdout.lock());
    let trace = LogTraceSink;

    let summary = process_feed(&dispatcher, reader, &mut writer, &trace)?;

    tracing::info!(
        "Processed {} messages ({} emitted, {} failed)",
        summary.processed,
        summary.emitted,
        summary.failed
    );

    if summary.failed > 0 {
        return Err(StreamError::fault(format!(
            "{} of {} messages failed",
            summary.failed, summary.processed
        )));
    }

    Ok(())
}

fn validate(registry: &FunctionRegistry, config: PathBuf) -> Result<(), StreamError> {
    println!("Validating {}...", config.display());

    let config = BindingConfig::load_from_file(&config)?;
    let dispatcher = Dispatcher::new(registry, &config)?;

    for route in dispatcher.routes() {
        match &route.outbound {
            Some(outbound) => println!(
                "  ✓ {} -> {} ({}) -> {}",
                route.destination, route.function, route.kind, outbound
            ),
            None => println!(
                "  ✓ {} -> {} ({})",
                route.destination, route.function, route.kind
            ),
        }
    }

    println!("✅ {} bindings valid", dispatcher.routes().len());
    Ok(())
}

fn list_functions(registry: &FunctionRegistry) {
    for name in registry.list_functions() {
        if let Some(function) = registry.get(&name) {
            println!("{:<24} {}", name, function.kind());
        }
    }
}

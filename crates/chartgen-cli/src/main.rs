//! chartgen - Difficulty tier generator for rhythm-game charts
//!
//! Usage:
//!   chartgen generate <folder>...   Generate Easy/Medium/Hard tracks
//!   chartgen convert <file.mid>     Convert a MIDI chart to .chart text
//!   chartgen history                Show recent activity
//!   chartgen config                 Show the configuration file
//!   chartgen --help                 Show help

use tracing_subscriber::EnvFilter;

use chartgen_core::config::Config;

mod cli;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        cli::print_help();
        return Ok(());
    }

    let config = Config::load();
    init_logging(&config);

    match cli::parse_args(&args) {
        Ok((command, options)) => cli::run(command, options),
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            cli::print_help();
            std::process::exit(1);
        }
    }
}

fn init_logging(config: &Config) {
    // RUST_LOG wins; otherwise use the configured level. Logs go to stderr so
    // --json output on stdout stays clean.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

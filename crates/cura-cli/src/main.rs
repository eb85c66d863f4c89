//! cura: drive the CURA Healthcare demo site from the command line
//!
//! ## Usage
//!
//! ```bash
//! cura book --facility seoul --program medicaid --readmission
//! cura security sql-injection --settle-ms 500
//! cura petstore find-by-status sold
//! cura --base-url http://localhost:8080/ config
//! ```

use clap::Parser;
use cura_cli::{
    load_probe_config, run_book, run_config, run_petstore, run_security, Cli, CliConfig,
    CliResult, Commands,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let cli_config = CliConfig::from_cli(&cli);
    console::set_colors_enabled(cli_config.color.should_color());

    let config = load_probe_config(&cli, cli_config.verbosity)?;
    cura_probe::logging::init(&config.log)?;

    match &cli.command {
        Commands::Book(args) => run_book(&config, args),
        Commands::Security(args) => run_security(&config, args),
        Commands::Petstore(args) => run_petstore(args),
        Commands::Config => run_config(&config),
    }
}

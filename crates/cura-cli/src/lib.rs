//! cura CLI library
//!
//! Command-line front end for `cura-probe`: argument parsing, config
//! overrides, subcommand execution and result rendering.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    BookArgs, Cli, ColorArg, Commands, FacilityArg, OutputFormatArg, PetStatusArg, PetstoreArgs,
    PetstoreCommand, ProbeArg, ProgramArg, SecurityArgs,
};
pub use config::{load_probe_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
pub use runner::{run_book, run_config, run_petstore, run_security};

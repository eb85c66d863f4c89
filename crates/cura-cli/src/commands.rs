//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use cura_probe::api::DEFAULT_PETSTORE_URL;
use cura_probe::{Facility, HealthcareProgram, PetStatus};
use std::path::PathBuf;

/// cura: drive the CURA Healthcare demo site and the Petstore demo API
#[derive(Parser, Debug)]
#[command(name = "cura")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML configuration file
    #[arg(short, long, env = "CURA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// chromedriver endpoint
    #[arg(long, env = "CURA_WEBDRIVER_URL", global = true)]
    pub webdriver_url: Option<String>,

    /// Site root of the CURA demo
    #[arg(long, env = "CURA_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Run the browser without a window
    #[arg(long, global = true)]
    pub headless: bool,

    /// Append logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in, book an appointment, verify the confirmation and log out
    Book(BookArgs),

    /// Run SQL injection, XSS and authentication probes
    Security(SecurityArgs),

    /// Call the Petstore demo API
    Petstore(PetstoreArgs),

    /// Print the effective configuration as YAML
    Config,
}

/// Arguments for the book command
#[derive(Args, Debug)]
pub struct BookArgs {
    /// Facility to book at
    #[arg(long)]
    pub facility: Option<FacilityArg>,

    /// Healthcare program
    #[arg(long)]
    pub program: Option<ProgramArg>,

    /// Apply for hospital readmission
    #[arg(long)]
    pub readmission: bool,

    /// Visit date (dd/mm/YYYY or YYYY-MM-DD)
    #[arg(long)]
    pub visit_date: Option<String>,

    /// Comment
    #[arg(long)]
    pub comment: Option<String>,

    /// Stay logged in after booking
    #[arg(long)]
    pub no_logout: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the security command
#[derive(Args, Debug)]
pub struct SecurityArgs {
    /// Probe to run
    #[arg(value_enum, default_value = "all")]
    pub probe: ProbeArg,

    /// Milliseconds to let the page settle after each submit
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormatArg,
}

/// Arguments for the petstore command
#[derive(Args, Debug)]
pub struct PetstoreArgs {
    /// API root
    #[arg(long = "api-url", env = "CURA_PETSTORE_URL", default_value = DEFAULT_PETSTORE_URL)]
    pub api_url: String,

    /// Petstore operation
    #[command(subcommand)]
    pub command: PetstoreCommand,
}

/// Petstore operations
#[derive(Subcommand, Debug)]
pub enum PetstoreCommand {
    /// Add a pet
    AddPet {
        /// Pet id
        #[arg(long)]
        id: Option<i64>,
        /// Pet name
        #[arg(long)]
        name: String,
        /// Availability
        #[arg(long, default_value = "available")]
        status: PetStatusArg,
    },
    /// Fetch a pet by id
    GetPet {
        /// Pet id
        id: i64,
    },
    /// List pets with a status
    FindByStatus {
        /// Availability
        #[arg(default_value = "available")]
        status: PetStatusArg,
    },
    /// Delete a pet by id
    DeletePet {
        /// Pet id
        id: i64,
    },
}

/// Which security probe to run
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeArg {
    /// SQL injection through the login form
    SqlInjection,
    /// Markup in the login fields and the booking comment
    Xss,
    /// Brute force, direct access and post-logout checks
    Auth,
    /// Every probe
    All,
}

impl ProbeArg {
    /// Whether the SQL injection probe is selected
    #[must_use]
    pub const fn sql_injection(self) -> bool {
        matches!(self, Self::SqlInjection | Self::All)
    }

    /// Whether the XSS probe is selected
    #[must_use]
    pub const fn xss(self) -> bool {
        matches!(self, Self::Xss | Self::All)
    }

    /// Whether the authentication probe is selected
    #[must_use]
    pub const fn auth(self) -> bool {
        matches!(self, Self::Auth | Self::All)
    }
}

/// Facility choice
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacilityArg {
    /// Tokyo CURA Healthcare Center
    Tokyo,
    /// Hongkong CURA Healthcare Center
    Hongkong,
    /// Seoul CURA Healthcare Center
    Seoul,
}

impl From<FacilityArg> for Facility {
    fn from(arg: FacilityArg) -> Self {
        match arg {
            FacilityArg::Tokyo => Self::Tokyo,
            FacilityArg::Hongkong => Self::Hongkong,
            FacilityArg::Seoul => Self::Seoul,
        }
    }
}

/// Program choice
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgramArg {
    /// Medicare
    Medicare,
    /// Medicaid
    Medicaid,
    /// None
    None,
}

impl From<ProgramArg> for HealthcareProgram {
    fn from(arg: ProgramArg) -> Self {
        match arg {
            ProgramArg::Medicare => Self::Medicare,
            ProgramArg::Medicaid => Self::Medicaid,
            ProgramArg::None => Self::None,
        }
    }
}

/// Pet status choice
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PetStatusArg {
    /// In stock
    Available,
    /// Reserved
    Pending,
    /// Gone
    Sold,
}

impl From<PetStatusArg> for PetStatus {
    fn from(arg: PetStatusArg) -> Self {
        match arg {
            PetStatusArg::Available => Self::Available,
            PetStatusArg::Pending => Self::Pending,
            PetStatusArg::Sold => Self::Sold,
        }
    }
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_book_args() {
            let cli = Cli::try_parse_from([
                "cura",
                "--headless",
                "book",
                "--facility",
                "seoul",
                "--program",
                "medicaid",
                "--readmission",
                "--visit-date",
                "25/07/2025",
            ])
            .unwrap();
            assert!(cli.headless);
            match cli.command {
                Commands::Book(args) => {
                    assert_eq!(args.facility, Some(FacilityArg::Seoul));
                    assert_eq!(args.program, Some(ProgramArg::Medicaid));
                    assert!(args.readmission);
                    assert_eq!(args.format, OutputFormatArg::Text);
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn test_security_defaults_to_all() {
            let cli = Cli::try_parse_from(["cura", "security"]).unwrap();
            match cli.command {
                Commands::Security(args) => {
                    assert_eq!(args.probe, ProbeArg::All);
                    assert!(args.probe.sql_injection() && args.probe.xss() && args.probe.auth());
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn test_security_xss_only() {
            let cli = Cli::try_parse_from(["cura", "security", "xss"]).unwrap();
            match cli.command {
                Commands::Security(args) => {
                    assert!(args.probe.xss());
                    assert!(!args.probe.sql_injection() && !args.probe.auth());
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn test_petstore_subcommand() {
            let cli = Cli::try_parse_from([
                "cura",
                "petstore",
                "--api-url",
                "http://localhost:8080/v2",
                "find-by-status",
                "sold",
            ])
            .unwrap();
            match cli.command {
                Commands::Petstore(args) => {
                    assert_eq!(args.api_url, "http://localhost:8080/v2");
                    assert!(matches!(
                        args.command,
                        PetstoreCommand::FindByStatus {
                            status: PetStatusArg::Sold
                        }
                    ));
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }

        #[test]
        fn test_verbose_counts() {
            let cli = Cli::try_parse_from(["cura", "-vv", "config"]).unwrap();
            assert_eq!(cli.verbose, 2);
        }

        #[test]
        fn test_unknown_facility_rejected() {
            assert!(Cli::try_parse_from(["cura", "book", "--facility", "paris"]).is_err());
        }
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Facility::from(FacilityArg::Hongkong), Facility::Hongkong);
        assert_eq!(HealthcareProgram::from(ProgramArg::None), HealthcareProgram::None);
        assert_eq!(PetStatus::from(PetStatusArg::Pending), PetStatus::Pending);
    }
}

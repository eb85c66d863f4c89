//! CLI configuration

use crate::commands::{Cli, ColorArg};
use crate::error::CliResult;
use cura_probe::ProbeConfig;
use serde::{Deserialize, Serialize};

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - level from the config file
    #[default]
    Normal,
    /// Verbose - debug logs
    Verbose,
    /// Debug - trace logs
    Debug,
}

impl Verbosity {
    /// Derive from `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Log level this verbosity forces, if any
    #[must_use]
    pub const fn log_level(self) -> Option<&'static str> {
        match self {
            Self::Quiet => Some("error"),
            Self::Normal => None,
            Self::Verbose => Some("debug"),
            Self::Debug => Some("trace"),
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Always => Self::Always,
            ColorArg::Auto => Self::Auto,
            ColorArg::Never => Self::Never,
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Build from parsed arguments
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self::new()
            .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
            .with_color(cli.color.into())
    }
}

/// Load the config file (or defaults) and apply command-line overrides.
///
/// Precedence: flag or environment variable, then file, then built-in default.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the
/// merged configuration is invalid.
pub fn load_probe_config(cli: &Cli, verbosity: Verbosity) -> CliResult<ProbeConfig> {
    let mut config = match &cli.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    if let Some(url) = &cli.webdriver_url {
        config.driver.webdriver_url.clone_from(url);
    }
    if let Some(url) = &cli.base_url {
        config.site.base_url.clone_from(url);
    }
    if cli.headless {
        config.driver.headless = true;
    }
    if let Some(path) = &cli.log_file {
        config.log.file = Some(path.clone());
    }
    if cli.json_logs {
        config.log.json = true;
    }
    if let Some(level) = verbosity.log_level() {
        config.log.level = level.to_string();
        config.log.force_level = true;
    }
    config.validate()?;
    Ok(config)
}

//! Result rendering

use crate::commands::OutputFormatArg;
use console::{style, Term};
use cura_probe::{BookingOutcome, SecurityReport, Severity};
use serde::Serialize;
use std::io;

/// Writes command results to stdout
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    format: OutputFormatArg,
}

impl Reporter {
    /// Create a reporter for `format`
    #[must_use]
    pub fn new(format: OutputFormatArg) -> Self {
        Self {
            term: Term::stdout(),
            format,
        }
    }

    /// Pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn json<T: Serialize + ?Sized>(&self, value: &T) -> crate::CliResult<()> {
        self.term.write_line(&serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    /// Raw text block
    pub fn text(&self, text: &str) -> io::Result<()> {
        self.term.write_str(text)?;
        self.term.flush()
    }

    /// Confirmation details of a booking
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn booking(&self, outcome: &BookingOutcome) -> crate::CliResult<()> {
        if self.format == OutputFormatArg::Json {
            return self.json(outcome);
        }
        let d = &outcome.details;
        self.term
            .write_line(&format!("{}", style("Appointment Confirmation").green().bold()))?;
        for (label, value) in [
            ("Facility", &d.facility),
            ("Readmission", &d.readmission),
            ("Program", &d.program),
            ("Visit date", &d.visit_date),
            ("Comment", &d.comment),
        ] {
            self.term
                .write_line(&format!("  {:<12} {value}", style(label).dim()))?;
        }
        self.term.write_line(&format!(
            "  {:<12} {}",
            style("Screenshot").dim(),
            outcome.screenshot.display()
        ))?;
        Ok(())
    }

    /// Findings of one or more probes
    ///
    /// # Errors
    ///
    /// Returns an I/O or serialization error.
    pub fn security(&self, reports: &[SecurityReport]) -> crate::CliResult<()> {
        if self.format == OutputFormatArg::Json {
            return self.json(reports);
        }
        for report in reports {
            self.term
                .write_line(&format!("{}", style(&report.probe).bold()))?;
            for finding in &report.findings {
                let tag = match finding.severity {
                    Severity::Info => style("INFO    ").green(),
                    Severity::Warning => style("WARNING ").yellow(),
                    Severity::Critical => style("CRITICAL").red().bold(),
                };
                let payload = finding
                    .payload
                    .as_deref()
                    .map(|p| format!(" [{p}]"))
                    .unwrap_or_default();
                self.term.write_line(&format!(
                    "  {tag} {}: {}{payload}",
                    finding.check, finding.message
                ))?;
            }
        }
        Ok(())
    }
}

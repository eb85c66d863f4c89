//! Subcommand execution

use crate::commands::{BookArgs, OutputFormatArg, PetstoreArgs, PetstoreCommand, SecurityArgs};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use cura_probe::config::parse_visit_date;
use cura_probe::{
    AuthProbe, BookingScenario, Driver, Pet, PetstoreClient, ProbeConfig, SecurityReport, Session,
    Severity, SqlInjectionProbe, WebDriverSession, XssProbe,
};
use std::time::Duration;
use tracing::{info, warn};

/// Book an appointment in a fresh browser session
///
/// # Errors
///
/// Returns an error for an unparseable visit date, a failed browser
/// session, or a failing booking step.
pub fn run_book(config: &ProbeConfig, args: &BookArgs) -> CliResult<()> {
    let mut config = config.clone();
    let appointment = &mut config.appointment;
    if let Some(facility) = args.facility {
        appointment.facility = facility.into();
    }
    if let Some(program) = args.program {
        appointment.program = program.into();
    }
    if args.readmission {
        appointment.readmission = true;
    }
    if let Some(date) = &args.visit_date {
        appointment.visit_date =
            parse_visit_date(date).map_err(|e| CliError::invalid_argument(e.to_string()))?;
    }
    if let Some(comment) = &args.comment {
        appointment.comment.clone_from(comment);
    }

    let session = Session::new(WebDriverSession::connect(&config.driver)?);
    let outcome = BookingScenario::new(&config)
        .with_logout(!args.no_logout)
        .run(&session);
    if let Err(e) = session.close() {
        warn!(error = %e, "failed to close browser session");
    }
    let outcome = outcome?;
    info!(screenshot = %outcome.screenshot.display(), "booking confirmed");
    Reporter::new(args.format).booking(&outcome)
}

/// Run the selected security probes
///
/// A probe that cannot run is reported as an aborted check and the
/// remaining probes still run.
///
/// # Errors
///
/// Returns [`CliError::CriticalFindings`] if any probe found an
/// exploitable weakness, or an error if the browser session cannot start.
pub fn run_security(config: &ProbeConfig, args: &SecurityArgs) -> CliResult<()> {
    let settle = args.settle_ms.map(Duration::from_millis);
    let session = Session::new(WebDriverSession::connect(&config.driver)?);
    let reports = collect_reports(config, args, settle, &session);
    if let Err(e) = session.close() {
        warn!(error = %e, "failed to close browser session");
    }

    Reporter::new(args.format).security(&reports)?;
    let critical: usize = reports
        .iter()
        .map(|r| r.count(Severity::Critical))
        .sum();
    if critical > 0 {
        return Err(CliError::CriticalFindings { count: critical });
    }
    Ok(())
}

fn collect_reports<D: Driver>(
    config: &ProbeConfig,
    args: &SecurityArgs,
    settle: Option<Duration>,
    session: &Session<D>,
) -> Vec<SecurityReport> {
    let mut reports = Vec::new();
    if args.probe.sql_injection() {
        let mut probe = SqlInjectionProbe::new(config);
        if let Some(settle) = settle {
            probe = probe.with_settle(settle);
        }
        reports.push(finish(SqlInjectionProbe::NAME, probe.run(session)));
    }
    if args.probe.xss() {
        let mut probe = XssProbe::new(config);
        if let Some(settle) = settle {
            probe = probe.with_settle(settle);
        }
        reports.push(finish(XssProbe::NAME, probe.run(session)));
    }
    if args.probe.auth() {
        let mut probe = AuthProbe::new(config);
        if let Some(settle) = settle {
            probe = probe.with_settle(settle);
        }
        reports.push(finish(AuthProbe::NAME, probe.run(session)));
    }
    reports
}

fn finish(probe: &str, outcome: cura_probe::ProbeResult<SecurityReport>) -> SecurityReport {
    outcome.unwrap_or_else(|e| {
        warn!(probe, error = %e, "probe could not run");
        SecurityReport::aborted(probe, &e)
    })
}

/// Call one Petstore operation and print the response body as JSON
///
/// # Errors
///
/// Returns an error if the runtime cannot start, the request fails,
/// or the API answers with a non-2xx status.
pub fn run_petstore(args: &PetstoreArgs) -> CliResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let client = PetstoreClient::new(args.api_url.as_str())?;
    runtime.block_on(petstore_call(&client, &args.command))
}

async fn petstore_call(client: &PetstoreClient, command: &PetstoreCommand) -> CliResult<()> {
    let reporter = Reporter::new(OutputFormatArg::Json);
    match command {
        PetstoreCommand::AddPet { id, name, status } => {
            let mut pet = Pet::new(name.as_str()).with_status((*status).into());
            if let Some(id) = id {
                pet = pet.with_id(*id);
            }
            reporter.json(&client.add_pet(&pet).await?.into_body()?)
        }
        PetstoreCommand::GetPet { id } => reporter.json(&client.get_pet(*id).await?.into_body()?),
        PetstoreCommand::FindByStatus { status } => {
            let pets = client.find_by_status((*status).into()).await?.into_body()?;
            info!(count = pets.len(), "pets found");
            reporter.json(&pets)
        }
        PetstoreCommand::DeletePet { id } => {
            reporter.json(&client.delete_pet(*id).await?.into_body()?)
        }
    }
}

/// Print the effective configuration with the password hidden
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn run_config(config: &ProbeConfig) -> CliResult<()> {
    let mut shown = config.clone();
    shown.credentials = shown.credentials.redacted();
    Reporter::new(OutputFormatArg::Text).text(&shown.to_yaml()?)?;
    Ok(())
}

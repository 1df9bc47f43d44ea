use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use serde::Serialize;

use speed_sentry::api::{LatencyPlotSettings, MonitorSettings};
use speed_sentry::cli::{ApplyArgs, Cli, Commands};
use speed_sentry::config::load_configuration;
use speed_sentry::logging::init_logging;
use speed_sentry::RestApiClient;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_config.as_deref()) {
        eprintln!("Could not initialize logging: {:#}", e);
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error:? = e; "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

/// Runs one command. `Ok(false)` means the service refused or could not be
/// reached; the cause is in the log.
fn run(cli: Cli) -> Result<bool> {
    let mut settings = load_configuration(&cli.config)?;
    settings.apply_connection(&cli.connection);
    let client = settings.build_client()?;

    match cli.command {
        Commands::Capabilities => print_some(client.capabilities_get()),
        Commands::HostsGet { host_scheme_id } => print_some(client.hosts_get(host_scheme_id)),
        Commands::HostsList => print_some(client.hosts_list()),
        Commands::MonitorsGet { monitor_id } => print_some(client.monitors_get(monitor_id)),
        Commands::MonitorsList { order_by } => print_some(client.monitors_list(order_by.into())),
        Commands::MonitorsUpdate { file } => update_monitors(&client, &file),
        Commands::RegionsGet { region_id } => print_some(client.regions_get(region_id)),
        Commands::RegionsList => print_some(client.regions_list()),
        Commands::EventsGet { event_id } => print_some(client.events_get(event_id)),
        Commands::EventsList { start, end } => print_some(client.events_list(start, end)),
        Commands::EventsCreate {
            event_type,
            message,
            monitor_id,
        } => Ok(report(client.events_create(event_type, &message, monitor_id), "Event created")),
        Commands::StatusGet { monitor_id } => print_some(client.status_get(monitor_id)),
        Commands::StatusList => print_some(client.status_list()),
        Commands::MultipleList => print_some(client.multiple_list()),
        Commands::LatencyList {
            monitor_id,
            region_id,
            start,
            end,
        } => print_some(client.latency_list(monitor_id, region_id, start, end)),
        Commands::LatencyPlot { output, plot } => write_plot(&client, &LatencyPlotSettings::from(plot), &output),
        Commands::CustomerPause { resume } => {
            let message = if resume { "Monitoring resumed" } else { "Monitoring paused" };
            Ok(report(client.customer_pause(!resume), message))
        },
        Commands::TimeDelta => {
            if !client.refresh_time_delta() {
                return Ok(report(false, ""));
            }
            println!("{}", client.time_delta());
            Ok(true)
        },
    }
}

fn print_some<T: Serialize>(value: Option<T>) -> Result<bool> {
    let Some(value) = value else {
        return Ok(report(false, ""));
    };
    let text = serde_json::to_string_pretty(&value).context("Failed to format response")?;
    println!("{}", text);
    Ok(true)
}

fn report(succeeded: bool, message: &str) -> bool {
    if succeeded {
        println!("{}", message);
    } else {
        eprintln!("Request failed, see the log for details");
    }
    succeeded
}

fn update_monitors(client: &RestApiClient, file: &Path) -> Result<bool> {
    let contents = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let monitors: Vec<MonitorSettings> =
        serde_json::from_slice(&contents).context("Monitor file must hold a JSON array of monitor entries")?;

    let Some(errors) = client.monitors_update(&monitors) else {
        return Ok(report(false, ""));
    };
    if errors.as_array().is_some_and(Vec::is_empty) {
        info!(count = monitors.len(); "Monitors updated");
        return Ok(report(true, "Monitors updated"));
    }

    let text = serde_json::to_string_pretty(&errors).context("Failed to format errors")?;
    eprintln!("Update refused:\n{}", text);
    Ok(false)
}

fn write_plot(client: &RestApiClient, settings: &LatencyPlotSettings, output: &Path) -> Result<bool> {
    let Some(plot) = client.latency_plot(settings) else {
        return Ok(report(false, ""));
    };
    if !plot.is_image() {
        eprintln!("Plot could not be rendered: {}", String::from_utf8_lossy(&plot.body));
        return Ok(false);
    }

    fs::write(output, &plot.body).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path:% = output.display(), bytes = plot.body.len(); "Latency plot written");
    println!("{}", output.display());
    Ok(true)
}

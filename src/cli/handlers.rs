use std::path::Path;

use crate::api::{self, AppState};
use crate::config::Config;
use crate::entity::{Incident, IncidentDraft};
use crate::error::Result;
use crate::ingest::IngestReport;
use crate::service::IncidentService;

fn print_incident_line(incident: &Incident) {
    println!(
        "  {} [{}] {:<6} {:<10} {}",
        incident.short_id(),
        incident.status,
        incident.severity,
        incident.category,
        incident.title
    );
}

fn print_incident(incident: &Incident) {
    println!("{} ({})", incident.title, incident.id);
    println!("  Status:      {}", incident.status);
    println!("  Category:    {}", incident.category);
    println!("  Severity:    {}", incident.severity);
    println!("  Reported at: {}", incident.reported_at.to_rfc3339());
    println!();
    println!("{}", incident.description);
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn handle_serve(config: &Config, port: Option<u16>) -> Result<()> {
    let state = AppState {
        service: IncidentService::from_config(config),
        hide_archived_by_default: config.hide_archived_by_default,
    };
    api::serve(state, port.unwrap_or(config.port)).await?;
    Ok(())
}

pub async fn handle_list(config: &Config, all: bool, json: bool) -> Result<()> {
    let service = IncidentService::from_config(config);
    let incidents = service.list(all || !config.hide_archived_by_default).await?;

    if json {
        return print_json(&incidents);
    }

    if incidents.is_empty() {
        println!("No incidents found.");
    } else {
        for incident in &incidents {
            print_incident_line(incident);
        }
    }
    Ok(())
}

pub async fn handle_get(config: &Config, id: String, json: bool) -> Result<()> {
    let service = IncidentService::from_config(config);
    let incident = service.get_by_id(&id).await?;

    if json {
        print_json(&incident)
    } else {
        print_incident(&incident);
        Ok(())
    }
}

pub async fn handle_add(
    config: &Config,
    title: String,
    description: String,
    category: String,
    severity: String,
    json: bool,
) -> Result<()> {
    let service = IncidentService::from_config(config);
    let incident = service
        .create(IncidentDraft::new(title, description, category, severity))
        .await?;

    if json {
        print_json(&incident)
    } else {
        println!("Created incident {} - {}", incident.short_id(), incident.title);
        Ok(())
    }
}

pub async fn handle_status(config: &Config, id: String, status: String, json: bool) -> Result<()> {
    let service = IncidentService::from_config(config);
    let incident = service.transition_status(&id, &status).await?;

    if json {
        print_json(&incident)
    } else {
        println!("Incident {} is now {}", incident.short_id(), incident.status);
        Ok(())
    }
}

pub async fn handle_archive(config: &Config, id: String) -> Result<()> {
    let incident = IncidentService::from_config(config).archive(&id).await?;
    println!("Archived incident {}", incident.short_id());
    Ok(())
}

pub async fn handle_reopen(config: &Config, id: String) -> Result<()> {
    let incident = IncidentService::from_config(config).reopen(&id).await?;
    println!("Reopened incident {}", incident.short_id());
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!(
        "Processed {} rows: {} created, {} skipped",
        report.total_rows, report.created, report.skipped
    );
    for invalid in &report.invalid_rows {
        println!("  row {}: {}", invalid.row, invalid.errors.join("; "));
    }
}

pub async fn handle_import(config: &Config, file: &Path, json: bool) -> Result<()> {
    let service = IncidentService::from_config(config);
    let report = service.import_file(file).await?;

    if json {
        print_json(&report)
    } else {
        print_report(&report);
        Ok(())
    }
}

use std::sync::Arc;

use clap::ArgMatches;
use serde::Serialize;
use tracing::{error, info};

use locwatch_core::{
    DirectorySource, LoadStatus, Snapshot, StatusIndicator, Workspace, status_indicator,
};

use super::helpers;
use crate::color;

#[derive(Debug, Serialize)]
struct LocationLine {
    name: String,
    load_status: LoadStatus,
    update_timestamp: i64,
    repositories: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusOutput {
    indicator: Option<StatusIndicator>,
    locations: Vec<LocationLine>,
}

fn build_output(snapshot: &Snapshot, workspace: &Workspace) -> StatusOutput {
    let locations = snapshot
        .iter()
        .map(|entry| {
            let detail = workspace.detail(&entry.name);
            LocationLine {
                name: entry.name.clone(),
                load_status: entry.load_status,
                update_timestamp: entry.update_timestamp,
                repositories: detail.as_ref().map_or(0, |d| d.repositories().len()),
                error: detail
                    .as_ref()
                    .and_then(|d| d.error_message().map(str::to_string)),
            }
        })
        .collect();

    StatusOutput {
        indicator: status_indicator(snapshot.any_loading(), workspace),
        locations,
    }
}

pub(crate) fn handle_status_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let config = helpers::load_config_with_warning();
    let source_dir = helpers::resolve_source_dir(matches, &config)?;

    info!(
        event = "cli.status_started",
        source = %source_dir.display(),
        json_output = json_output,
    );

    let store = helpers::open_store(&config)?;
    let source = Arc::new(DirectorySource::new(source_dir));
    let runner = helpers::quiet_runner(store, Arc::clone(&source));

    let rt = tokio::runtime::Runtime::new()?;
    let (snapshot, report) = match rt.block_on(helpers::poll_and_load(&source, &runner)) {
        Ok(result) => result,
        Err(e) => {
            error!(event = "cli.status_failed", error = %e);
            return Err(e);
        }
    };

    let output = build_output(&snapshot, runner.workspace());

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if output.locations.is_empty() {
        println!("No code locations.");
    } else {
        println!("{}", color::indicator(output.indicator.as_ref()));
        println!();
        let width = output
            .locations
            .iter()
            .map(|l| l.name.len())
            .max()
            .unwrap_or(0);
        for line in &output.locations {
            let detail = match &line.error {
                Some(message) => color::failure(message),
                None => color::muted(&helpers::plural(
                    line.repositories,
                    "repository",
                    "repositories",
                )),
            };
            println!(
                "  {}  {:<8}  {}",
                color::accent(&format!("{:<width$}", line.name, width = width)),
                color::load_status(line.load_status),
                detail
            );
        }
    }

    info!(
        event = "cli.status_completed",
        locations = snapshot.len(),
        loaded = report.loaded.len(),
        failed = report.failed.len(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use locwatch_core::{LocationDetail, StatusEntry};

    #[test]
    fn test_build_output_reports_errors_and_counts() {
        let snapshot = Snapshot::new(vec![
            StatusEntry::new("1", "etl", LoadStatus::Loaded, 3),
            StatusEntry::new("2", "ml", LoadStatus::Failed, 4),
        ]);
        let workspace = Workspace::new();
        workspace.track(&snapshot);
        workspace.apply("etl", 3, LocationDetail::loaded("etl", &["a", "b"]));
        workspace.apply("ml", 4, LocationDetail::failed("ml", "SyntaxError"));

        let output = build_output(&snapshot, &workspace);

        assert_eq!(output.locations[0].repositories, 2);
        assert_eq!(output.locations[0].error, None);
        assert_eq!(output.locations[1].error.as_deref(), Some("SyntaxError"));
        assert_eq!(
            output.indicator.unwrap().content(),
            "1 code location failed to load"
        );
    }

    #[test]
    fn test_build_output_spinner_while_loading() {
        let snapshot = Snapshot::new(vec![StatusEntry::new("1", "etl", LoadStatus::Loading, 1)]);
        let output = build_output(&snapshot, &Workspace::new());
        assert!(matches!(output.indicator, Some(StatusIndicator::Spinner { .. })));
    }
}

use std::collections::BTreeSet;
use std::sync::Arc;

use clap::ArgMatches;
use serde::Serialize;
use tracing::{error, info, warn};

use locwatch_core::{DirectorySource, RepoOption, VisibilityKey, VisibilityStore};

use super::helpers;
use crate::color;

#[derive(Debug, Serialize, PartialEq, Eq)]
struct RepoLine {
    repository: String,
    location: String,
    hidden: bool,
}

/// Rows for `repos`. Without `all`, hidden repositories are dropped.
fn build_lines(visible: &[RepoOption], all: &[RepoOption], show_all: bool) -> Vec<RepoLine> {
    let visible_keys: BTreeSet<String> = visible.iter().map(|r| r.visibility_key()).collect();
    let rows = if show_all { all } else { visible };
    rows.iter()
        .map(|r| RepoLine {
            repository: r.repository.clone(),
            location: r.location.clone(),
            hidden: !visible_keys.contains(&r.visibility_key()),
        })
        .collect()
}

pub(crate) fn handle_repos_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let json_output = matches.get_flag("json");
    let show_all = matches.get_flag("all");
    let config = helpers::load_config_with_warning();
    let source_dir = helpers::resolve_source_dir(matches, &config)?;

    info!(
        event = "cli.repos_started",
        source = %source_dir.display(),
        show_all = show_all,
    );

    let store = helpers::open_store(&config)?;
    let source = Arc::new(DirectorySource::new(source_dir));
    let runner = helpers::quiet_runner(Arc::clone(&store), Arc::clone(&source));
    let visibility = VisibilityStore::new(store, config.visibility.base_path());

    let rt = tokio::runtime::Runtime::new()?;
    let (all, visible) = rt.block_on(async {
        let (_, report) = helpers::poll_and_load(&source, &runner).await?;
        if !report.failed.is_empty() {
            warn!(
                event = "cli.repos_partial",
                failed = report.failed.len(),
            );
        }
        let all = runner.workspace().all_repos();
        let visible = visibility.visible_entities(&all).await;
        Ok::<_, Box<dyn std::error::Error>>((all, visible))
    })
    .inspect_err(|e| error!(event = "cli.repos_failed", error = %e))?;

    let lines = build_lines(&visible, &all, show_all);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else if lines.is_empty() {
        println!("No repositories.");
    } else {
        for line in &lines {
            let address = format!(
                "{}{}{}",
                color::accent(&line.repository),
                color::muted("@"),
                line.location
            );
            if line.hidden {
                println!("  {} {}", address, color::muted("(hidden)"));
            } else {
                println!("  {}", address);
            }
        }
        let hidden = all.len() - visible.len();
        if !show_all && hidden > 0 {
            println!();
            println!(
                "{}",
                color::muted(&format!(
                    "{} hidden. Use --all to list them.",
                    helpers::plural(hidden, "repository", "repositories")
                ))
            );
        }
    }

    info!(
        event = "cli.repos_completed",
        total = all.len(),
        visible = visible.len(),
    );
    Ok(())
}

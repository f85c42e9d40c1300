use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use locwatch_config::{LocwatchConfig, MAX_POLL_INTERVAL_MS, MIN_POLL_INTERVAL_MS};
use locwatch_core::{
    DetailFetcher, DirectorySource, EffectRunner, NotifierRegistry, Poller, StaticView, wait_for_shutdown_signal,
};

use super::helpers;
use crate::color;

/// `--interval` wins over `[poll] interval_ms`; either must be in range.
fn resolve_interval(flag: Option<u64>, config: &LocwatchConfig) -> Result<Duration, String> {
    let ms = flag.unwrap_or_else(|| config.poll.interval_ms());
    if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&ms) {
        return Err(format!(
            "Polling interval {}ms is out of range ({}..={}ms)",
            ms, MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS
        ));
    }
    Ok(Duration::from_millis(ms))
}

pub(crate) fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let config = helpers::load_config_with_warning();
    let source_dir = helpers::resolve_source_dir(matches, &config)?;
    let once = matches.get_flag("once");
    let desktop = matches.get_flag("notify") || config.notify.desktop;

    let interval = match resolve_interval(matches.get_one::<u64>("interval").copied(), &config) {
        Ok(interval) => interval,
        Err(msg) => {
            eprintln!("{}", color::error(&msg));
            error!(event = "cli.watch_failed", error = %msg);
            return Err(msg.into());
        }
    };

    info!(
        event = "cli.watch_started",
        source = %source_dir.display(),
        interval_ms = interval.as_millis() as u64,
        once = once,
        desktop = desktop,
    );

    let store = helpers::open_store(&config)?;
    let source = Arc::new(DirectorySource::new(source_dir.clone()));
    let view = Arc::new(StaticView(false));
    let runner = EffectRunner::new(
        store,
        Arc::clone(&source) as Arc<dyn DetailFetcher>,
        NotifierRegistry::standard(true, desktop),
        view.clone(),
    );
    let mut poller = Poller::new(source, runner, view, interval);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        if once {
            let report = poller.tick().await;
            poller.settle().await;
            println!("{}", color::indicator(poller.status().indicator.as_ref()));
            info!(
                event = "cli.watch_completed",
                poll_succeeded = report.poll_succeeded,
                effects = report.effects,
            );
            if !report.poll_succeeded {
                eprintln!(
                    "{}",
                    color::error(&format!(
                        "Could not poll status from {}",
                        source_dir.display()
                    ))
                );
                return Err::<(), Box<dyn std::error::Error>>("Poll failed".into());
            }
            return Ok(());
        }

        println!(
            "Watching {} every {}ms. Press Ctrl-C to stop.",
            color::accent(&source_dir.display().to_string()),
            interval.as_millis()
        );

        // Print the indicator only when it changes
        let mut status_rx = poller.subscribe();
        tokio::spawn(async move {
            let mut last = None;
            let mut first = true;
            while status_rx.changed().await.is_ok() {
                let indicator = status_rx.borrow_and_update().indicator.clone();
                if first || indicator != last {
                    println!("{}", color::indicator(indicator.as_ref()));
                    first = false;
                    last = indicator;
                }
            }
        });

        let shutdown = CancellationToken::new();
        tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));
        poller.run(shutdown).await;

        info!(event = "cli.watch_completed");
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_interval_prefers_flag() {
        let mut config = LocwatchConfig::default();
        config.poll.interval_ms = Some(1000);
        assert_eq!(
            resolve_interval(Some(250), &config).unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(
            resolve_interval(None, &config).unwrap(),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_resolve_interval_default() {
        assert_eq!(
            resolve_interval(None, &LocwatchConfig::default()).unwrap(),
            Duration::from_millis(5000)
        );
    }

    #[test]
    fn test_resolve_interval_out_of_range() {
        let config = LocwatchConfig::default();
        assert!(resolve_interval(Some(0), &config).is_err());
        assert!(resolve_interval(Some(MAX_POLL_INTERVAL_MS + 1), &config).is_err());
    }
}

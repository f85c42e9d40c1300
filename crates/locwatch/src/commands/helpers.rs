use std::path::PathBuf;
use std::sync::Arc;

use clap::ArgMatches;
use tracing::{error, warn};

use locwatch_cache::{FileStore, KvStore};
use locwatch_config::LocwatchConfig;
use locwatch_core::{
    DirectorySource, EffectRunner, NotifierRegistry, Snapshot, StaticView, StatusSource,
    WorkspaceLoadReport,
};
use locwatch_paths::LocwatchPaths;

use crate::color;

/// Load configuration with warning on errors.
///
/// Falls back to defaults when loading or validation fails, telling the user
/// on stderr and emitting `cli.config.load_failed`.
pub fn load_config_with_warning() -> LocwatchConfig {
    let loaded = LocwatchConfig::load_hierarchy().and_then(|config| {
        config.validate()?;
        Ok(config)
    });
    match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "{}",
                color::error(&format!("Warning: Could not load config: {}. Using defaults.", e))
            );
            eprintln!(
                "{}",
                color::hint(
                    "Tip: Check ~/.locwatch/config.toml and ./.locwatch/config.toml for errors."
                )
            );
            warn!(
                event = "cli.config.load_failed",
                error = %e,
                "Config load failed, using defaults"
            );
            LocwatchConfig::default()
        }
    }
}

/// `--source` wins over `[source] dir`.
pub fn resolve_source_dir(
    matches: &ArgMatches,
    config: &LocwatchConfig,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(dir) = matches.get_one::<PathBuf>("source") {
        return Ok(dir.clone());
    }
    match &config.source.dir {
        Some(dir) => Ok(dir.clone()),
        None => {
            eprintln!("{}", color::error("No status source configured."));
            eprintln!(
                "{}",
                color::hint("  Pass --source DIR or set [source] dir in ~/.locwatch/config.toml.")
            );
            error!(event = "cli.source_missing");
            Err("No status source configured".into())
        }
    }
}

/// File-backed store under `[cache] dir`, or `~/.locwatch/store`.
pub fn open_store(config: &LocwatchConfig) -> Result<Arc<dyn KvStore>, Box<dyn std::error::Error>> {
    let store = match &config.cache.dir {
        Some(dir) => FileStore::new(dir.clone()),
        None => {
            let paths = LocwatchPaths::resolve().inspect_err(|e| {
                eprintln!("{}", color::error(&e.to_string()));
            })?;
            FileStore::from_paths(&paths)
        }
    };
    Ok(Arc::new(store))
}

/// Runner with no visible notifications, for one-shot commands.
pub fn quiet_runner(
    store: Arc<dyn KvStore>,
    source: Arc<DirectorySource>,
) -> EffectRunner {
    EffectRunner::new(
        store,
        source,
        NotifierRegistry::standard(false, false),
        Arc::new(StaticView(false)),
    )
}

/// Poll once and load every location into the runner's workspace.
pub async fn poll_and_load(
    source: &DirectorySource,
    runner: &EffectRunner,
) -> Result<(Snapshot, WorkspaceLoadReport), Box<dyn std::error::Error>> {
    let snapshot = source.poll_status().await.inspect_err(|e| {
        eprintln!("{}", color::error(&format!("Could not poll status: {}", e)));
    })?;
    let report = runner.load_workspace(&snapshot).await;
    Ok((snapshot, report))
}

pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", count, plural)
    }
}

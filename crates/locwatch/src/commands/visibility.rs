use std::str::FromStr;

use clap::ArgMatches;
use tracing::{error, info};

use locwatch_core::{RepoAddress, VisibilityStore};

use super::helpers;
use crate::color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VisibilityOp {
    Hide,
    Show,
    Toggle,
}

impl VisibilityOp {
    fn as_str(self) -> &'static str {
        match self {
            VisibilityOp::Hide => "hide",
            VisibilityOp::Show => "show",
            VisibilityOp::Toggle => "toggle",
        }
    }
}

fn parse_addresses(raw: &[String]) -> Result<Vec<RepoAddress>, Box<dyn std::error::Error>> {
    raw.iter()
        .map(|s| RepoAddress::from_str(s).map_err(|e| Box::new(e) as Box<dyn std::error::Error>))
        .collect()
}

pub(crate) fn handle_visibility_command(
    matches: &ArgMatches,
    op: VisibilityOp,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw: Vec<String> = matches
        .get_many::<String>("repos")
        .ok_or("At least one <repo>@<location> is required")?
        .cloned()
        .collect();

    let addresses = match parse_addresses(&raw) {
        Ok(addresses) => addresses,
        Err(e) => {
            eprintln!("{}", color::error(&e.to_string()));
            error!(event = "cli.visibility_failed", op = op.as_str(), error = %e);
            return Err(e);
        }
    };
    let keys: Vec<String> = addresses.iter().map(RepoAddress::key).collect();

    info!(event = "cli.visibility_started", op = op.as_str(), keys = keys.len());

    let config = helpers::load_config_with_warning();
    let store = helpers::open_store(&config)?;
    let visibility = VisibilityStore::new(store, config.visibility.base_path());

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async {
        match op {
            VisibilityOp::Hide => visibility.set_hidden(&keys).await,
            VisibilityOp::Show => visibility.set_visible(&keys).await,
            VisibilityOp::Toggle => visibility.toggle_visible(&keys).await,
        }
    });

    match result {
        Ok(hidden) => {
            for address in &addresses {
                let state = if hidden.contains(&address.key()) {
                    color::muted("hidden")
                } else {
                    color::success("visible")
                };
                println!("{} {}", color::accent(&address.to_string()), state);
            }
            info!(
                event = "cli.visibility_completed",
                op = op.as_str(),
                hidden = hidden.len(),
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", color::error(&format!("Could not update visibility: {}", e)));
            error!(event = "cli.visibility_failed", op = op.as_str(), error = %e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addresses() {
        let parsed = parse_addresses(&["a@etl".to_string(), "b@ml".to_string()]).unwrap();
        assert_eq!(parsed[0].key(), "a:etl");
        assert_eq!(parsed[1].key(), "b:ml");
    }

    #[test]
    fn test_parse_addresses_rejects_missing_location() {
        assert!(parse_addresses(&["a@etl".to_string(), "lonely".to_string()]).is_err());
    }
}

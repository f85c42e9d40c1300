use clap::ArgMatches;
use tracing::{debug, error};

mod helpers;
mod repos;
mod status;
mod visibility;
mod watch;

use visibility::VisibilityOp;

pub fn run_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    debug!(event = "cli.command_started", command = matches.subcommand_name());

    match matches.subcommand() {
        Some(("watch", sub_matches)) => watch::handle_watch_command(sub_matches),
        Some(("status", sub_matches)) => status::handle_status_command(sub_matches),
        Some(("repos", sub_matches)) => repos::handle_repos_command(sub_matches),
        Some(("hide", sub_matches)) => {
            visibility::handle_visibility_command(sub_matches, VisibilityOp::Hide)
        }
        Some(("show", sub_matches)) => {
            visibility::handle_visibility_command(sub_matches, VisibilityOp::Show)
        }
        Some(("toggle", sub_matches)) => {
            visibility::handle_visibility_command(sub_matches, VisibilityOp::Toggle)
        }
        _ => {
            error!(event = "cli.command_unknown");
            Err("Unknown command".into())
        }
    }
}

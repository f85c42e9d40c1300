use clap::{Arg, ArgAction, Command};

use super::global::{json_arg, source_arg};

pub fn watch_command() -> Command {
    Command::new("watch")
        .about("Poll the status source and report code location changes")
        .arg(source_arg())
        .arg(
            Arg::new("interval")
                .long("interval")
                .short('i')
                .value_name("MS")
                .help("Polling interval in milliseconds (overrides [poll] interval_ms)")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single poll, wait for its reloads, and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("notify")
                .long("notify")
                .help("Also send desktop notifications")
                .action(ArgAction::SetTrue),
        )
}

pub fn status_command() -> Command {
    Command::new("status")
        .about("Poll once, load every code location, and print their status")
        .arg(source_arg())
        .arg(json_arg())
}

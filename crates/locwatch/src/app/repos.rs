use clap::{Arg, ArgAction, Command};

use super::global::{json_arg, source_arg};

pub fn repos_command() -> Command {
    Command::new("repos")
        .about("List repositories served by the loaded code locations")
        .arg(source_arg())
        .arg(
            Arg::new("all")
                .long("all")
                .short('a')
                .help("Include hidden repositories")
                .action(ArgAction::SetTrue),
        )
        .arg(json_arg())
}

fn addresses_arg() -> Arg {
    Arg::new("repos")
        .help("Repositories as <repo>@<location>")
        .required(true)
        .num_args(1..)
        .index(1)
}

pub fn hide_command() -> Command {
    Command::new("hide")
        .about("Hide repositories from listings")
        .arg(addresses_arg())
}

pub fn show_command() -> Command {
    Command::new("show")
        .about("Make hidden repositories visible again")
        .arg(addresses_arg())
}

pub fn toggle_command() -> Command {
    Command::new("toggle")
        .about("Flip visibility of each repository")
        .arg(addresses_arg())
}

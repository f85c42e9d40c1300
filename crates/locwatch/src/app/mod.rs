mod global;
mod repos;
mod watch;


use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(watch::watch_command())
        .subcommand(watch::status_command())
        .subcommand(repos::repos_command())
        .subcommand(repos::hide_command())
        .subcommand(repos::show_command())
        .subcommand(repos::toggle_command())
}

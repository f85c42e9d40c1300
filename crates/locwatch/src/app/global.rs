use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("locwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watch code locations reload and manage which repositories are visible")
        .long_about("locwatch polls a code-location status source, reports locations that are added, updated, or finish loading, and keeps a persisted set of hidden repositories.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}

/// `--source DIR`, shared by every command that polls.
pub fn source_arg() -> Arg {
    Arg::new("source")
        .long("source")
        .short('s')
        .value_name("DIR")
        .help("Status source directory (overrides [source] dir in config)")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

pub fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .help("Output in JSON format")
        .action(ArgAction::SetTrue)
}

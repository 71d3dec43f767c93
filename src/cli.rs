use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("datadog-api")
        .about("Datadog API client (credential check and raw GET requests)")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .num_args(1)
                .global(true)
                .value_parser(clap::value_parser!(u64))
                .help("Overall deadline for the request in seconds, retries included"),
        )
        .subcommand(
            Command::new("validate").about("Check that the API and application keys are valid"),
        )
        .subcommand(
            Command::new("get")
                .about("GET an API path (e.g. /v1/monitor) and print the JSON response")
                .arg(Arg::new("path").required(true).help("Path below /api, starting with /")),
        )
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    if let Some(lvl) = level {
        std::env::set_var("RUST_LOG", lvl);
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

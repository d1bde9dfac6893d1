use tagforge::cli::{build_cli, handle_task, handle_tasks};
use tagforge::{build, ProjectSettings, VERSION};

use clap::ArgMatches;
use std::env;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let settings = match ProjectSettings::from_cwd() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: failed to resolve project settings: {err}");
            std::process::exit(1);
        }
    };
    let descriptor = match build::standard_descriptor(settings) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    };

    let matches = build_cli(&descriptor).get_matches();
    init_logging_from_args(&matches);

    debug!("tagforge v{} starting", VERSION);

    let exit_code = match matches.subcommand() {
        Some(("tasks", sub)) => {
            let format = sub
                .get_one::<String>("format")
                .map(String::as_str)
                .unwrap_or("human");
            handle_tasks(&descriptor, format)
        }
        Some((name, _)) => handle_task(&descriptor, name),
        None => 1,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(matches: &ArgMatches) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if let Some(level_str) = matches.get_one::<String>("log-level") {
            parse_level(level_str)
        } else if matches.get_flag("verbose") {
            Level::DEBUG
        } else if matches.get_flag("quiet") {
            Level::ERROR
        } else {
            let level_str = env::var("TAGFORGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter.add_directive(format!("tagforge={}", level).parse().unwrap());
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

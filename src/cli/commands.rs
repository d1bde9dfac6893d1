//! CLI construction.
//!
//! The command tree is built dynamically from the descriptor: one subcommand
//! per registered task, plus the built-in `tasks` listing. The task graph
//! itself stays CLI-free; this module is a thin shell over
//! [`crate::build::run_task`].

use crate::descriptor::Descriptor;
use clap::{Arg, ArgAction, Command};

pub fn build_cli(descriptor: &Descriptor) -> Command {
    let mut cli = Command::new("tagforge")
        .about("Annotation-driven code generation and named-task build runner")
        .version(crate::VERSION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .value_name("LEVEL")
                .help("Set logging level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Increase verbosity"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .conflicts_with("verbose")
                .action(ArgAction::SetTrue)
                .help("Quiet mode - suppress non-error output"),
        )
        .subcommand(
            Command::new("tasks").about("List registered tasks").arg(
                Arg::new("format")
                    .short('f')
                    .long("format")
                    .value_parser(["human", "json"])
                    .default_value("human")
                    .help("Output format"),
            ),
        );

    for task in &descriptor.tasks {
        cli = cli.subcommand(Command::new(task.name.clone()).about(task.usage.clone()));
    }
    cli
}

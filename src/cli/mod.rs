pub mod commands;
pub mod handlers;

pub use commands::build_cli;
pub use handlers::{handle_task, handle_tasks};

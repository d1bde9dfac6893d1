//! Subcommand handlers mapping task outcomes to exit codes.

use crate::build;
use crate::descriptor::Descriptor;
use crate::task::TaskExec;
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct TaskInfo<'a> {
    name: &'a str,
    usage: &'a str,
    before: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    sequence: Option<&'a [String]>,
}

/// `tagforge tasks` — list registered tasks.
pub fn handle_tasks(descriptor: &Descriptor, format: &str) -> i32 {
    let infos: Vec<TaskInfo<'_>> = descriptor
        .tasks
        .iter()
        .map(|task| TaskInfo {
            name: &task.name,
            usage: &task.usage,
            before: &task.before,
            sequence: match &task.exec {
                TaskExec::Sequence(refs) => Some(refs.as_slice()),
                TaskExec::Run(_) => None,
            },
        })
        .collect();

    match format {
        "json" => match serde_json::to_string_pretty(&infos) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(err) => {
                error!(error = %err, "Failed to serialize task list");
                1
            }
        },
        _ => {
            let width = infos.iter().map(|i| i.name.len()).max().unwrap_or(0);
            for info in &infos {
                println!("{:width$}  {}", info.name, info.usage, width = width);
            }
            0
        }
    }
}

/// `tagforge <task>` — resolve and run one task chain.
pub fn handle_task(descriptor: &Descriptor, name: &str) -> i32 {
    match build::run_task(descriptor, name) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::standard_descriptor;
    use crate::descriptor::ProjectSettings;

    #[test]
    fn test_handle_tasks_human() {
        let descriptor = standard_descriptor(ProjectSettings::new("p", "1")).unwrap();
        assert_eq!(handle_tasks(&descriptor, "human"), 0);
    }

    #[test]
    fn test_handle_tasks_json() {
        let descriptor = standard_descriptor(ProjectSettings::new("p", "1")).unwrap();
        assert_eq!(handle_tasks(&descriptor, "json"), 0);
    }

    #[test]
    fn test_handle_unknown_task_fails() {
        let descriptor = standard_descriptor(ProjectSettings::new("p", "1")).unwrap();
        assert_eq!(handle_task(&descriptor, "no-such-task"), 1);
    }
}

//! Build orchestration.
//!
//! Composes scanning and dispatch into one `annotate` task inside the same
//! graph as the test/build/run/mock/release tasks, all driven by a single
//! process-wide [`Descriptor`].

pub mod tasks;

pub use tasks::{AnnotateTask, LoadEnvTask, ProcessTask, ReleaseTask};

use crate::annotate::AnnotatorRegistry;
use crate::descriptor::{BuildContext, Descriptor, ProjectSettings};
use crate::generate::EnvconfigAnnotator;
use crate::task::{Executor, Task, TaskGraph};
use anyhow::{Context, Result};

/// The standard task set: `annotate` feeds generated sources into `test`
/// and `build`, `build` feeds `run` and `release`, and `setup` composes a
/// full bootstrap.
pub fn standard_descriptor(settings: ProjectSettings) -> Result<Descriptor> {
    let registry = AnnotatorRegistry::new()
        .register(Box::new(EnvconfigAnnotator::new()))
        .context("failed to register annotators")?;

    let run_binary = format!("target/debug/{}", settings.project_name);

    Ok(Descriptor::new(settings)
        .task(
            Task::new(
                "annotate",
                "scan source annotations and generate artifacts",
                AnnotateTask::new(registry),
            )
            .before(["test", "build"]),
        )
        .task(
            Task::new("test", "run the project tests", ProcessTask::new("cargo", ["test"]))
                .before(["release"]),
        )
        .task(
            Task::new(
                "build",
                "compile the project",
                ProcessTask::new("cargo", ["build"]),
            )
            .before(["run", "release"]),
        )
        .task(Task::new(
            "run",
            "run the compiled project binary",
            ProcessTask::new(run_binary, Vec::<String>::new()).export_env(),
        ))
        .task(Task::new(
            "mock",
            "build test doubles and test binaries",
            ProcessTask::new("cargo", ["build", "--tests"]),
        ))
        .task(Task::new(
            "release",
            "package the compiled binary into a release archive",
            ReleaseTask::default(),
        ))
        .task(Task::sequence(
            "setup",
            "bootstrap a fresh checkout",
            ["annotate", "test", "build"],
        )))
}

/// Resolve and run one named task against a fresh build context.
///
/// This is the headless entry point the CLI shell wraps: graph validation
/// happens before any task body executes, and the first failing task aborts
/// the rest of the chain.
pub fn run_task(descriptor: &Descriptor, name: &str) -> Result<()> {
    let graph = TaskGraph::new(&descriptor.tasks).context("invalid task graph")?;
    let mut ctx = BuildContext::new(descriptor.settings.clone());
    Executor::new(&graph).run(name, &mut ctx)?;
    Ok(())
}

/// Task names in declaration order, for the CLI surface.
pub fn list_tasks(descriptor: &Descriptor) -> Vec<(String, String)> {
    descriptor
        .tasks
        .iter()
        .map(|t| (t.name.clone(), t.usage.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_descriptor_graph_is_valid() {
        let descriptor = standard_descriptor(ProjectSettings::new("some-project", "0.1.0")).unwrap();
        let graph = TaskGraph::new(&descriptor.tasks).unwrap();

        assert_eq!(
            graph.task_names(),
            vec!["annotate", "test", "build", "run", "mock", "release", "setup"]
        );
        assert_eq!(graph.prerequisites("build"), vec!["annotate"]);
        assert_eq!(graph.prerequisites("run"), vec!["build"]);
        assert_eq!(graph.prerequisites("release"), vec!["test", "build"]);
    }

    #[test]
    fn test_run_task_unknown_name() {
        let descriptor = standard_descriptor(ProjectSettings::new("p", "1")).unwrap();
        assert!(run_task(&descriptor, "no-such-task").is_err());
    }

    #[test]
    fn test_list_tasks() {
        let descriptor = standard_descriptor(ProjectSettings::new("p", "1")).unwrap();
        let names: Vec<String> = list_tasks(&descriptor).into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"annotate".to_string()));
        assert!(names.contains(&"setup".to_string()));
    }
}

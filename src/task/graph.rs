//! Task dependency graph.
//!
//! Validates the whole descriptor before anything executes: every
//! `before`/sequence reference must name a registered task, names must be
//! unique, and the combined dependency relation must be acyclic. Dependency
//! resolution is deterministic — prerequisites are returned in descriptor
//! declaration order, never set order.

use super::task::{Task, TaskExec};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate task name '{0}'")]
    DuplicateTask(String),

    #[error("task '{task}' references unknown task '{reference}'")]
    UnknownTask { task: String, reference: String },

    #[error("task dependency cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// Validated view over a descriptor's task list.
pub struct TaskGraph<'a> {
    tasks: &'a [Task],
    index: HashMap<&'a str, usize>,
}

impl<'a> TaskGraph<'a> {
    pub fn new(tasks: &'a [Task]) -> Result<Self, GraphError> {
        let mut index = HashMap::new();
        for (i, task) in tasks.iter().enumerate() {
            if index.insert(task.name.as_str(), i).is_some() {
                return Err(GraphError::DuplicateTask(task.name.clone()));
            }
        }

        let graph = Self { tasks, index };
        graph.check_references()?;
        graph.check_cycles()?;
        Ok(graph)
    }

    pub fn tasks(&self) -> &'a [Task] {
        self.tasks
    }

    pub fn task(&self, name: &str) -> Option<&'a Task> {
        self.index.get(name).map(|&i| &self.tasks[i])
    }

    pub fn task_names(&self) -> Vec<&'a str> {
        self.tasks.iter().map(|t| t.name.as_str()).collect()
    }

    /// Tasks that must complete before `name` runs: every task listing
    /// `name` in its `before`, in declaration order.
    pub fn prerequisites(&self, name: &str) -> Vec<&'a str> {
        self.tasks
            .iter()
            .filter(|t| t.before.iter().any(|b| b == name))
            .map(|t| t.name.as_str())
            .collect()
    }

    fn check_references(&self) -> Result<(), GraphError> {
        for task in self.tasks {
            let refs: Vec<&String> = match &task.exec {
                TaskExec::Sequence(seq) => task.before.iter().chain(seq.iter()).collect(),
                TaskExec::Run(_) => task.before.iter().collect(),
            };
            for reference in refs {
                if !self.index.contains_key(reference.as_str()) {
                    return Err(GraphError::UnknownTask {
                        task: task.name.clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Everything that must run before or within `name`: its prerequisites
    /// plus, for composites, the sequence members.
    fn dependencies(&self, name: &str) -> Vec<&'a str> {
        let mut deps = self.prerequisites(name);
        if let Some(task) = self.task(name) {
            if let TaskExec::Sequence(seq) = &task.exec {
                deps.extend(seq.iter().map(String::as_str));
            }
        }
        deps
    }

    fn check_cycles(&self) -> Result<(), GraphError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.tasks.len()];
        let mut path: Vec<&str> = Vec::new();

        fn visit<'a>(
            graph: &TaskGraph<'a>,
            node: usize,
            marks: &mut [Mark],
            path: &mut Vec<&'a str>,
        ) -> Result<(), GraphError> {
            let name = graph.tasks[node].name.as_str();
            match marks[node] {
                Mark::Done => return Ok(()),
                Mark::InProgress => {
                    let start = path.iter().position(|&n| n == name).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|s| s.to_string()).collect();
                    cycle.push(name.to_string());
                    return Err(GraphError::Cycle { path: cycle });
                }
                Mark::Unvisited => {}
            }

            marks[node] = Mark::InProgress;
            path.push(name);
            for dep in graph.dependencies(name) {
                let dep_idx = graph.index[dep];
                visit(graph, dep_idx, marks, path)?;
            }
            path.pop();
            marks[node] = Mark::Done;
            Ok(())
        }

        for i in 0..self.tasks.len() {
            visit(self, i, &mut marks, &mut path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::BuildContext;
    use crate::task::task::FnTask;

    fn noop(name: &str) -> Task {
        Task::new(name, "", FnTask(|_: &mut BuildContext| Ok(())))
    }

    #[test]
    fn test_valid_graph() {
        let tasks = vec![
            noop("annotate").before(["build"]),
            noop("build").before(["run"]),
            noop("run"),
        ];
        let graph = TaskGraph::new(&tasks).unwrap();
        assert_eq!(graph.task_names(), vec!["annotate", "build", "run"]);
        assert_eq!(graph.prerequisites("build"), vec!["annotate"]);
        assert_eq!(graph.prerequisites("run"), vec!["build"]);
        assert!(graph.prerequisites("annotate").is_empty());
    }

    #[test]
    fn test_prerequisites_follow_declaration_order() {
        let tasks = vec![noop("b").before(["c"]), noop("a").before(["c"]), noop("c")];
        let graph = TaskGraph::new(&tasks).unwrap();
        assert_eq!(graph.prerequisites("c"), vec!["b", "a"]);
    }

    #[test]
    fn test_duplicate_name() {
        let tasks = vec![noop("build"), noop("build")];
        assert!(matches!(
            TaskGraph::new(&tasks),
            Err(GraphError::DuplicateTask(name)) if name == "build"
        ));
    }

    #[test]
    fn test_unknown_before_reference() {
        let tasks = vec![noop("build").before(["missing"])];
        match TaskGraph::new(&tasks) {
            Err(GraphError::UnknownTask { task, reference }) => {
                assert_eq!(task, "build");
                assert_eq!(reference, "missing");
            }
            other => panic!("expected unknown task, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_unknown_sequence_reference() {
        let tasks = vec![Task::sequence("setup", "", ["missing"])];
        assert!(matches!(
            TaskGraph::new(&tasks),
            Err(GraphError::UnknownTask { .. })
        ));
    }

    #[test]
    fn test_two_task_cycle_reported_with_path() {
        let tasks = vec![noop("x").before(["y"]), noop("y").before(["x"])];
        match TaskGraph::new(&tasks) {
            Err(GraphError::Cycle { path }) => {
                assert_eq!(path, vec!["x", "y", "x"]);
            }
            other => panic!("expected cycle, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_self_cycle() {
        let tasks = vec![noop("x").before(["x"])];
        match TaskGraph::new(&tasks) {
            Err(GraphError::Cycle { path }) => assert_eq!(path, vec!["x", "x"]),
            other => panic!("expected cycle, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_sequence_cycle() {
        let tasks = vec![
            Task::sequence("setup", "", ["teardown"]),
            Task::sequence("teardown", "", ["setup"]),
        ];
        assert!(matches!(
            TaskGraph::new(&tasks),
            Err(GraphError::Cycle { .. })
        ));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let tasks = vec![
            noop("annotate").before(["test", "build"]),
            noop("test").before(["release"]),
            noop("build").before(["release"]),
            noop("release"),
        ];
        assert!(TaskGraph::new(&tasks).is_ok());
    }
}

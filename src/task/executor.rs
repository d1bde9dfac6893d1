//! Memoizing task executor.
//!
//! Runs tasks strictly sequentially in dependency order. Each task runs at
//! most once per invocation regardless of how many `before`/sequence lists
//! reference it; the first failure aborts the rest of the graph and is
//! wrapped with the failing task's name.

use super::graph::TaskGraph;
use super::task::TaskExec;
use crate::descriptor::BuildContext;
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unknown task '{0}'")]
    UnknownTask(String),

    #[error("task '{task}' failed: {source}")]
    Failed {
        task: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

pub struct Executor<'a> {
    graph: &'a TaskGraph<'a>,
    status: HashMap<&'a str, TaskStatus>,
}

impl<'a> Executor<'a> {
    pub fn new(graph: &'a TaskGraph<'a>) -> Self {
        let status = graph
            .task_names()
            .into_iter()
            .map(|name| (name, TaskStatus::Pending))
            .collect();
        Self { graph, status }
    }

    pub fn status(&self, name: &str) -> Option<TaskStatus> {
        self.status.get(name).copied()
    }

    /// Run `name` and everything that must complete before it.
    pub fn run(&mut self, name: &str, ctx: &mut BuildContext) -> Result<(), ExecError> {
        let task = self
            .graph
            .task(name)
            .ok_or_else(|| ExecError::UnknownTask(name.to_string()))?;
        self.execute(task.name.as_str(), ctx)
    }

    fn execute(&mut self, name: &'a str, ctx: &mut BuildContext) -> Result<(), ExecError> {
        match self.status[name] {
            TaskStatus::Done => {
                debug!(task = %name, "Task already completed, skipping");
                return Ok(());
            }
            // Cycles are rejected when the graph is built, so a task can
            // never observe itself running.
            TaskStatus::Running | TaskStatus::Failed => {
                return Err(ExecError::Failed {
                    task: name.to_string(),
                    source: anyhow::anyhow!("task re-entered in state {:?}", self.status[name]),
                });
            }
            TaskStatus::Pending => {}
        }

        for prereq in self.graph.prerequisites(name) {
            self.execute(prereq, ctx)?;
        }

        self.status.insert(name, TaskStatus::Running);
        info!(task = %name, "Task started");
        let start = Instant::now();

        // The graph outlives this executor, so the task reference does not
        // pin `self`.
        let task = self
            .graph
            .task(name)
            .ok_or_else(|| ExecError::UnknownTask(name.to_string()))?;

        let result = match &task.exec {
            TaskExec::Run(runner) => runner.run(ctx).map_err(|source| ExecError::Failed {
                task: name.to_string(),
                source,
            }),
            TaskExec::Sequence(refs) => {
                let mut result = Ok(());
                for reference in refs {
                    if let Err(err) = self.execute(reference, ctx) {
                        result = Err(err);
                        break;
                    }
                }
                result
            }
        };

        match result {
            Ok(()) => {
                self.status.insert(name, TaskStatus::Done);
                info!(
                    task = %name,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Task complete"
                );
                Ok(())
            }
            Err(err) => {
                self.status.insert(name, TaskStatus::Failed);
                Err(err)
            }
        }
    }
}

//! Named build tasks.

use crate::descriptor::BuildContext;
use std::fmt;

/// A unit of build work with its own logic.
pub trait TaskRunner {
    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()>;
}

/// What a task does when it executes.
pub enum TaskExec {
    /// Run the task's own logic.
    Run(Box<dyn TaskRunner>),
    /// Invoke other tasks by name, in order (a composite task).
    Sequence(Vec<String>),
}

impl fmt::Debug for TaskExec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskExec::Run(_) => f.write_str("Run(..)"),
            TaskExec::Sequence(refs) => f.debug_tuple("Sequence").field(refs).finish(),
        }
    }
}

/// A registered task.
///
/// `before` lists the tasks this one must complete ahead of: `build` with
/// `before: ["run"]` makes `build` an implicit prerequisite of `run`.
#[derive(Debug)]
pub struct Task {
    pub name: String,
    pub usage: String,
    pub before: Vec<String>,
    pub exec: TaskExec,
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        usage: impl Into<String>,
        runner: impl TaskRunner + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            before: Vec::new(),
            exec: TaskExec::Run(Box::new(runner)),
        }
    }

    /// A composite task with no logic of its own.
    pub fn sequence<I, S>(name: impl Into<String>, usage: impl Into<String>, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            usage: usage.into(),
            before: Vec::new(),
            exec: TaskExec::Sequence(refs.into_iter().map(Into::into).collect()),
        }
    }

    pub fn before<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before = names.into_iter().map(Into::into).collect();
        self
    }
}

/// Runner wrapping a plain closure, mostly useful for wiring and tests.
pub struct FnTask<F>(pub F);

impl<F> TaskRunner for FnTask<F>
where
    F: Fn(&mut BuildContext) -> anyhow::Result<()>,
{
    fn run(&self, ctx: &mut BuildContext) -> anyhow::Result<()> {
        (self.0)(ctx)
    }
}

pub mod executor;
pub mod graph;
pub mod task;

pub use executor::{ExecError, Executor, TaskStatus};
pub use graph::{GraphError, TaskGraph};
pub use task::{FnTask, Task, TaskExec, TaskRunner};

//! tagforge - annotation-driven code generation and task running
//!
//! This library provides the build-tool substrate behind annotation-driven
//! service projects: a declaration scanner that extracts struct declarations
//! carrying marker tags, a pluggable generator framework that turns those
//! tags into generated source files and companion artifacts (environment
//! files, usage documentation), and a named-task dependency graph that
//! sequences scanning, generation, testing, compiling and releasing into one
//! reproducible build.
//!
//! # Core Concepts
//!
//! - **Summary**: every annotation discovered in one scan, each attached to
//!   its parsed declaration
//! - **Annotator**: a generator registered under a unique tag name, invoked
//!   with the matching slice of the summary
//! - **Task Graph**: named tasks with `before` edges and composite
//!   sequences, executed memoized, sequentially and fail-fast
//!
//! # Example Usage
//!
//! ```ignore
//! use tagforge::{build, ProjectSettings};
//!
//! fn main() -> anyhow::Result<()> {
//!     let settings = ProjectSettings::new("my-service", "0.9.17");
//!     let descriptor = build::standard_descriptor(settings)?;
//!     build::run_task(&descriptor, "build")
//! }
//! ```

pub mod annotate;
pub mod build;
pub mod cli;
pub mod descriptor;
pub mod generate;
pub mod scan;
pub mod task;

pub use annotate::{AnnotateContext, Annotator, AnnotatorRegistry, DispatchError};
pub use descriptor::{BuildContext, Descriptor, ProjectSettings};
pub use generate::{ConfigContext, EnvconfigAnnotator, GenerateError};
pub use scan::{Annot, Decl, Field, ScanError, Scanner, Summary};
pub use task::{ExecError, Executor, FnTask, GraphError, Task, TaskGraph, TaskRunner, TaskStatus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_tagforge() {
        assert_eq!(NAME, "tagforge");
    }
}

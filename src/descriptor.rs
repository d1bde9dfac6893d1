//! Process-wide build descriptor.
//!
//! A [`Descriptor`] is constructed once at startup and never mutated: it
//! names the project, points at the environment file and generated-source
//! destination, and carries the ordered task list the executor resolves
//! against.

use crate::generate::ConfigContext;
use crate::task::Task;
use std::env;
use std::path::PathBuf;

/// Project-level settings shared by the scanner, the generators and the
/// standard tasks.
#[derive(Debug, Clone)]
pub struct ProjectSettings {
    pub project_name: String,
    pub project_version: String,
    /// Persistent `KEY=VALUE` environment file, merged (never overwritten).
    pub env_file: PathBuf,
    /// Destination directory for generated source files.
    pub dest_dir: PathBuf,
    /// Generated usage document, overwritten wholesale on every run.
    pub usage_doc: PathBuf,
    /// Source roots handed to the declaration scanner.
    pub layouts: Vec<PathBuf>,
}

impl ProjectSettings {
    pub fn new(project_name: impl Into<String>, project_version: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_version: project_version.into(),
            env_file: PathBuf::from(".env"),
            dest_dir: PathBuf::from("src/generated"),
            usage_doc: PathBuf::from("USAGE.md"),
            layouts: vec![PathBuf::from("src")],
        }
    }

    /// Settings for the project in the current working directory, named
    /// after the directory itself.
    pub fn from_cwd() -> std::io::Result<Self> {
        let cwd = env::current_dir()?;
        let name = cwd
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("project")
            .to_string();
        Ok(Self::new(name, "0.1.0"))
    }

    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = path.into();
        self
    }

    pub fn with_dest_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dest_dir = path.into();
        self
    }

    pub fn with_usage_doc(mut self, path: impl Into<PathBuf>) -> Self {
        self.usage_doc = path.into();
        self
    }

    pub fn with_layouts<I, P>(mut self, layouts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.layouts = layouts.into_iter().map(Into::into).collect();
        self
    }
}

/// The static descriptor driving one build process.
pub struct Descriptor {
    pub settings: ProjectSettings,
    pub tasks: Vec<Task>,
}

impl Descriptor {
    pub fn new(settings: ProjectSettings) -> Self {
        Self {
            settings,
            tasks: Vec::new(),
        }
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }
}

/// Mutable state threaded through task execution.
///
/// Resolved configuration values live here rather than in the process
/// environment; tasks that spawn child processes export them explicitly.
pub struct BuildContext {
    pub settings: ProjectSettings,
    pub config: ConfigContext,
}

impl BuildContext {
    pub fn new(settings: ProjectSettings) -> Self {
        Self {
            settings,
            config: ConfigContext::new(),
        }
    }
}

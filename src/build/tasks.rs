//! Standard task runners.

use crate::annotate::AnnotatorRegistry;
use crate::descriptor::BuildContext;
use crate::generate::dotenv;
use crate::scan::Scanner;
use crate::task::TaskRunner;
use anyhow::{bail, Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Scan the project layouts and dispatch the summary to the registered
/// annotators. This is the `annotate` task body.
pub struct AnnotateTask {
    registry: AnnotatorRegistry,
}

impl AnnotateTask {
    pub fn new(registry: AnnotatorRegistry) -> Self {
        Self { registry }
    }
}

impl TaskRunner for AnnotateTask {
    fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        let summary = Scanner::new(ctx.settings.layouts.clone())
            .scan()
            .context("declaration scan failed")?;
        debug!(annotations = summary.len(), "Dispatching summary");
        self.registry
            .dispatch(&summary, &ctx.settings, &mut ctx.config)
            .context("annotator dispatch failed")?;
        Ok(())
    }
}

/// Run an external command, failing the task on a non-zero exit status.
pub struct ProcessTask {
    program: String,
    args: Vec<String>,
    export_env: bool,
}

impl ProcessTask {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            export_env: false,
        }
    }

    /// Export the resolved configuration into the child environment.
    pub fn export_env(mut self) -> Self {
        self.export_env = true;
        self
    }
}

impl TaskRunner for ProcessTask {
    fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if self.export_env {
            ctx.config.apply_to(&mut command);
        }

        info!(command = %format!("{} {}", self.program, self.args.join(" ")), "Running");
        let status = command
            .status()
            .with_context(|| format!("failed to spawn '{}'", self.program))?;
        if !status.success() {
            bail!(
                "command '{} {}' exited with {}",
                self.program,
                self.args.join(" "),
                status
            );
        }
        Ok(())
    }
}

/// Load the environment file into the config context without regenerating
/// anything. Lets tasks run with resolved configuration when `annotate` is
/// not part of the requested chain.
pub struct LoadEnvTask;

impl TaskRunner for LoadEnvTask {
    fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        let path = ctx.settings.env_file.clone();
        let keys = dotenv::load(&path, &mut ctx.config)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        if !keys.is_empty() {
            info!("Load environment from '{}': {}", path.display(), keys.join(" "));
        }
        Ok(())
    }
}

/// Package the compiled project binary into a release tarball.
pub struct ReleaseTask {
    out_dir: PathBuf,
}

impl ReleaseTask {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

impl Default for ReleaseTask {
    fn default() -> Self {
        Self::new("releases")
    }
}

impl TaskRunner for ReleaseTask {
    fn run(&self, ctx: &mut BuildContext) -> Result<()> {
        let name = &ctx.settings.project_name;
        let binary = PathBuf::from("target/debug").join(name);
        if !binary.is_file() {
            bail!(
                "compiled binary not found at '{}' (did the build task run?)",
                binary.display()
            );
        }

        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create '{}'", self.out_dir.display()))?;
        let archive_path = self.out_dir.join(format!(
            "{}-{}.tar.gz",
            name, ctx.settings.project_version
        ));

        let file = File::create(&archive_path)
            .with_context(|| format!("failed to create '{}'", archive_path.display()))?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut archive = tar::Builder::new(encoder);
        archive
            .append_path_with_name(&binary, name)
            .with_context(|| format!("failed to archive '{}'", binary.display()))?;
        archive
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .context("failed to finalize release archive")?;

        info!("Release archive written to {}", archive_path.display());
        Ok(())
    }
}

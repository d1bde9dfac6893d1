//! Code and artifact generators.

pub mod dotenv;
pub mod envconfig;

pub use dotenv::ConfigContext;
pub use envconfig::{create_field, EnvconfigAnnotator, GeneratedField};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// One declaration the generator could not render.
#[derive(Debug)]
pub struct DeclFailure {
    pub decl: String,
    pub location: String,
    pub message: String,
}

impl fmt::Display for DeclFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.decl, self.location, self.message)
    }
}

/// Display wrapper joining several declaration failures.
#[derive(Debug)]
pub struct DeclFailures(pub Vec<DeclFailure>);

impl fmt::Display for DeclFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    /// Filesystem failures are fatal for the whole generator.
    #[error("filesystem error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rendering failed: {0}")]
    Render(String),

    /// Declarations that failed to render; siblings in the same run were
    /// still attempted.
    #[error("declaration rendering failed: {0}")]
    Declarations(DeclFailures),
}

impl GenerateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        GenerateError::Render(message.into())
    }
}

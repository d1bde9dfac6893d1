//! Annotator registry and dispatcher.
//!
//! Generators are registered once at startup under a unique tag name.
//! Dispatch order is registration order, not discovery order, so multi-
//! generator builds behave the same regardless of source layout. Every
//! registered generator is invoked on every dispatch, even with zero
//! matching annotations — that is how stale generated files get cleaned up.

use super::context::AnnotateContext;
use crate::descriptor::ProjectSettings;
use crate::generate::{ConfigContext, GenerateError};
use crate::scan::Summary;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("annotator for tag '{0}' is already registered")]
    DuplicateTag(String),

    #[error("no annotator registered for tag '{tag}' found at {location}")]
    UnknownTag { tag: String, location: String },

    #[error("annotators '{first}' and '{second}' both emit to {}", .target.display())]
    TargetConflict {
        first: String,
        second: String,
        target: PathBuf,
    },

    #[error("annotator '{tag}' failed: {source}")]
    Annotator {
        tag: String,
        #[source]
        source: GenerateError,
    },
}

/// A generator consuming matched annotations.
pub trait Annotator {
    /// Tag this generator consumes, e.g. `@envconfig`.
    fn tag_name(&self) -> &str;

    /// Destination file this generator owns, if it emits one. Used to detect
    /// two generators claiming the same path before any of them runs.
    fn target(&self, settings: &ProjectSettings) -> Option<PathBuf>;

    fn annotate(&self, ctx: &mut AnnotateContext<'_>) -> Result<(), GenerateError>;
}

#[derive(Default)]
pub struct AnnotatorRegistry {
    annotators: Vec<Box<dyn Annotator>>,
}

impl AnnotatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        mut self,
        annotator: Box<dyn Annotator>,
    ) -> Result<Self, DispatchError> {
        if self
            .annotators
            .iter()
            .any(|a| a.tag_name() == annotator.tag_name())
        {
            return Err(DispatchError::DuplicateTag(annotator.tag_name().to_string()));
        }
        self.annotators.push(annotator);
        Ok(self)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.annotators.iter().map(|a| a.tag_name()).collect()
    }

    /// Dispatch the summary to every registered annotator in registration
    /// order. The first failure halts the chain; files already written by
    /// earlier annotators are left in place.
    pub fn dispatch(
        &self,
        summary: &Summary,
        settings: &ProjectSettings,
        config: &mut ConfigContext,
    ) -> Result<(), DispatchError> {
        // A tag with no registered annotator is an error, never silently
        // dropped.
        for annot in summary.annots() {
            if !self.annotators.iter().any(|a| a.tag_name() == annot.tag_name) {
                return Err(DispatchError::UnknownTag {
                    tag: annot.tag_name.clone(),
                    location: summary.decl(annot.decl).location(),
                });
            }
        }

        // Two generators emitting to the same path is a conflict, detected
        // before any of them writes.
        let mut targets: HashMap<PathBuf, &str> = HashMap::new();
        for annotator in &self.annotators {
            if let Some(target) = annotator.target(settings) {
                if let Some(first) = targets.insert(target.clone(), annotator.tag_name()) {
                    return Err(DispatchError::TargetConflict {
                        first: first.to_string(),
                        second: annotator.tag_name().to_string(),
                        target,
                    });
                }
            }
        }

        for annotator in &self.annotators {
            let matched: Vec<_> = summary
                .annots()
                .iter()
                .filter(|a| a.tag_name == annotator.tag_name())
                .collect();
            debug!(
                tag = %annotator.tag_name(),
                matched = matched.len(),
                "Dispatching annotator"
            );

            let mut ctx = AnnotateContext::new(settings, summary, matched, config);
            annotator
                .annotate(&mut ctx)
                .map_err(|source| DispatchError::Annotator {
                    tag: annotator.tag_name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}

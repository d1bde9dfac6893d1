//! Context handed to an annotator during dispatch.

use crate::descriptor::ProjectSettings;
use crate::generate::ConfigContext;
use crate::scan::{Annot, Summary};

/// Everything a generator sees for one dispatch: the build-wide settings,
/// the full summary (for declaration lookups) and the slice of annotations
/// whose tag matched the generator.
pub struct AnnotateContext<'a> {
    pub settings: &'a ProjectSettings,
    pub summary: &'a Summary,
    pub annots: Vec<&'a Annot>,
    /// Resolved configuration, populated by config-producing generators and
    /// read by later tasks.
    pub config: &'a mut ConfigContext,
}

impl<'a> AnnotateContext<'a> {
    pub fn new(
        settings: &'a ProjectSettings,
        summary: &'a Summary,
        annots: Vec<&'a Annot>,
        config: &'a mut ConfigContext,
    ) -> Self {
        Self {
            settings,
            summary,
            annots,
            config,
        }
    }
}

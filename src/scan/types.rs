//! Declaration and annotation snapshots produced by a scan.
//!
//! A [`Summary`] is built fresh for every build invocation and is read-only
//! once scanning completes. Declarations are owned by the summary; an
//! [`Annot`] refers back to its declaration by index, so several annotations
//! on the same struct share one `Decl`.

use std::path::PathBuf;

/// Source file a declaration was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Module name derived from the path (`mod.rs` resolves to the parent
    /// directory name, anything else to the file stem).
    pub module: String,
    pub path: PathBuf,
}

/// A single named field of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub names: Vec<String>,
    pub type_name: String,
    /// Raw structured tag from the trailing field comment, unparsed.
    pub struct_tag: String,
    pub line: usize,
}

impl Field {
    /// Primary field name (fields always carry at least one).
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }
}

/// A parsed struct declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub file: SourceFile,
    pub name: String,
    pub line: usize,
    pub fields: Vec<Field>,
}

impl Decl {
    /// `path:line` rendering for error reports.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file.path.display(), self.line)
    }
}

/// Index of a declaration inside its owning [`Summary`].
pub type DeclId = usize;

/// A marker tag discovered on a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annot {
    /// Tag including its marker, e.g. `@envconfig`.
    pub tag_name: String,
    /// Raw parameter string after the tag, `key:"value"` formatted.
    pub tag_param: String,
    pub decl: DeclId,
}

/// All annotations discovered in one scan, in file-then-declaration-then-field
/// discovery order.
#[derive(Debug, Default)]
pub struct Summary {
    decls: Vec<Decl>,
    annots: Vec<Annot>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_decl(&mut self, decl: Decl) -> DeclId {
        self.decls.push(decl);
        self.decls.len() - 1
    }

    pub(crate) fn push_annot(&mut self, annot: Annot) {
        self.annots.push(annot);
    }

    pub fn annots(&self) -> &[Annot] {
        &self.annots
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id]
    }

    pub fn is_empty(&self) -> bool {
        self.annots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.annots.len()
    }
}

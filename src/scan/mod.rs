pub mod scanner;
pub mod tag;
pub mod types;

pub use scanner::{ScanError, Scanner};
pub use tag::{TagError, TagMap};
pub use types::{Annot, Decl, DeclId, Field, SourceFile, Summary};

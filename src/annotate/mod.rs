pub mod context;
pub mod registry;

pub use context::AnnotateContext;
pub use registry::{Annotator, AnnotatorRegistry, DispatchError};

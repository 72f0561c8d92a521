pub mod document;
pub mod extract;
pub mod manager;
pub mod resolver;

pub use document::{ExtractedDocument, MimeCategory};
pub use extract::extract;
pub use manager::{ContextData, ContextManager};
pub use resolver::{PathResolver, Resolution, ResolvedPath};

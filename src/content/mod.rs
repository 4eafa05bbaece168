//! Content module - documents, front-matter, the content store and rendering

mod document;
mod frontmatter;
pub mod loader;
mod markdown;
mod store;

pub use document::{Document, DocumentId, RevisionGroupId, SourceUnit, Status};
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use markdown::{CodeBlock, MarkdownRenderer, RenderError, RenderedDocument};
pub use store::{ContentStore, LoadError, LoadFailure, RevisionAssignment};

pub(crate) use markdown::html_escape;

#![deny(missing_docs)]
//! texmd HTML engine: Markdown rendering, math container typesetting, and
//! the composed document renderer.

/// Composed document rendering behind a builder.
pub mod document;
/// Adapter around the opaque Markdown renderer.
pub mod markdown;
/// MathML typesetting backend.
#[cfg(feature = "mathml")]
pub mod mathml;
/// Typesetting pass over emitted math containers.
pub mod stage3;

pub use document::{DocumentError, DocumentRenderer, DocumentRendererBuilder};
pub use markdown::{MarkdownError, MarkdownOptions, SourceLocation};
#[cfg(feature = "mathml")]
pub use mathml::MathMlTypesetter;
pub use stage3::{Stage3Error, typeset_elements};

#![deny(missing_docs)]
//! texmd core: LaTeX protection and staged substitution around opaque
//! Markdown renderers.

/// Typesetting backend profiles and capability selection.
pub mod backend;
/// Comment placeholder construction and restoration.
pub mod placeholder;
/// The two rewriting stages around the Markdown renderer.
pub mod pipeline;
/// Delimiter scanning over raw Markdown text.
pub mod region;
/// Configuration merging and validation.
pub mod settings;
/// Payload encoding for comment transport, plus HTML escaping helpers.
pub mod transport;

pub use backend::{DeferredEmbed, DeferredTypesetter, MathBackend, SyncTypesetter, TypesetError};
pub use pipeline::{
    DELETE_MARK, DISPLAY_ATTR, LATEX_TAG, Pipeline, PipelineError, SCROLL_STYLE,
};
pub use region::{DelimiterKind, DelimiterRule, RegionMatch, find_math, find_region};
pub use settings::{Settings, SettingsError, SettingsOverrides, cover_value};

/// Crate version, surfaced to host integrations.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

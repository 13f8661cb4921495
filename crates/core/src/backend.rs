//! Typesetting backend abstraction.
//!
//! Backends come in two profiles. A synchronous backend turns LaTeX into
//! final markup while the document is rewritten. A deferred backend only
//! embeds the source during rewriting and leaves typesetting to a later
//! phase on the host (typically a browser-side engine scanning the DOM).

use std::fmt;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::region::RegionMatch;
use crate::transport;

/// Failure reported by a typesetting backend for a single region.
#[derive(Debug, Error)]
#[error("failed to typeset math: {message}")]
pub struct TypesetError {
    /// Backend-specific description of what went wrong.
    pub message: String,
}

impl TypesetError {
    /// Wraps a backend message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A backend that produces final markup immediately.
pub trait SyncTypesetter {
    /// Typesets one region's LaTeX source into an HTML fragment.
    fn typeset(
        &self,
        latex: &str,
        display: bool,
        options: &JsonValue,
    ) -> Result<String, TypesetError>;

    /// Called once after a document finished rendering.
    fn after_render(&self) {}
}

/// A backend that embeds source now and typesets later.
pub trait DeferredTypesetter {
    /// Chooses what to embed for a matched region.
    ///
    /// The default embeds the full match, delimiters included, since a
    /// deferred engine re-discovers math by scanning for its own delimiters.
    fn prepare_content(&self, region: &RegionMatch) -> String {
        region.full.clone()
    }

    /// Called once before a render pass, e.g. to reset engine caches.
    fn prepare_render(&self) {}

    /// Produces the fragment standing in for one region until the deferred
    /// engine runs. Must be idempotent: re-rendering its own output is a
    /// no-op.
    fn render_element(
        &self,
        content: &str,
        display: bool,
        options: &JsonValue,
    ) -> Result<String, TypesetError>;

    /// Called once after a document finished rendering.
    fn after_render(&self) {}
}

/// The typesetting capability selected for a pipeline.
pub enum MathBackend {
    /// No typesetting. Regions keep their escaped source.
    None,
    /// Immediate typesetting through a [`SyncTypesetter`].
    Sync(Box<dyn SyncTypesetter>),
    /// Two-phase typesetting through a [`DeferredTypesetter`].
    Deferred(Box<dyn DeferredTypesetter>),
}

impl fmt::Debug for MathBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MathBackend::None => f.write_str("MathBackend::None"),
            MathBackend::Sync(_) => f.write_str("MathBackend::Sync(..)"),
            MathBackend::Deferred(_) => f.write_str("MathBackend::Deferred(..)"),
        }
    }
}

impl MathBackend {
    /// True when no typesetting capability is available.
    pub fn is_none(&self) -> bool {
        matches!(self, MathBackend::None)
    }

    /// What the protection stage should embed for a matched region.
    ///
    /// Synchronous backends receive the bare LaTeX source later, so only the
    /// inner content is embedded. Deferred backends choose for themselves;
    /// without a backend the full match is kept so the document text stays
    /// intact.
    pub fn prepare_content(&self, region: &RegionMatch) -> String {
        match self {
            MathBackend::None => region.full.clone(),
            MathBackend::Sync(_) => region.inner.clone(),
            MathBackend::Deferred(backend) => backend.prepare_content(region),
        }
    }

    /// Forwards the pre-render hook to deferred backends.
    pub fn prepare_render(&self) {
        if let MathBackend::Deferred(backend) = self {
            backend.prepare_render();
        }
    }

    /// Renders one region's embedded content, if a backend is available.
    pub fn render_element(
        &self,
        content: &str,
        display: bool,
        options: &JsonValue,
    ) -> Option<Result<String, TypesetError>> {
        match self {
            MathBackend::None => None,
            MathBackend::Sync(backend) => Some(backend.typeset(content, display, options)),
            MathBackend::Deferred(backend) => {
                Some(backend.render_element(content, display, options))
            }
        }
    }

    /// Forwards the post-render hook to the active backend.
    pub fn after_render(&self) {
        match self {
            MathBackend::None => {}
            MathBackend::Sync(backend) => backend.after_render(),
            MathBackend::Deferred(backend) => backend.after_render(),
        }
    }
}

/// Deferred profile that re-embeds the escaped source unchanged.
///
/// Suitable for hosts where an external engine typesets the emitted
/// containers after the fact.
#[derive(Debug, Default)]
pub struct DeferredEmbed;

impl DeferredTypesetter for DeferredEmbed {
    fn render_element(
        &self,
        content: &str,
        _display: bool,
        _options: &JsonValue,
    ) -> Result<String, TypesetError> {
        Ok(transport::escape_html(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::DelimiterKind;
    use serde_json::json;

    fn region(full: &str, inner: &str) -> RegionMatch {
        RegionMatch {
            start: 0,
            end: full.len(),
            full: full.to_string(),
            inner: inner.to_string(),
            kind: DelimiterKind::Inline,
        }
    }

    struct Upper;

    impl SyncTypesetter for Upper {
        fn typeset(
            &self,
            latex: &str,
            display: bool,
            _options: &JsonValue,
        ) -> Result<String, TypesetError> {
            Ok(format!("<u d=\"{display}\">{}</u>", latex.to_uppercase()))
        }
    }

    #[test]
    fn none_backend_renders_nothing() {
        let backend = MathBackend::None;
        assert!(backend.is_none());
        assert!(backend.render_element("x", false, &json!({})).is_none());
        assert_eq!(backend.prepare_content(&region("$x$", "x")), "$x$");
    }

    #[test]
    fn sync_backend_embeds_inner_and_typesets() {
        let backend = MathBackend::Sync(Box::new(Upper));
        assert_eq!(backend.prepare_content(&region("$x$", "x")), "x");
        let html = backend
            .render_element("x", true, &json!({}))
            .unwrap()
            .unwrap();
        assert_eq!(html, "<u d=\"true\">X</u>");
    }

    #[test]
    fn deferred_embed_keeps_full_match() {
        let backend = MathBackend::Deferred(Box::new(DeferredEmbed));
        assert_eq!(backend.prepare_content(&region("$x$", "x")), "$x$");
    }

    #[test]
    fn deferred_embed_is_idempotent_on_plain_text() {
        let embed = DeferredEmbed;
        let once = embed.render_element("a + b", false, &json!({})).unwrap();
        let twice = embed
            .render_element(&transport::unescape_html(&once), false, &json!({}))
            .unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn deferred_embed_escapes_markup() {
        let embed = DeferredEmbed;
        let html = embed
            .render_element("$a < b$", false, &json!({}))
            .unwrap();
        assert!(!html.contains('<'));
        assert_eq!(transport::unescape_html(&html), "$a < b$");
    }
}

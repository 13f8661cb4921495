//! End-to-end document rendering: protection, Markdown, restoration and
//! typesetting composed behind one builder.

use serde_json::Value as JsonValue;
use texmd_core::{
    MathBackend, Pipeline, PipelineError, Settings, SettingsError, SettingsOverrides, cover_value,
};
use thiserror::Error;

use crate::markdown::{self, MarkdownError, MarkdownOptions};
use crate::stage3::{self, Stage3Error};

/// Failure at any point of the document pipeline.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Configuration overrides were invalid.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Protection or restoration failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// The Markdown renderer reported an error.
    #[error(transparent)]
    Markdown(#[from] MarkdownError),
    /// Typesetting the emitted containers failed.
    #[error(transparent)]
    Typeset(#[from] Stage3Error),
}

/// Builder for [`DocumentRenderer`].
#[derive(Default)]
pub struct DocumentRendererBuilder {
    overrides: SettingsOverrides,
    markdown: MarkdownOptions,
    backend: Option<MathBackend>,
    before_init: Option<Box<dyn FnOnce()>>,
}

impl DocumentRendererBuilder {
    /// Applies host configuration overrides.
    pub fn overrides(mut self, overrides: SettingsOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the Markdown renderer options.
    pub fn markdown(mut self, options: MarkdownOptions) -> Self {
        self.markdown = options;
        self
    }

    /// Pins the typesetting backend instead of detecting one.
    pub fn backend(mut self, backend: MathBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Registers a hook run exactly once, before backend detection.
    pub fn before_init(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.before_init = Some(Box::new(hook));
        self
    }

    /// Runs the init hook, resolves the backend and validates settings.
    pub fn build(self) -> Result<DocumentRenderer, DocumentError> {
        if let Some(hook) = self.before_init {
            hook();
        }

        let backend = match self.backend {
            Some(backend) => backend,
            None => detect_backend(),
        };
        let settings = Settings::merge(self.overrides)?;
        let backend_options = effective_backend_options(&settings);

        Ok(DocumentRenderer {
            settings,
            markdown: self.markdown,
            backend,
            backend_options,
        })
    }
}

/// Renders whole Markdown documents with math protection and typesetting.
#[derive(Debug)]
pub struct DocumentRenderer {
    settings: Settings,
    markdown: MarkdownOptions,
    backend: MathBackend,
    backend_options: JsonValue,
}

impl DocumentRenderer {
    /// Starts configuring a renderer.
    pub fn builder() -> DocumentRendererBuilder {
        DocumentRendererBuilder::default()
    }

    /// Renders one document from Markdown source to final HTML.
    pub fn render(&self, source: &str) -> Result<String, DocumentError> {
        let pipeline = Pipeline::new(&self.settings, &self.backend);
        let protected = pipeline.stage1(source)?;
        let html = markdown::render(&protected, &self.markdown)?;
        let restored = pipeline.stage2(&html);
        let typeset = stage3::typeset_elements(&restored, &self.backend, &self.backend_options)?;
        Ok(typeset)
    }

    /// The merged settings this renderer runs with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The resolved typesetting backend.
    pub fn backend(&self) -> &MathBackend {
        &self.backend
    }
}

/// Maps the compiled-in typesetting capability onto a backend.
fn detect_backend() -> MathBackend {
    #[cfg(feature = "mathml")]
    {
        MathBackend::Sync(Box::new(crate::mathml::MathMlTypesetter::new()))
    }
    #[cfg(not(feature = "mathml"))]
    {
        MathBackend::None
    }
}

fn effective_backend_options(settings: &Settings) -> JsonValue {
    let mut options = default_backend_options();
    cover_value(&settings.custom_options, &mut options);
    options
}

fn default_backend_options() -> JsonValue {
    #[cfg(feature = "mathml")]
    {
        crate::mathml::MathMlTypesetter::default_options()
    }
    #[cfg(not(feature = "mathml"))]
    {
        JsonValue::Object(Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn before_init_runs_once_before_build_completes() {
        let calls = Rc::new(Cell::new(0));
        let seen = Rc::clone(&calls);
        let renderer = DocumentRenderer::builder()
            .before_init(move || seen.set(seen.get() + 1))
            .backend(MathBackend::None)
            .build()
            .unwrap();
        assert_eq!(calls.get(), 1);
        renderer.render("x").unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalid_overrides_fail_build() {
        let overrides: SettingsOverrides =
            serde_json::from_value(json!({ "inlineMath": [["", "$"]] })).unwrap();
        let err = DocumentRenderer::builder()
            .overrides(overrides)
            .backend(MathBackend::None)
            .build()
            .unwrap_err();
        assert!(matches!(err, DocumentError::Settings(_)));
    }

    #[test]
    fn custom_options_cover_backend_defaults() {
        let overrides: SettingsOverrides =
            serde_json::from_value(json!({ "customOptions": { "throwOnError": true } })).unwrap();
        let renderer = DocumentRenderer::builder()
            .overrides(overrides)
            .backend(MathBackend::None)
            .build()
            .unwrap();
        assert_eq!(renderer.backend_options["throwOnError"], json!(true));
    }

    #[cfg(feature = "mathml")]
    #[test]
    fn detection_prefers_the_compiled_backend() {
        let renderer = DocumentRenderer::builder().build().unwrap();
        assert!(!renderer.backend().is_none());
    }

    #[test]
    fn renders_plain_markdown_without_backend() {
        let renderer = DocumentRenderer::builder()
            .backend(MathBackend::None)
            .build()
            .unwrap();
        let html = renderer.render("# Title").unwrap();
        assert!(html.contains("<h1>Title</h1>"));
    }
}

//! Synchronous MathML typesetting through pulldown-latex.

use pulldown_latex::config::{DisplayMode, RenderConfig};
use pulldown_latex::mathml::push_mathml;
use pulldown_latex::{Parser, Storage};
use serde_json::{Value as JsonValue, json};
use texmd_core::{SyncTypesetter, TypesetError};

/// Backend that converts LaTeX into MathML while the document renders.
#[derive(Debug, Default)]
pub struct MathMlTypesetter;

impl MathMlTypesetter {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }

    /// Option defaults for this backend, merged under host overrides.
    pub fn default_options() -> JsonValue {
        json!({ "throwOnError": false })
    }
}

impl SyncTypesetter for MathMlTypesetter {
    fn typeset(
        &self,
        latex: &str,
        display: bool,
        options: &JsonValue,
    ) -> Result<String, TypesetError> {
        match render_mathml(latex, display) {
            Ok(mathml) => Ok(mathml),
            Err(message) => {
                let throw = options
                    .get("throwOnError")
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false);
                if throw {
                    Err(TypesetError::new(message))
                } else {
                    log::warn!("math typesetting failed, emitting fallback: {message}");
                    Ok(error_fallback(latex, &message, display))
                }
            }
        }
    }
}

fn render_mathml(latex: &str, display: bool) -> Result<String, String> {
    let storage = Storage::new();
    let parser = Parser::new(latex, &storage);
    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err().map(|err| err.to_string()))
        .collect();
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }

    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config).map_err(|err| err.to_string())?;
    Ok(mathml)
}

fn error_fallback(latex: &str, error: &str, display: bool) -> String {
    let mode_class = if display { "math-display" } else { "math-inline" };
    format!(
        r#"<span class="math math-error {mode_class}" title="{}"><code>{}</code></span>"#,
        html_escape::encode_safe(error),
        html_escape::encode_safe(latex),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typesets_inline_math() {
        let html = MathMlTypesetter::new()
            .typeset("x^2", false, &json!({}))
            .unwrap();
        assert!(html.contains("<math"));
        assert!(html.contains("</math>"));
    }

    #[test]
    fn typesets_display_math() {
        let html = MathMlTypesetter::new()
            .typeset(r"\frac{a}{b}", true, &json!({}))
            .unwrap();
        assert!(html.contains("<math"));
        assert!(html.contains("<mfrac"));
    }

    #[test]
    fn invalid_latex_falls_back_by_default() {
        let html = MathMlTypesetter::new()
            .typeset(r"\frac{a", false, &MathMlTypesetter::default_options())
            .unwrap();
        assert!(html.contains("math-error"));
        assert!(html.contains("math-inline"));
    }

    #[test]
    fn invalid_latex_errors_when_asked() {
        let err = MathMlTypesetter::new()
            .typeset(r"\frac{a", false, &json!({ "throwOnError": true }))
            .unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn fallback_escapes_source() {
        let html = error_fallback("$a<b$", "oops", false);
        assert!(html.contains("$a&lt;b$"));
    }
}

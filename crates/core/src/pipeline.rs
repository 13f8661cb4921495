//! The two rewriting stages wrapped around an opaque Markdown renderer.
//!
//! Stage one runs before Markdown rendering: it protects code spans, escaped
//! dollars and math regions behind comment placeholders so the renderer
//! never sees them. Stage two runs on the rendered HTML and splices the
//! protected content back in.

use thiserror::Error;

use crate::backend::MathBackend;
use crate::placeholder::{self, Tag};
use crate::region::{DelimiterKind, DelimiterRule, find_math, find_region};
use crate::settings::Settings;
use crate::transport;

/// Element name of the emitted math containers.
pub const LATEX_TAG: &str = "texmd-latex";
/// Attribute distinguishing display from inline containers.
pub const DISPLAY_ATTR: &str = "display";
/// Guard token inserted before line-start HTML comments.
pub const DELETE_MARK: &str = "latex:delete";
/// Style applied to display containers when overflow scrolling is on.
pub const SCROLL_STYLE: &str = "overflow-x: auto";

/// Errors raised while rewriting a document.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A delimiter rule matched without consuming any input, which would
    /// stall the rewrite loop.
    #[error("delimiter rule {start:?}..{end:?} produced an empty match")]
    MalformedRule {
        /// Opening delimiter of the offending rule.
        start: String,
        /// Closing delimiter of the offending rule.
        end: String,
    },
}

/// Stage-one and stage-two rewriting over a settings/backend pair.
pub struct Pipeline<'a> {
    settings: &'a Settings,
    backend: &'a MathBackend,
}

impl<'a> Pipeline<'a> {
    /// Builds a pipeline borrowing its configuration.
    pub fn new(settings: &'a Settings, backend: &'a MathBackend) -> Self {
        Self { settings, backend }
    }

    /// Protects code and math before the Markdown renderer runs.
    ///
    /// Substages run in a fixed order: HTML code tags, fenced code blocks
    /// and inline code are hidden first so their dollars cannot be taken
    /// for math. Escaped dollars go next, then the math scan itself. Code
    /// is restored before returning since the renderer must still see it;
    /// math stays hidden until [`Pipeline::stage2`].
    pub fn stage1(&self, content: &str) -> Result<String, PipelineError> {
        let mut buffer = content.to_string();

        for (rule, tag) in code_rules() {
            buffer = protect_rule(buffer, &rule, tag)?;
        }

        buffer = buffer.replace("\\$", &placeholder::marker(Tag::DollarEscape, "$"));
        buffer = self.protect_math(buffer)?;
        buffer = placeholder::restore_code(&buffer);

        Ok(guard_line_start_comments(&buffer))
    }

    /// Splices protected math back into the rendered HTML.
    pub fn stage2(&self, html: &str) -> String {
        let stripped = html.replace(DELETE_MARK, "");
        placeholder::restore_all(&stripped)
    }

    fn protect_math(&self, mut buffer: String) -> Result<String, PipelineError> {
        let inline_rules = self.settings.inline_rules();
        let display_rules = self.settings.display_rules();
        let mut protected = 0usize;

        // Rescan from the top after every substitution. Replacing a match
        // with a marker can never create a new region, so the loop shrinks
        // the remaining math monotonically.
        while let Some(region) = find_math(&buffer, &inline_rules, &display_rules) {
            if region.full.is_empty() {
                return Err(PipelineError::MalformedRule {
                    start: String::new(),
                    end: String::new(),
                });
            }

            let display = region.kind == DelimiterKind::Display;
            let content = self.backend.prepare_content(&region);
            let container = self.container_markup(&content, display);
            let marker = placeholder::marker(Tag::Math, &container);
            buffer.replace_range(region.start..region.end, &marker);
            protected += 1;
        }

        log::debug!("protected {protected} math regions");
        Ok(buffer)
    }

    fn container_markup(&self, content: &str, display: bool) -> String {
        let escaped = transport::escape_html(content);
        if display && self.settings.overflow_scroll {
            format!(
                "<{LATEX_TAG} {DISPLAY_ATTR}=\"true\" style=\"{SCROLL_STYLE}\">{escaped}</{LATEX_TAG}>"
            )
        } else {
            format!("<{LATEX_TAG} {DISPLAY_ATTR}=\"{display}\">{escaped}</{LATEX_TAG}>")
        }
    }
}

fn code_rules() -> [(DelimiterRule, Tag); 3] {
    // The scanner kind is irrelevant for code; these rules never reach the
    // math container builder.
    [
        (
            DelimiterRule::new("<code>", "</code>", true, DelimiterKind::Inline),
            Tag::CodeTag,
        ),
        (
            DelimiterRule::new("```", "```", true, DelimiterKind::Inline),
            Tag::CodeBlock,
        ),
        (
            DelimiterRule::new("`", "`", false, DelimiterKind::Inline),
            Tag::CodeInline,
        ),
    ]
}

fn protect_rule(
    mut buffer: String,
    rule: &DelimiterRule,
    tag: Tag,
) -> Result<String, PipelineError> {
    while let Some(region) = find_region(&buffer, rule) {
        if region.full.is_empty() {
            return Err(PipelineError::MalformedRule {
                start: rule.start.clone(),
                end: rule.end.clone(),
            });
        }
        let marker = placeholder::marker(tag, &region.full);
        buffer.replace_range(region.start..region.end, &marker);
    }
    Ok(buffer)
}

/// Prefixes line-start HTML comments with the guard token.
///
/// A comment at the start of a line (optionally behind a blockquote `>` and
/// spaces) opens an HTML block in CommonMark and swallows the rest of the
/// paragraph. The guard token turns it into plain inline content; stage two
/// strips the token again.
fn guard_line_start_comments(buffer: &str) -> String {
    let mut out = String::with_capacity(buffer.len());
    for line in buffer.split_inclusive('\n') {
        let rest = line.strip_prefix('>').unwrap_or(line);
        let body = rest.trim_start_matches(' ');
        if body.starts_with("<!--") {
            let prefix_len = line.len() - body.len();
            out.push_str(&line[..prefix_len]);
            out.push_str(DELETE_MARK);
            out.push_str(body);
        } else {
            out.push_str(line);
        }
    }
    out
}

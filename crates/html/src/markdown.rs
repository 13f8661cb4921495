//! Adapter around the opaque Markdown renderer.
//!
//! The renderer is treated as a black box: protected content reaches it as
//! HTML comments and must come out unchanged, so raw HTML passthrough is on
//! by default and math constructs stay disabled.

use markdown::message::{Message, Place};
use thiserror::Error;

/// Location of a renderer failure inside the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// One-based line number.
    pub line: usize,
    /// One-based column number.
    pub column: usize,
}

impl SourceLocation {
    /// Builds a location from one-based coordinates.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Failure reported by the Markdown renderer.
#[derive(Debug, Error)]
#[error("markdown rendering failed at {}:{}: {message}", location.line, location.column)]
pub struct MarkdownError {
    /// Renderer-provided description.
    pub message: String,
    /// Where in the source the failure was reported.
    pub location: SourceLocation,
}

/// Renderer options for building markdown-rs compile options.
#[derive(Clone, Copy, Debug)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown constructs.
    pub gfm: bool,
    /// Let raw HTML (and therefore placeholder comments) pass through.
    pub allow_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            gfm: true,
            allow_html: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to markdown-rs `Options`.
    pub fn to_markdown(self) -> markdown::Options {
        let parse = if self.gfm {
            markdown::ParseOptions::gfm()
        } else {
            markdown::ParseOptions::default()
        };

        let mut compile = if self.gfm {
            markdown::CompileOptions::gfm()
        } else {
            markdown::CompileOptions::default()
        };
        compile.allow_dangerous_html = self.allow_html;

        markdown::Options { parse, compile }
    }
}

/// Renders Markdown to HTML through markdown-rs.
pub fn render(input: &str, options: &MarkdownOptions) -> Result<String, MarkdownError> {
    markdown::to_html_with_options(input, &options.to_markdown()).map_err(|err| MarkdownError {
        message: err.to_string(),
        location: message_location(&err),
    })
}

fn message_location(message: &Message) -> SourceLocation {
    match &message.place {
        Some(place) => match place.as_ref() {
            Place::Point(point) => SourceLocation::new(point.line, point.column),
            Place::Position(position) => {
                SourceLocation::new(position.start.line, position.start.column)
            }
        },
        None => SourceLocation::new(1, 1),
    }
}

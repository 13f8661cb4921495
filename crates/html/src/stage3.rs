//! Element pass over restored HTML: typesetting the emitted math containers.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use serde_json::Value as JsonValue;
use texmd_core::{DISPLAY_ATTR, LATEX_TAG, MathBackend};
use thiserror::Error;

const LINK_COLOR: &str = "#0B87DA";
const JUMP_TITLE: &str = "Jump to equation";

/// Failure while rewriting the math containers in a document.
#[derive(Debug, Error)]
#[error("element rewriting failed: {message}")]
pub struct Stage3Error {
    /// Description of the rewrite failure, including typesetting errors.
    pub message: String,
}

/// Typesets every math container in `html` through `backend`.
///
/// With no backend the document is returned untouched and the containers
/// keep their escaped source. Otherwise each container's text is decoded,
/// handed to the backend and replaced by the returned fragment, and anchors
/// the backend produced (equation references) are restyled in a second
/// pass, since content inserted during a rewrite is not revisited by it.
pub fn typeset_elements(
    html: &str,
    backend: &MathBackend,
    options: &JsonValue,
) -> Result<String, Stage3Error> {
    if backend.is_none() {
        return Ok(html.to_string());
    }

    backend.prepare_render();
    let rendered = rewrite_math(html, backend, options)?;
    let fixed = fix_reference_links(&rendered)?;
    backend.after_render();
    Ok(fixed)
}

struct ElementState {
    display: bool,
    buffer: String,
}

fn rewrite_math(
    html: &str,
    backend: &MathBackend,
    options: &JsonValue,
) -> Result<String, Stage3Error> {
    let state = Rc::new(RefCell::new(ElementState {
        display: false,
        buffer: String::new(),
    }));
    let element_state = Rc::clone(&state);
    let text_state = Rc::clone(&state);

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(LATEX_TAG, move |el| {
                    let mut state = element_state.borrow_mut();
                    state.display = el.get_attribute(DISPLAY_ATTR).as_deref() == Some("true");
                    state.buffer.clear();
                    Ok(())
                }),
                text!(LATEX_TAG, move |chunk| {
                    let mut state = text_state.borrow_mut();
                    state.buffer.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let source = html_escape::decode_html_entities(&state.buffer);
                        match backend.render_element(&source, state.display, options) {
                            Some(Ok(markup)) => chunk.replace(&markup, ContentType::Html),
                            Some(Err(err)) => return Err(err.into()),
                            None => {}
                        }
                    } else {
                        chunk.remove();
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| Stage3Error {
        message: err.to_string(),
    })
}

fn fix_reference_links(html: &str) -> Result<String, Stage3Error> {
    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(
                format!(r##"{LATEX_TAG} a[href^="#"]"##),
                |el| {
                    if el.get_attribute("style").is_none() {
                        el.set_attribute("style", &format!("color: {LINK_COLOR}"))?;
                    }
                    el.set_attribute("title", JUMP_TITLE)?;
                    Ok(())
                }
            )],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| Stage3Error {
        message: err.to_string(),
    })
}

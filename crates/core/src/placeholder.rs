//! Comment placeholders that carry protected content through a Markdown
//! renderer.
//!
//! Protected spans are replaced with HTML comments of the form
//! `<!-- latex:replace TAG ENCODED -->`. Comments pass through Markdown
//! rendering untouched (as long as raw HTML is allowed), so the payload can
//! be spliced back afterwards.

use crate::transport;

/// Identifier embedded in every placeholder comment.
pub const REPLACE_MARK: &str = "latex:replace";

const PREFIX: &str = "<!-- latex:replace ";
const SUFFIX: &str = " -->";

/// Category of a protected span, recorded inside the marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Literal `<code>..</code>` HTML spans.
    CodeTag,
    /// Fenced code blocks.
    CodeBlock,
    /// Backtick inline code.
    CodeInline,
    /// A matched math region, stored as its final container markup.
    Math,
    /// An escaped dollar sign.
    DollarEscape,
}

impl Tag {
    /// The token written into the marker comment.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::CodeTag => "CODE_TAG",
            Tag::CodeBlock => "CODE_BLOCK",
            Tag::CodeInline => "CODE_INLINE",
            Tag::Math => "MATH",
            Tag::DollarEscape => "DOLLAR",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token {
            "CODE_TAG" => Some(Tag::CodeTag),
            "CODE_BLOCK" => Some(Tag::CodeBlock),
            "CODE_INLINE" => Some(Tag::CodeInline),
            "MATH" => Some(Tag::Math),
            "DOLLAR" => Some(Tag::DollarEscape),
            _ => None,
        }
    }

    fn is_code(self) -> bool {
        matches!(self, Tag::CodeTag | Tag::CodeBlock | Tag::CodeInline)
    }
}

/// Builds a placeholder comment carrying `payload` under `tag`.
pub fn marker(tag: Tag, payload: &str) -> String {
    format!(
        "{PREFIX}{} {}{SUFFIX}",
        tag.as_str(),
        transport::encode(payload)
    )
}

/// Restores code placeholders only, leaving math and dollar markers in place.
///
/// Used between the math pass and the Markdown render so code content is
/// visible to the renderer again while math stays protected.
pub fn restore_code(buffer: &str) -> String {
    restore_matching(buffer, Tag::is_code)
}

/// Restores every placeholder in the buffer.
pub fn restore_all(buffer: &str) -> String {
    restore_matching(buffer, |_| true)
}

fn restore_matching(buffer: &str, should_restore: impl Fn(Tag) -> bool) -> String {
    let mut out = String::with_capacity(buffer.len());
    let mut rest = buffer;

    while let Some(found) = rest.find(PREFIX) {
        let (before, marker_on) = rest.split_at(found);
        out.push_str(before);

        match parse_marker(marker_on) {
            Some((tag, encoded, marker_len)) if should_restore(tag) => {
                match transport::decode(encoded) {
                    Some(payload) => out.push_str(&payload),
                    None => {
                        log::warn!(
                            "dropping {} placeholder with undecodable payload",
                            tag.as_str()
                        );
                    }
                }
                // Resume after the marker, never inside the spliced payload,
                // so payloads that look like markers stay inert.
                rest = &marker_on[marker_len..];
            }
            Some((_, _, marker_len)) => {
                out.push_str(&marker_on[..marker_len]);
                rest = &marker_on[marker_len..];
            }
            None => {
                out.push_str(PREFIX);
                rest = &marker_on[PREFIX.len()..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Parses a marker anchored at the beginning of `input`.
///
/// Returns the tag, the encoded payload slice and the total marker length.
fn parse_marker(input: &str) -> Option<(Tag, &str, usize)> {
    let body = &input[PREFIX.len()..];
    let space = body.find(' ')?;
    let tag = Tag::parse(&body[..space])?;

    let encoded_on = &body[space + 1..];
    let suffix = encoded_on.find(SUFFIX)?;
    let encoded = &encoded_on[..suffix];
    if encoded.contains('\n') {
        return None;
    }

    let total = PREFIX.len() + space + 1 + suffix + SUFFIX.len();
    Some((tag, encoded, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trips_through_restore_all() {
        let text = format!("before {} after", marker(Tag::Math, "<x>payload</x>"));
        assert_eq!(restore_all(&text), "before <x>payload</x> after");
    }

    #[test]
    fn restore_code_leaves_math_markers() {
        let text = format!(
            "{} {}",
            marker(Tag::CodeInline, "`a`"),
            marker(Tag::Math, "$b$")
        );
        let restored = restore_code(&text);
        assert!(restored.starts_with("`a` "));
        assert!(restored.contains(REPLACE_MARK));
        assert_eq!(restore_all(&restored), "`a` $b$");
    }

    #[test]
    fn undecodable_payload_restores_to_empty() {
        let text = format!("{PREFIX}MATH not-base64!!{SUFFIX}");
        assert_eq!(restore_all(&text), "");
    }

    #[test]
    fn unknown_tag_is_left_alone() {
        let text = format!("{PREFIX}WHAT dGVzdA=={SUFFIX}");
        assert_eq!(restore_all(&text), text);
    }

    #[test]
    fn marker_shaped_payload_is_not_expanded() {
        let inner = marker(Tag::Math, "x");
        let outer = marker(Tag::CodeBlock, &inner);
        assert_eq!(restore_all(&outer), inner);
    }

    #[test]
    fn truncated_marker_is_preserved() {
        let text = format!("{PREFIX}MATH dGVzdA==");
        assert_eq!(restore_all(&text), text);
    }

    #[test]
    fn restores_multiple_markers_in_order() {
        let text = format!(
            "{}-{}",
            marker(Tag::DollarEscape, "$"),
            marker(Tag::Math, "m")
        );
        assert_eq!(restore_all(&text), "$-m");
    }
}

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Encodes a payload so it can travel inside an HTML comment untouched.
///
/// The payload is percent-encoded byte-wise first, then base64-encoded, so
/// the result contains no `-->`, no newlines and no non-ASCII bytes.
pub fn encode(payload: &str) -> String {
    let percent = utf8_percent_encode(payload, NON_ALPHANUMERIC).to_string();
    BASE64.encode(percent.as_bytes())
}

/// Decodes a payload produced by [`encode`].
///
/// Returns `None` when the input is not valid base64, not valid UTF-8 after
/// base64 decoding, or not valid percent-encoding.
pub fn decode(encoded: &str) -> Option<String> {
    let bytes = BASE64.decode(encoded.as_bytes()).ok()?;
    let percent = String::from_utf8(bytes).ok()?;
    let decoded = percent_decode_str(&percent).decode_utf8().ok()?;
    Some(decoded.into_owned())
}

/// Escapes `&`, `<`, `>`, `"` and `'` for safe inclusion in HTML text.
pub fn escape_html(input: &str) -> String {
    html_escape::encode_safe(input).into_owned()
}

/// Reverses HTML entity escaping.
pub fn unescape_html(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

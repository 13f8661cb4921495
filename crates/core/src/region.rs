//! Delimiter scanning over raw Markdown text.
//!
//! A region is the shortest span between a start and an end delimiter where
//! neither the opening delimiter nor the terminator is escaped with a
//! backslash. Scanning is leftmost-first: the earliest start position that
//! yields a complete region wins.

/// Whether a matched region should render inline or as display math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    /// Math flowing inside surrounding text.
    Inline,
    /// Block-level math on its own line.
    Display,
}

/// A start/end delimiter pair together with its scanning mode.
#[derive(Debug, Clone)]
pub struct DelimiterRule {
    /// Opening delimiter, e.g. `$` or `\(`.
    pub start: String,
    /// Closing delimiter, e.g. `$` or `\)`.
    pub end: String,
    /// When false, a newline inside the region aborts the candidate.
    pub multiline: bool,
    /// Inline or display classification of matches.
    pub kind: DelimiterKind,
}

impl DelimiterRule {
    /// Builds a rule from delimiter strings.
    pub fn new(start: &str, end: &str, multiline: bool, kind: DelimiterKind) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            multiline,
            kind,
        }
    }
}

/// A successfully matched region inside a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMatch {
    /// Byte offset of the opening delimiter.
    pub start: usize,
    /// Byte offset just past the closing delimiter.
    pub end: usize,
    /// The whole matched span, delimiters included.
    pub full: String,
    /// The content between the delimiters.
    pub inner: String,
    /// Classification inherited from the matching rule.
    pub kind: DelimiterKind,
}

/// Finds the leftmost complete region for a single rule.
///
/// Returns `None` when no eligible start position yields a terminated,
/// non-empty region.
pub fn find_region(buffer: &str, rule: &DelimiterRule) -> Option<RegionMatch> {
    let mut search_from = 0usize;

    while let Some(found) = buffer[search_from..].find(&rule.start) {
        let candidate = search_from + found;

        if !preceded_by_backslash(buffer, candidate) {
            if let Some(matched) = match_at(buffer, rule, candidate) {
                return Some(matched);
            }
        }

        // Resume one character past the failed candidate so overlapping
        // occurrences of the start delimiter are still considered.
        let step = buffer[candidate..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        search_from = candidate + step;
    }

    None
}

/// Attempts a region match with the opening delimiter anchored at `start`.
fn match_at(buffer: &str, rule: &DelimiterRule, start: usize) -> Option<RegionMatch> {
    let content_start = start + rule.start.len();
    let mut pos = content_start;
    let mut units = 0usize;

    loop {
        // The terminator check comes before escape handling: for pairs like
        // `\(`/`\)` the closing delimiter itself begins with a backslash and
        // must not be consumed as an escape sequence.
        if units > 0 && buffer[pos..].starts_with(&rule.end) {
            let end = pos + rule.end.len();
            return Some(RegionMatch {
                start,
                end,
                full: buffer[start..end].to_string(),
                inner: buffer[content_start..pos].to_string(),
                kind: rule.kind,
            });
        }

        let rest = &buffer[pos..];
        let mut chars = rest.chars();
        let current = chars.next()?;

        if current == '\\' {
            let escaped = chars.next()?;
            if !rule.multiline && escaped == '\n' {
                return None;
            }
            pos += current.len_utf8() + escaped.len_utf8();
        } else {
            if !rule.multiline && current == '\n' {
                return None;
            }
            pos += current.len_utf8();
        }
        units += 1;
    }
}

fn preceded_by_backslash(buffer: &str, index: usize) -> bool {
    index > 0 && buffer.as_bytes()[index - 1] == b'\\'
}

/// Finds the next math region, resolving inline/display overlap.
///
/// Within each rule family the first rule that matches anywhere in the
/// buffer wins. Across families the earlier start position wins; when both
/// candidates begin at the same offset the display match takes precedence,
/// since an inline opener that is a prefix of a display opener would
/// otherwise shadow it permanently.
pub fn find_math(
    buffer: &str,
    inline_rules: &[DelimiterRule],
    display_rules: &[DelimiterRule],
) -> Option<RegionMatch> {
    let inline = first_family_match(buffer, inline_rules);
    let display = first_family_match(buffer, display_rules);

    match (inline, display) {
        (Some(i), Some(d)) => {
            if d.start <= i.start {
                Some(d)
            } else {
                Some(i)
            }
        }
        (Some(i), None) => Some(i),
        (None, Some(d)) => Some(d),
        (None, None) => None,
    }
}

fn first_family_match(buffer: &str, rules: &[DelimiterRule]) -> Option<RegionMatch> {
    rules.iter().find_map(|rule| find_region(buffer, rule))
}

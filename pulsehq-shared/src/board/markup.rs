/// Inline markup for message and note bodies
///
/// Supported subset, matched left to right:
///
/// - `**strong**`
/// - `*emphasis*`
/// - `` `code` ``
/// - bare `http://` and `https://` links
///
/// Anything else is plain text. Markers are not nested; the inside of a span
/// is taken literally.

use once_cell::sync::Lazy;
use regex::Regex;

static INLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*(?P<strong>.+?)\*\*|\*(?P<em>.+?)\*|`(?P<code>.+?)`|(?P<link>https?://[^\s]+)")
        .expect("valid inline markup regex")
});

/// One rendered piece of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Span<'a> {
    Text(&'a str),
    Strong(&'a str),
    Emphasis(&'a str),
    Code(&'a str),
    Link(&'a str),
}

impl<'a> Span<'a> {
    /// Text content without markers
    pub fn text(&self) -> &'a str {
        match *self {
            Span::Text(s) | Span::Strong(s) | Span::Emphasis(s) | Span::Code(s) | Span::Link(s) => s,
        }
    }
}

/// Splits `body` into spans
pub fn parse_inline(body: &str) -> Vec<Span<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in INLINE.captures_iter(body) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::Text(&body[last..whole.start()]));
        }

        let span = if let Some(m) = caps.name("strong") {
            Span::Strong(m.as_str())
        } else if let Some(m) = caps.name("em") {
            Span::Emphasis(m.as_str())
        } else if let Some(m) = caps.name("code") {
            Span::Code(m.as_str())
        } else {
            Span::Link(whole.as_str())
        };
        spans.push(span);
        last = whole.end();
    }

    if last < body.len() {
        spans.push(Span::Text(&body[last..]));
    }

    spans
}

/// Body with all markers removed, for previews
pub fn plain_text(body: &str) -> String {
    parse_inline(body).iter().map(Span::text).collect()
}

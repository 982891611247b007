//! Escaping and sanitizing of feed-sourced text before it is embedded into
//! generated pages. Feed content is written by third parties, so titles and
//! URLs are always escaped and summaries are reduced to plain text unless a
//! project explicitly opts into raw summary markup.

use pulldown_cmark::escape::{escape_href, escape_html};
use regex::Regex;

// Writing to a `String` can't fail, so the `io::Result`s below are dropped.

/// Escapes `text` for element content or quoted attributes.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let _ = escape_html(&mut escaped, text);
    escaped
}

/// Escapes `url` for `href` and `src` attributes.
pub fn escape_url(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    let _ = escape_href(&mut escaped, url);
    escaped
}

/// Reduces feed summaries to plain text. Script and style elements are
/// dropped along with their contents, every other tag is replaced with a
/// space, and any stray angle bracket left behind is escaped. Character
/// references are kept as they are since the summary is still HTML text.
pub struct Sanitizer {
    script: Regex,
    style: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl Sanitizer {
    pub fn new() -> Result<Sanitizer, regex::Error> {
        Ok(Sanitizer {
            script: Regex::new(r"(?is)<script\b.*?</script\s*>")?,
            style: Regex::new(r"(?is)<style\b.*?</style\s*>")?,
            tag: Regex::new(r"(?s)<[^<>]*>")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn sanitize(&self, summary: &str) -> String {
        let text = self.script.replace_all(summary, " ");
        let text = self.style.replace_all(&text, " ");
        let text = self.tag.replace_all(&text, " ");
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().replace('<', "&lt;").replace('>', "&gt;")
    }
}

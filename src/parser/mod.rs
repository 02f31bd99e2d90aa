//! Input parsing: turning raw CLI/stdin text into fetchable URLs.
//!
//! Input is a whitespace-separated list of tokens. Tokens that parse as
//! http(s) URLs become work items; everything else is collected as
//! skipped so the shell can surface a per-token notice.

use std::fmt;

use tracing::debug;
use url::Url;

/// A single URL parsed from input.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    /// Original input token.
    pub raw: String,
    /// Normalized URL string.
    pub value: String,
}

impl ParsedItem {
    /// Creates a new parsed item.
    #[must_use]
    pub fn new(raw: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ParsedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Collection of parsed items from input.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Successfully parsed URLs, in input order.
    pub items: Vec<ParsedItem>,
    /// Tokens that could not be parsed as http(s) URLs.
    pub skipped: Vec<String>,
}

impl ParseResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a successfully parsed item.
    pub fn add_item(&mut self, item: ParsedItem) {
        self.items.push(item);
    }

    /// Adds a skipped token (non-parseable).
    pub fn add_skipped(&mut self, token: impl Into<String>) {
        self.skipped.push(token.into());
    }

    /// Returns true if no URLs were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the count of parsed URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns the count of skipped tokens.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for ParseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parsed {} URLs ({} skipped)",
            self.items.len(),
            self.skipped.len()
        )
    }
}

/// Parses whitespace-separated input into URLs.
///
/// Only `http` and `https` schemes are accepted; other tokens land in
/// the skipped list. Order is preserved.
#[must_use]
pub fn parse_input(input: &str) -> ParseResult {
    let mut result = ParseResult::new();

    for token in input.split_whitespace() {
        match Url::parse(token) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                result.add_item(ParsedItem::new(token, parsed.to_string()));
            }
            _ => {
                debug!(token = %token, "skipping non-URL token");
                result.add_skipped(token);
            }
        }
    }

    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input_splits_on_whitespace() {
        let result = parse_input("https://a.example/1.jpg  https://b.example/2.png\nhttps://c.example/3.gif");
        assert_eq!(result.len(), 3);
        assert_eq!(result.skipped_count(), 0);
        assert_eq!(result.items[0].value, "https://a.example/1.jpg");
        assert_eq!(result.items[2].value, "https://c.example/3.gif");
    }

    #[test]
    fn test_parse_input_skips_non_urls() {
        let result = parse_input("hello https://a.example/cat.jpg world");
        assert_eq!(result.len(), 1);
        assert_eq!(result.skipped_count(), 2);
        assert!(result.skipped.contains(&"hello".to_string()));
    }

    #[test]
    fn test_parse_input_skips_non_http_schemes() {
        let result = parse_input("ftp://a.example/cat.jpg file:///etc/passwd https://ok.example/x.png");
        assert_eq!(result.len(), 1);
        assert_eq!(result.skipped_count(), 2);
        assert_eq!(result.items[0].value, "https://ok.example/x.png");
    }

    #[test]
    fn test_parse_input_empty_is_empty() {
        assert!(parse_input("").is_empty());
        assert!(parse_input("   \n\t ").is_empty());
    }

    #[test]
    fn test_parse_input_preserves_raw_token() {
        let result = parse_input("HTTPS://A.Example/Cat.JPG");
        assert_eq!(result.len(), 1);
        assert_eq!(result.items[0].raw, "HTTPS://A.Example/Cat.JPG");
    }

    #[test]
    fn test_parse_result_display() {
        let mut result = ParseResult::new();
        result.add_item(ParsedItem::new("https://a.example/", "https://a.example/"));
        result.add_skipped("text");
        assert_eq!(result.to_string(), "Parsed 1 URLs (1 skipped)");
    }
}

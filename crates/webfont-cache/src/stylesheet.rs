//! Stylesheet request building and `url(...)` extraction

use regex::Regex;

/// Build the CSS2 API request for one family/weight.
///
/// `family` must already be normalized (spaces replaced by `+`); the plus
/// signs are part of the query format and are not percent-encoded.
pub fn stylesheet_url(base: &str, family: &str, weight: u32) -> String {
    format!("{}?family={}:wght@{}&display=swap", base, family, weight)
}

/// Finds font binary URLs inside `@font-face` rules
#[derive(Debug, Clone)]
pub struct FontUrlMatcher {
    pattern: Regex,
}

impl FontUrlMatcher {
    /// Only URLs starting with `prefix` are accepted.
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"url\(({}[^)]+)\)", regex::escape(prefix)))?;
        Ok(Self { pattern })
    }

    /// First matching URL in the stylesheet, if any
    pub fn first_font_url<'a>(&self, css: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(css)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

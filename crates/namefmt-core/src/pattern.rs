//! Marker recognition
//!
//! A [`Pattern`] wraps the regular expression that recognizes `${name}` /
//! `${name:format}` markers. The pattern must define a capture group called
//! `name`; a `format` group is optional, and its absence in a match means
//! the marker carried no format token.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

/// The default marker grammar: `${name}` or `${name:format}`, with optional
/// whitespace around the name and the format token.
pub const DEFAULT_PATTERN: &str = r"\$\{\s*(?P<name>\w+?)\s*(?::(?P<format>.*?))?\s*\}";

static DEFAULT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_PATTERN).expect("default pattern compiles"));

/// A compiled marker-recognition pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

/// One recognized marker within an input string
///
/// Markers borrow from the scanned input; they are produced and consumed
/// within a single formatting pass and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker<'a> {
    /// The full matched text, including delimiters
    pub text: &'a str,
    /// The captured name
    pub name: &'a str,
    /// The captured format token, if the marker carried one
    pub format: Option<&'a str>,
    /// Byte offset of the match start within the input
    pub start: usize,
    /// Byte offset of the match end within the input
    pub end: usize,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            regex: DEFAULT_REGEX.clone(),
        }
    }
}

impl Pattern {
    /// Compile a marker pattern from text
    ///
    /// Fails with [`ErrorKind::PatternSyntax`](crate::ErrorKind::PatternSyntax)
    /// when the text is not a valid regular expression, and with
    /// [`ErrorKind::MissingNameGroup`](crate::ErrorKind::MissingNameGroup)
    /// when the compiled pattern does not define a `name` capture group.
    /// The check happens here, never at match time.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::pattern_syntax(e.to_string()))?;
        Self::from_regex(regex)
    }

    /// Wrap an already-compiled regex, validating the `name` capture group
    pub fn from_regex(regex: Regex) -> Result<Self> {
        if !regex.capture_names().flatten().any(|n| n == "name") {
            return Err(Error::missing_name_group());
        }
        Ok(Self { regex })
    }

    /// Whether `input` contains at least one marker
    ///
    /// A pure query; no state is touched.
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// Iterate the markers in `input`, leftmost first, non-overlapping
    ///
    /// Matches in which the `name` group did not participate (possible with
    /// caller-supplied alternations) are skipped, which leaves their text
    /// untouched by a substitution pass.
    pub fn markers<'a>(&'a self, input: &'a str) -> impl Iterator<Item = Marker<'a>> + 'a {
        self.regex.captures_iter(input).filter_map(|caps| {
            let full = caps.get(0).expect("group 0 always participates");
            let name = caps.name("name")?;
            Some(Marker {
                text: full.as_str(),
                name: name.as_str(),
                format: caps.name("format").map(|m| m.as_str()),
                start: full.start(),
                end: full.end(),
            })
        })
    }

    /// The underlying compiled regex
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_pattern_matches() {
        let pattern = Pattern::default();
        assert!(pattern.is_match("XYZ_${literal}_xyz"));
        assert!(pattern.is_match("${a}"));
        assert!(pattern.is_match("${ name : %Y }"));
    }

    #[test]
    fn test_default_pattern_rejects_plain_text() {
        let pattern = Pattern::default();
        assert!(!pattern.is_match("FooBarBaz"));
        assert!(!pattern.is_match("just $dollar and {braces}"));
        assert!(!pattern.is_match("${}"));
    }

    #[test]
    fn test_missing_name_group() {
        let err = Pattern::new(r"^\d{3}-\d{4}$").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::MissingNameGroup);
    }

    #[test]
    fn test_invalid_syntax() {
        let err = Pattern::new(r"(?P<name>\w+").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::PatternSyntax);
    }

    #[test]
    fn test_marker_without_format() {
        let pattern = Pattern::default();
        let markers: Vec<_> = pattern.markers("a ${key} b").collect();

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].text, "${key}");
        assert_eq!(markers[0].name, "key");
        assert_eq!(markers[0].format, None);
        assert_eq!(markers[0].start, 2);
        assert_eq!(markers[0].end, 8);
    }

    #[test]
    fn test_marker_with_format() {
        let pattern = Pattern::default();
        let markers: Vec<_> = pattern.markers("${amount:0.00}").collect();

        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].name, "amount");
        assert_eq!(markers[0].format, Some("0.00"));
    }

    #[test]
    fn test_marker_with_empty_format() {
        // A bare colon still counts as "format supplied"
        let pattern = Pattern::default();
        let markers: Vec<_> = pattern.markers("${key:}").collect();

        assert_eq!(markers[0].format, Some(""));
    }

    #[test]
    fn test_marker_name_whitespace_is_trimmed() {
        let pattern = Pattern::default();
        let markers: Vec<_> = pattern.markers("${  date  }").collect();

        assert_eq!(markers[0].name, "date");
        assert_eq!(markers[0].format, None);
    }

    #[test]
    fn test_format_token_keeps_leading_whitespace() {
        // Whitespace after the colon belongs to the format token; only
        // trailing whitespace before the closing brace is outside it.
        let pattern = Pattern::default();
        let markers: Vec<_> = pattern.markers("${date: %d }").collect();

        assert_eq!(markers[0].format, Some(" %d"));
    }

    #[test]
    fn test_markers_are_ordered_and_non_overlapping() {
        let pattern = Pattern::default();
        let input = "${a}-${b:x}-${c}";
        let markers: Vec<_> = pattern.markers(input).collect();

        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].name, "a");
        assert_eq!(markers[1].name, "b");
        assert_eq!(markers[2].name, "c");
        assert!(markers[0].end <= markers[1].start);
        assert!(markers[1].end <= markers[2].start);
    }

    #[test]
    fn test_custom_pattern_with_name_group() {
        let pattern = Pattern::new(r"%(?P<name>[a-z]+)%").unwrap();
        let markers: Vec<_> = pattern.markers("x %key% y").collect();

        assert_eq!(markers[0].name, "key");
        assert_eq!(markers[0].format, None);
    }

    #[test]
    fn test_alternation_without_name_participation_is_skipped() {
        // The `name` group exists in the pattern but does not participate
        // in every match; those matches are not yielded.
        let pattern = Pattern::new(r"\$(?P<name>\w+)|@@").unwrap();
        let markers: Vec<_> = pattern.markers("$one @@ $two").collect();

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].name, "one");
        assert_eq!(markers[1].name, "two");
    }

    #[test]
    fn test_from_regex() {
        let regex = Regex::new(r"\[(?P<name>\w+)\]").unwrap();
        let pattern = Pattern::from_regex(regex).unwrap();
        assert!(pattern.is_match("[tag]"));

        let bad = Regex::new(r"\[\w+\]").unwrap();
        assert!(Pattern::from_regex(bad).is_err());
    }
}

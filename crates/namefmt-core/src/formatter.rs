//! The named formatter
//!
//! [`NamedFormatter`] ties a marker [`Pattern`] to a [`ConverterRegistry`]
//! and performs the scan-and-replace pass. Registration needs `&mut self`;
//! formatting needs `&self`, so a finished formatter can be shared across
//! threads as long as its converters tolerate concurrent invocation.

use std::fmt;

use regex::Regex;

use crate::convert::{Converter, ConverterRegistry, Formattable, KeyFold, Names};
use crate::error::Result;
use crate::pattern::Pattern;

/// User-defined composite formatting over `${name}` / `${name:format}` markers
///
/// Markers whose name has a registered converter are replaced by the
/// converter's output; unregistered markers pass through verbatim, so a
/// template can be formatted in stages by different parties.
///
/// # Examples
///
/// ```
/// use namefmt_core::NamedFormatter;
///
/// let mut formatter = NamedFormatter::new();
/// formatter
///     .add("app", "namefmt")?
///     .add_formattable("build", 7u32)?;
///
/// assert_eq!(formatter.format("${app}-${build:000}")?, "namefmt-007");
/// assert_eq!(formatter.format("${app}-${channel}")?, "namefmt-${channel}");
/// # Ok::<(), namefmt_core::Error>(())
/// ```
pub struct NamedFormatter {
    pattern: Pattern,
    converters: ConverterRegistry,
}

impl Default for NamedFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl NamedFormatter {
    /// Create a formatter with the default marker pattern and exact key
    /// matching
    pub fn new() -> Self {
        Self::from_pattern(Pattern::default())
    }

    /// Create a formatter from marker pattern text
    ///
    /// The pattern must define a `name` capture group; see [`Pattern::new`].
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        Ok(Self::from_pattern(Pattern::new(pattern)?))
    }

    /// Create a formatter from an already-compiled regex
    pub fn from_regex(regex: Regex) -> Result<Self> {
        Ok(Self::from_pattern(Pattern::from_regex(regex)?))
    }

    /// Create a formatter from a validated [`Pattern`]
    pub fn from_pattern(pattern: Pattern) -> Self {
        Self {
            pattern,
            converters: ConverterRegistry::new(),
        }
    }

    /// Replace the key-folding strategy, e.g. [`CaseFold`](crate::CaseFold)
    ///
    /// Already-registered names are re-folded and must remain distinct
    /// under the new strategy.
    pub fn with_key_fold(mut self, fold: impl KeyFold + 'static) -> Result<Self> {
        self.converters.set_key_fold(fold)?;
        Ok(self)
    }

    /// Whether `input` contains at least one marker
    pub fn is_match(&self, input: &str) -> bool {
        self.pattern.is_match(input)
    }

    /// The marker pattern in use
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Associate `name` with a literal value
    ///
    /// The value is rendered once via `Display`; the marker's format token
    /// is ignored.
    pub fn add(&mut self, name: &str, value: impl fmt::Display) -> Result<&mut Self> {
        let text = value.to_string();
        let convert =
            move |_format: Option<&str>| -> Result<Option<String>> { Ok(Some(text.clone())) };
        self.add_fn(name, convert)
    }

    /// Associate `name` with a format-aware value
    ///
    /// The marker's format token is passed to
    /// [`Formattable::format_with`] at substitution time.
    pub fn add_formattable<V>(&mut self, name: &str, value: V) -> Result<&mut Self>
    where
        V: Formattable + Send + Sync + 'static,
    {
        let convert = move |format: Option<&str>| -> Result<Option<String>> {
            Ok(Some(value.format_with(format)))
        };
        self.add_fn(name, convert)
    }

    /// Associate `name` with a producer invoked at each substitution
    ///
    /// Per-call state (counters, clocks) lives in the closure; the marker's
    /// format token is ignored.
    pub fn add_producer<V, F>(&mut self, name: &str, produce: F) -> Result<&mut Self>
    where
        V: fmt::Display,
        F: Fn() -> V + Send + Sync + 'static,
    {
        let convert = move |_format: Option<&str>| -> Result<Option<String>> {
            Ok(Some(produce().to_string()))
        };
        self.add_fn(name, convert)
    }

    /// Associate `name` with a format-aware producer invoked at each
    /// substitution
    pub fn add_formattable_producer<V, F>(&mut self, name: &str, produce: F) -> Result<&mut Self>
    where
        V: Formattable,
        F: Fn() -> V + Send + Sync + 'static,
    {
        let convert = move |format: Option<&str>| -> Result<Option<String>> {
            Ok(Some(produce().format_with(format)))
        };
        self.add_fn(name, convert)
    }

    /// Associate `name` with a converter (the canonical registration)
    ///
    /// All other `add` forms are thin adapters over this one. The converter
    /// receives the raw captured format token (`None` when the marker had no
    /// `:format` segment) and returns the replacement text; `Ok(None)`
    /// produces an empty replacement.
    ///
    /// ```
    /// use namefmt_core::{NamedFormatter, Result};
    ///
    /// let mut formatter = NamedFormatter::new();
    /// formatter.add_fn("upper", |format: Option<&str>| -> Result<Option<String>> {
    ///     Ok(format.map(str::to_uppercase))
    /// })?;
    ///
    /// assert_eq!(formatter.format("${upper:abc} ${upper}")?, "ABC ");
    /// # Ok::<(), namefmt_core::Error>(())
    /// ```
    pub fn add_fn<C>(&mut self, name: &str, convert: C) -> Result<&mut Self>
    where
        C: Converter + 'static,
    {
        self.converters.insert(name, Box::new(convert))?;
        Ok(self)
    }

    /// Replace every registered marker in `input` with its converter's
    /// output
    ///
    /// A single left-to-right, non-overlapping scan. Unregistered markers
    /// pass through verbatim; converter errors propagate unchanged; text
    /// between markers is copied as-is. Replacement text is never re-scanned
    /// for further markers.
    pub fn format(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut last = 0;

        for marker in self.pattern.markers(input) {
            out.push_str(&input[last..marker.start]);
            match self.converters.get(marker.name) {
                Some(convert) => {
                    let replacement = convert.convert(marker.format)?;
                    out.push_str(replacement.as_deref().unwrap_or(""));
                }
                None => {
                    log::trace!("no converter registered for '{}'", marker.name);
                    out.push_str(marker.text);
                }
            }
            last = marker.end;
        }

        out.push_str(&input[last..]);
        Ok(out)
    }

    /// Whether a converter is registered for `name` (after key folding)
    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Names<'_> {
        self.converters.names()
    }

    /// Number of registered converters
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether no converters are registered
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl<'a> IntoIterator for &'a NamedFormatter {
    type Item = &'a str;
    type IntoIter = Names<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.names()
    }
}

impl fmt::Debug for NamedFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFormatter")
            .field("pattern", &self.pattern.regex().as_str())
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::CaseFold;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_is_match() {
        let formatter = NamedFormatter::new();
        assert!(formatter.is_match("XYZ_${literal}_xyz"));
        assert!(!formatter.is_match("FooBarBaz"));
    }

    #[test]
    fn test_format_without_markers_is_identity() {
        let formatter = NamedFormatter::new();
        assert_eq!(formatter.format("FooBarBaz").unwrap(), "FooBarBaz");
        assert_eq!(formatter.format("").unwrap(), "");
    }

    #[test]
    fn test_unknown_markers_pass_through_verbatim() {
        let mut formatter = NamedFormatter::new();
        formatter.add("known", "yes").unwrap();

        assert_eq!(
            formatter.format("${known} ${unknown} ${unknown:0.00}").unwrap(),
            "yes ${unknown} ${unknown:0.00}"
        );
    }

    #[test]
    fn test_absent_converter_result_becomes_empty() {
        let mut formatter = NamedFormatter::new();
        formatter
            .add_fn("gone", |_format: Option<&str>| -> crate::Result<Option<String>> {
                Ok(None)
            })
            .unwrap();

        assert_eq!(formatter.format("a${gone}b").unwrap(), "ab");
    }

    #[test]
    fn test_fluent_chaining() {
        let mut formatter = NamedFormatter::new();
        formatter
            .add("a", 1)
            .unwrap()
            .add("b", 2)
            .unwrap()
            .add("c", 3)
            .unwrap();

        assert_eq!(formatter.len(), 3);
        assert_eq!(formatter.format("${a}${b}${c}").unwrap(), "123");
    }

    #[test]
    fn test_names_in_insertion_order() {
        let mut formatter = NamedFormatter::new();
        formatter
            .add("literal", "abc")
            .unwrap()
            .add("number", 1)
            .unwrap()
            .add("other", "x")
            .unwrap();

        let names: Vec<_> = formatter.names().collect();
        assert_eq!(names, vec!["literal", "number", "other"]);

        // IntoIterator mirrors names()
        let via_iter: Vec<_> = (&formatter).into_iter().collect();
        assert_eq!(via_iter, names);
    }

    #[test]
    fn test_blank_and_duplicate_registrations_fail() {
        let mut formatter = NamedFormatter::new();

        for name in ["", " ", "\u{3000}"] {
            let err = formatter.add(name, "v").unwrap_err();
            assert_eq!(err.kind, crate::ErrorKind::BlankName);
        }

        formatter.add("key", "a").unwrap();
        let err = formatter.add("key", "b").unwrap_err();
        assert_eq!(
            err.kind,
            crate::ErrorKind::DuplicateName { name: "key".into() }
        );
    }

    #[cfg(feature = "chrono")]
    #[test]
    fn test_mixed_converters_scenario() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let counter = AtomicUsize::new(0);

        let mut formatter = NamedFormatter::new();
        formatter
            .add("literal", "abc")
            .unwrap()
            .add_formattable("date", date)
            .unwrap()
            .add_formattable_producer("number", move || {
                counter.fetch_add(1, Ordering::Relaxed) + 1
            })
            .unwrap()
            .add_fn("us_date", move |format: Option<&str>| -> crate::Result<Option<String>> {
                Ok(Some(date.format(format.unwrap_or("%F")).to_string()))
            })
            .unwrap();

        assert_eq!(
            formatter
                .format("XYZ_${literal}_${date:%Y%m%d}_${number}_${number:000}_${us_date:%b-%d-%Y}_xyz")
                .unwrap(),
            "XYZ_abc_20240102_1_002_Jan-02-2024_xyz"
        );
    }

    #[test]
    fn test_producer_state_advances_across_calls() {
        let counter = AtomicUsize::new(0);
        let mut formatter = NamedFormatter::new();
        formatter
            .add_formattable_producer("n", move || counter.fetch_add(1, Ordering::Relaxed) + 1)
            .unwrap();

        // The producer runs once per substituted marker
        assert_eq!(formatter.format("${n}_${n:000}").unwrap(), "1_002");
        assert_eq!(formatter.format("${n}_${n:000}").unwrap(), "3_004");
    }

    #[test]
    fn test_converter_errors_propagate() {
        let mut formatter = NamedFormatter::new();
        formatter
            .add_fn("bad", |_format: Option<&str>| -> crate::Result<Option<String>> {
                Err(Error::converter("bad", "backing store offline"))
            })
            .unwrap();

        let err = formatter.format("x${bad}y").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Converter { name: "bad".into() });
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut formatter = NamedFormatter::new().with_key_fold(CaseFold).unwrap();
        formatter.add("Name", "world").unwrap();

        assert_eq!(formatter.format("hello ${NAME}").unwrap(), "hello world");
        assert_eq!(formatter.format("hello ${name}").unwrap(), "hello world");
    }

    #[test]
    fn test_custom_pattern() {
        let mut formatter = NamedFormatter::with_pattern(r"%(?P<name>\w+)%").unwrap();
        formatter.add("user", "amelie").unwrap();

        assert_eq!(formatter.format("hi %user%!").unwrap(), "hi amelie!");
        // The default syntax is plain text under the custom pattern
        assert_eq!(formatter.format("${user}").unwrap(), "${user}");
    }

    #[test]
    fn test_pattern_without_format_group() {
        // A caller-supplied pattern may omit the `format` group entirely;
        // converters then always see None.
        let mut formatter = NamedFormatter::with_pattern(r"<(?P<name>\w+)>").unwrap();
        formatter
            .add_fn("probe", |format: Option<&str>| -> crate::Result<Option<String>> {
                Ok(Some(format!("{:?}", format)))
            })
            .unwrap();

        assert_eq!(formatter.format("<probe>").unwrap(), "None");
    }

    #[test]
    fn test_missing_name_group_at_construction() {
        let err = NamedFormatter::with_pattern(r"^\d{3}-\d{4}$").unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::MissingNameGroup);
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        let mut formatter = NamedFormatter::new();
        formatter
            .add("outer", "${inner}")
            .unwrap()
            .add("inner", "boom")
            .unwrap();

        assert_eq!(formatter.format("${outer}").unwrap(), "${inner}");
    }

    #[test]
    fn test_formatter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NamedFormatter>();
    }

    #[test]
    fn test_concurrent_format_calls() {
        let counter = AtomicUsize::new(0);
        let mut formatter = NamedFormatter::new();
        formatter
            .add_formattable_producer("n", move || counter.fetch_add(1, Ordering::Relaxed) + 1)
            .unwrap();

        let formatter = &formatter;
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(move || {
                    for _ in 0..10 {
                        formatter.format("${n}").unwrap();
                    }
                });
            }
        });

        // 40 concurrent substitutions advanced the shared counter
        assert_eq!(formatter.format("${n}").unwrap(), "41");
    }
}

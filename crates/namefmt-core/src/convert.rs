//! Converters and the ordered converter registry
//!
//! A converter turns a marker's format token into replacement text. The
//! registry maps registration names to boxed converters, preserving
//! insertion order and folding keys through a pluggable [`KeyFold`]
//! strategy.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Trait for converter implementations
///
/// Blanket-implemented for closures, so any
/// `Fn(Option<&str>) -> Result<Option<String>>` can be registered directly.
/// `Ok(None)` produces an empty replacement; errors propagate unchanged out
/// of [`format`](crate::NamedFormatter::format).
pub trait Converter: Send + Sync {
    /// Produce replacement text for the given format token
    fn convert(&self, format: Option<&str>) -> Result<Option<String>>;
}

impl<F> Converter for F
where
    F: Fn(Option<&str>) -> Result<Option<String>> + Send + Sync,
{
    fn convert(&self, format: Option<&str>) -> Result<Option<String>> {
        self(format)
    }
}

/// A value that understands format tokens
///
/// The built-in impls are deterministic and locale-invariant: integers and
/// floats interpret `0`-patterns such as `000` or `0.00` as zero-padded
/// width and precision on top of `std::fmt`, strings ignore the token, and
/// (with the `chrono` feature) date/time values hand the token to chrono's
/// strftime syntax, e.g. `%Y%m%d`. Tokens outside those grammars fall back
/// to the value's default rendering rather than failing.
pub trait Formattable {
    /// Render the value using the given format token, or the default
    /// rendering when no token was supplied
    fn format_with(&self, spec: Option<&str>) -> String;
}

/// Width and precision extracted from a `0`-pattern spec
struct ZeroPad {
    width: usize,
    precision: Option<usize>,
}

/// Parse specs of the shape `0+` or `0+.0+`, e.g. `000` or `00.00`
fn parse_zero_pad(spec: &str) -> Option<ZeroPad> {
    let (int_part, frac_part) = match spec.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (spec, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b == b'0') {
        return None;
    }
    if let Some(f) = frac_part {
        if f.is_empty() || !f.bytes().all(|b| b == b'0') {
            return None;
        }
    }
    Some(ZeroPad {
        width: int_part.len(),
        precision: frac_part.map(str::len),
    })
}

macro_rules! formattable_int {
    ($($t:ty)*) => {$(
        impl Formattable for $t {
            fn format_with(&self, spec: Option<&str>) -> String {
                match spec.and_then(parse_zero_pad) {
                    Some(pad) => format!("{:0width$}", self, width = pad.width),
                    None => self.to_string(),
                }
            }
        }
    )*};
}

formattable_int!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 u128 usize);

macro_rules! formattable_float {
    ($($t:ty)*) => {$(
        impl Formattable for $t {
            fn format_with(&self, spec: Option<&str>) -> String {
                match spec.and_then(parse_zero_pad) {
                    Some(ZeroPad { width, precision: Some(p) }) if width > 1 => {
                        // Total width covers integer digits, the point, and
                        // the fractional digits.
                        format!("{:0w$.p$}", self, w = width + 1 + p, p = p)
                    }
                    Some(ZeroPad { precision: Some(p), .. }) => format!("{:.p$}", self, p = p),
                    Some(ZeroPad { width, .. }) => format!("{:0w$.0}", self, w = width),
                    None => self.to_string(),
                }
            }
        }
    )*};
}

formattable_float!(f32 f64);

impl Formattable for &str {
    fn format_with(&self, _spec: Option<&str>) -> String {
        (*self).to_string()
    }
}

impl Formattable for String {
    fn format_with(&self, _spec: Option<&str>) -> String {
        self.clone()
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use super::Formattable;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

    impl<Tz: TimeZone> Formattable for DateTime<Tz>
    where
        Tz::Offset: std::fmt::Display,
    {
        fn format_with(&self, spec: Option<&str>) -> String {
            match spec {
                Some(s) => self.format(s).to_string(),
                None => self.to_rfc3339(),
            }
        }
    }

    impl Formattable for NaiveDate {
        fn format_with(&self, spec: Option<&str>) -> String {
            match spec {
                Some(s) => self.format(s).to_string(),
                None => self.to_string(),
            }
        }
    }

    impl Formattable for NaiveDateTime {
        fn format_with(&self, spec: Option<&str>) -> String {
            match spec {
                Some(s) => self.format(s).to_string(),
                None => self.to_string(),
            }
        }
    }

    impl Formattable for NaiveTime {
        fn format_with(&self, spec: Option<&str>) -> String {
            match spec {
                Some(s) => self.format(s).to_string(),
                None => self.to_string(),
            }
        }
    }
}

/// Strategy that folds registration and lookup names into canonical keys
///
/// The registry folds every name through its configured strategy before
/// storing or looking it up. The default [`ExactFold`] performs no folding;
/// [`CaseFold`] lower-cases names so lookups are case-insensitive. Callers
/// may supply their own impl for locale-aware folding.
pub trait KeyFold: Send + Sync {
    /// Fold a name into its canonical key form
    fn fold(&self, name: &str) -> String;
}

/// Exact key matching (no folding)
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactFold;

impl KeyFold for ExactFold {
    fn fold(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Case-insensitive key matching via Unicode lowercasing
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFold;

impl KeyFold for CaseFold {
    fn fold(&self, name: &str) -> String {
        name.to_lowercase()
    }
}

struct Entry {
    /// The original (trimmed) registration name, kept for enumeration
    name: String,
    convert: Box<dyn Converter>,
}

/// Insertion-ordered registry of named converters
///
/// Keys are unique under the configured [`KeyFold`]; enumeration yields the
/// original registration names in registration order. The registry grows
/// only through [`insert`](ConverterRegistry::insert) and never shrinks.
pub struct ConverterRegistry {
    /// Entries keyed by folded name
    entries: IndexMap<String, Entry>,
    fold: Box<dyn KeyFold>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// Create an empty registry with exact key matching
    pub fn new() -> Self {
        Self::with_key_fold(ExactFold)
    }

    /// Create an empty registry with the given key-folding strategy
    pub fn with_key_fold(fold: impl KeyFold + 'static) -> Self {
        Self {
            entries: IndexMap::new(),
            fold: Box::new(fold),
        }
    }

    /// Replace the key-folding strategy, re-folding existing entries
    ///
    /// Fails with a duplicate-name error when two registered names collapse
    /// onto the same folded key; the registry is left unchanged in that case.
    pub(crate) fn set_key_fold(&mut self, fold: impl KeyFold + 'static) -> Result<()> {
        let fold: Box<dyn KeyFold> = Box::new(fold);

        let mut keys = Vec::with_capacity(self.entries.len());
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in self.entries.values() {
            let key = fold.fold(&entry.name);
            if !seen.insert(key.clone()) {
                return Err(Error::duplicate_name(&entry.name));
            }
            keys.push(key);
        }

        let old = std::mem::take(&mut self.entries);
        for (key, (_, entry)) in keys.into_iter().zip(old) {
            self.entries.insert(key, entry);
        }
        self.fold = fold;
        Ok(())
    }

    /// Register a converter under `name`
    ///
    /// This is the single validation path all registration forms funnel
    /// into: the name is trimmed, a blank result is rejected, and a name
    /// whose folded key is already present is rejected.
    pub fn insert(&mut self, name: &str, convert: Box<dyn Converter>) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::blank_name());
        }

        let key = self.fold.fold(name);
        if self.entries.contains_key(&key) {
            return Err(Error::duplicate_name(name));
        }

        log::trace!("registering converter '{}'", name);
        self.entries.insert(
            key,
            Entry {
                name: name.to_string(),
                convert,
            },
        );
        Ok(())
    }

    /// Look up the converter registered for `name`
    pub fn get(&self, name: &str) -> Option<&dyn Converter> {
        self.entries
            .get(&self.fold.fold(name))
            .map(|e| e.convert.as_ref())
    }

    /// Whether a converter is registered for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&self.fold.fold(name))
    }

    /// Registered names, in registration order
    pub fn names(&self) -> Names<'_> {
        Names {
            inner: self.entries.values(),
        }
    }

    /// Number of registered converters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Iterator over registered names, in registration order
pub struct Names<'a> {
    inner: indexmap::map::Values<'a, String, Entry>,
}

impl<'a> Iterator for Names<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| e.name.as_str())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Names<'_> {}

//! namefmt-core: named-placeholder template formatting
//!
//! This crate scans input text for `${name}` / `${name:format}` markers and
//! replaces each one with the output of a caller-registered converter.
//! Unregistered markers pass through unchanged, so templates can be
//! formatted in stages.
//!
//! # Example
//!
//! ```rust
//! use namefmt_core::NamedFormatter;
//!
//! let mut formatter = NamedFormatter::new();
//! formatter.add("name", "world").unwrap();
//!
//! assert_eq!(formatter.format("hello ${name}").unwrap(), "hello world");
//! assert_eq!(formatter.format("hello ${planet}").unwrap(), "hello ${planet}");
//! ```

pub mod convert;
pub mod error;
pub mod pattern;

mod formatter;

pub use convert::{CaseFold, Converter, ConverterRegistry, ExactFold, Formattable, KeyFold, Names};
pub use error::{Error, ErrorKind, Result};
pub use formatter::NamedFormatter;
pub use pattern::{Marker, Pattern, DEFAULT_PATTERN};

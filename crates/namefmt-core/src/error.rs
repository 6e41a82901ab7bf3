//! Error types for namefmt
//!
//! Errors carry a kind, an optional underlying cause, and an actionable
//! help message. Construction and registration errors are raised before
//! any partial work occurs.

use std::fmt;

/// Result type alias for namefmt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for namefmt operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The marker pattern failed to compile
    PatternSyntax,
    /// The marker pattern does not define a `name` capture group
    MissingNameGroup,
    /// A registration name was empty or whitespace-only after trimming
    BlankName,
    /// A name was registered more than once
    DuplicateName { name: String },
    /// A converter reported a failure during substitution
    Converter { name: String },
}

impl Error {
    /// Create a pattern compilation error
    pub fn pattern_syntax(cause: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::PatternSyntax,
            cause: Some(cause.into()),
            help: Some("Check the marker pattern's regular expression syntax".into()),
        }
    }

    /// Create a missing `name` capture group error
    pub fn missing_name_group() -> Self {
        Self {
            kind: ErrorKind::MissingNameGroup,
            cause: None,
            help: Some(
                "The marker pattern must define a capture group called 'name', \
                 e.g. (?P<name>\\w+)"
                    .into(),
            ),
        }
    }

    /// Create a blank registration name error
    pub fn blank_name() -> Self {
        Self {
            kind: ErrorKind::BlankName,
            cause: None,
            help: Some(
                "Registration names must contain at least one non-whitespace character".into(),
            ),
        }
    }

    /// Create a duplicate registration error
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            kind: ErrorKind::DuplicateName { name: n.clone() },
            cause: None,
            help: Some(format!(
                "Each name can be registered once; pick a name other than '{}'",
                n
            )),
        }
    }

    /// Create a converter failure, for use inside converter closures
    pub fn converter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Converter { name: name.into() },
            cause: Some(message.into()),
            help: None,
        }
    }

    /// Add a help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::PatternSyntax => write!(f, "Invalid marker pattern")?,
            ErrorKind::MissingNameGroup => {
                write!(f, "Marker pattern has no 'name' capture group")?
            }
            ErrorKind::BlankName => write!(f, "Registration name is blank")?,
            ErrorKind::DuplicateName { name } => {
                write!(f, "Name '{}' is already registered", name)?
            }
            ErrorKind::Converter { name } => write!(f, "Converter '{}' failed", name)?,
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

//! Error and diagnostic types
//!
//! Three tiers:
//! - [`SourceError`]: the header text is malformed. Reported with file and
//!   line, fatal for the run.
//! - [`Warning`]: a naming convention is violated. Reported, never fatal.
//! - [`ResolveError::Internal`]: the resolver met a graph that a correct
//!   parser cannot produce. A tool defect, reported with its own exit code.

use crate::config::ConfigError;
use crate::metadata::SourceLocation;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {kind}")]
pub struct SourceError {
    pub location: SourceLocation,
    pub kind: SourceErrorKind,
}

impl SourceError {
    pub fn new(location: SourceLocation, kind: SourceErrorKind) -> Self {
        Self { location, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceErrorKind {
    #[error("expected {expected}, found '{found}'")]
    UnexpectedToken { expected: String, found: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("malformed `deprecated` attribute")]
    MalformedDeprecation,

    #[error("subscript operator of '{owner}' should return a reference so that the value is modifiable")]
    SubscriptWithoutReference { owner: String },

    #[error("unsupported operator 'operator{symbol}'")]
    UnsupportedOperator { symbol: String },

    #[error("interface '{name}' must not contain fields")]
    InterfaceHasFields { name: String },

    #[error("interface '{name}' must not define a constructor")]
    InterfaceHasConstructor { name: String },

    #[error("interface '{name}' must define a virtual destructor")]
    InterfaceMissingDestructor { name: String },

    #[error("interface '{name}' must define exactly one destructor")]
    InterfaceMultipleDestructors { name: String },

    #[error("interface '{name}' destructor must be virtual")]
    InterfaceDestructorNotVirtual { name: String },

    #[error("interface '{name}' must be pure virtual, '{method}' is not")]
    InterfaceNotPureVirtual { name: String, method: String },

    #[error("interface '{name}' may only inherit from other interfaces, '{base}' is not one")]
    InterfaceNonInterfaceBase { name: String, base: String },

    #[error("class '{name}' inherits from classes '{first}' and '{second}'; all other bases must be interfaces")]
    MultipleBaseClasses {
        name: String,
        first: String,
        second: String,
    },

    #[error("{0} is not supported")]
    Unsupported(String),

    #[error("unmatched '}}'")]
    UnmatchedBrace,

    #[error("namespace '{0}' is never closed")]
    UnclosedNamespace(String),

    #[error("'{name}' is already declared at {previous}")]
    DuplicateDeclaration {
        name: String,
        previous: SourceLocation,
    },

    #[error("'{name}' is used as a template but no template of that name is declared")]
    UndeclaredTemplate { name: String },

    #[error("template '{name}' takes {expected} argument(s) but {found} were given")]
    TemplateArity {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Non-fatal convention violation. The declaration is still emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub location: SourceLocation,
    pub message: String,
}

impl Warning {
    pub fn new(location: SourceLocation, message: impl Into<String>) -> Self {
        let warning = Self {
            location,
            message: message.into(),
        };
        tracing::warn!(location = %warning.location, "{}", warning.message);
        warning
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: warning: {}", self.location, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("internal resolver error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{} source error(s)", .0.len())]
    Source(Vec<SourceError>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Process exit status: 1 for malformed headers, 2 for unreadable input
    /// or configuration, 70 for tool defects.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Source(_) => 1,
            Error::Io { .. } | Error::Config(_) => 2,
            Error::Internal(_) => 70,
        }
    }
}

impl From<ResolveError> for Error {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::Source(e) => Error::Source(vec![e]),
            ResolveError::Internal(message) => Error::Internal(message),
        }
    }
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Source(vec![err])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display_has_file_and_line() {
        let err = SourceError::new(
            SourceLocation::new("api/Widget.h", 12),
            SourceErrorKind::InterfaceHasFields {
                name: "IWidget".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "api/Widget.h:12: interface 'IWidget' must not contain fields"
        );
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let source = Error::from(ResolveError::Source(SourceError::new(
            SourceLocation::default(),
            SourceErrorKind::UnmatchedBrace,
        )));
        let internal = Error::from(ResolveError::Internal("missing template".to_string()));
        let io = Error::Io {
            path: PathBuf::from("x.h"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };

        assert_eq!(source.exit_code(), 1);
        assert_eq!(io.exit_code(), 2);
        assert_eq!(internal.exit_code(), 70);
    }
}

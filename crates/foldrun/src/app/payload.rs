//! Annotated payload construction.

use std::fmt;

use crate::domain::model::SourceLocation;

/// Execution text prefixed with a source-location comment line.
///
/// The layout is exactly `{prefix}{path}:{line}\n{code}`; the code text is
/// never transformed. Consoles that understand the convention can map the
/// executed text back to its originating file and line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedPayload {
    text: String,
}

impl AnnotatedPayload {
    /// Comment prefix used when configuration does not override it.
    pub const DEFAULT_PREFIX: &'static str = "#";

    /// Annotate `code` with its origin using the default `#` prefix.
    pub fn new(location: &SourceLocation, code: &str) -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX, location, code)
    }

    /// Annotate `code` with its origin using a custom comment prefix.
    pub fn with_prefix(prefix: &str, location: &SourceLocation, code: &str) -> Self {
        Self {
            text: format!(
                "{prefix}{}:{}\n{code}",
                location.path.display(),
                location.line
            ),
        }
    }

    /// Wrap text that should be dispatched as-is, without an origin line.
    pub fn raw(code: impl Into<String>) -> Self {
        Self { text: code.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for AnnotatedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

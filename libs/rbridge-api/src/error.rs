use std::fmt;

/// Category of an error raised by the host relational engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The type identifier is not known to the catalog.
    UnknownType,
    /// A type input function rejected its text.
    InvalidInput,
    /// The type exists but the requested operation is not available for it.
    Unsupported,
    /// The row-set sink refused an operation (wrong state, wrong row width).
    Sink,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::UnknownType => f.write_str("unknown type"),
            ErrorKind::InvalidInput => f.write_str("invalid input"),
            ErrorKind::Unsupported => f.write_str("unsupported"),
            ErrorKind::Sink => f.write_str("row-set sink"),
        }
    }
}

/// Error returned by host collaborators: the catalog, type I/O functions
/// and the row-set sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    kind: ErrorKind,
    message: String,
}

impl HostError {
    pub fn unknown_type(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::UnknownType, message: msg.into() }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::InvalidInput, message: msg.into() }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Unsupported, message: msg.into() }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Sink, message: msg.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for HostError {}

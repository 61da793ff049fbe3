use rbridge_api::error::{ErrorKind, HostError};
use rbridge_api::runtime::SetError;

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("{context}: {ndims}-dimensional arrays are not supported (at most 3)")]
    UnsupportedDimensionality { context: &'static str, ndims: usize },

    #[error("query-expected row shape and produced value are not compatible: {0}")]
    ShapeMismatch(String),

    #[error("cannot build array with missing elements (element {index})")]
    MissingElementInArrayResult { index: usize },

    #[error("materialization not permitted in this context: {0}")]
    MaterializationNotPermitted(String),

    #[error("malformed element: {0}")]
    MalformedElement(String),

    #[error("bad internal representation: {0}")]
    BadInternalRepresentation(String),

    #[error("catalog error: {0}")]
    Catalog(HostError),

    #[error("row-set sink error: {0}")]
    Sink(HostError),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConversionError {
    /// Add context to the error.
    ///
    /// For `Catalog` and `Sink`, context is added to the inner `HostError`.
    /// For message-carrying variants, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            ConversionError::Catalog(e) => ConversionError::Catalog(e.with_context(ctx)),
            ConversionError::Sink(e) => ConversionError::Sink(e.with_context(ctx)),
            ConversionError::ShapeMismatch(msg) => ConversionError::ShapeMismatch(format!("{ctx}: {msg}")),
            ConversionError::MalformedElement(msg) => {
                ConversionError::MalformedElement(format!("{ctx}: {msg}"))
            }
            ConversionError::BadInternalRepresentation(msg) => {
                ConversionError::BadInternalRepresentation(format!("{ctx}: {msg}"))
            }
            ConversionError::Config(msg) => ConversionError::Config(format!("{ctx}: {msg}")),
            other => other,
        }
    }
}

// A type input function rejecting its text is an element encoding failure.
impl From<HostError> for ConversionError {
    fn from(e: HostError) -> Self {
        match e.kind() {
            ErrorKind::InvalidInput => ConversionError::MalformedElement(e.message().to_string()),
            ErrorKind::Sink => ConversionError::Sink(e),
            _ => ConversionError::Catalog(e),
        }
    }
}

impl From<SetError> for ConversionError {
    fn from(e: SetError) -> Self {
        ConversionError::BadInternalRepresentation(e.to_string())
    }
}

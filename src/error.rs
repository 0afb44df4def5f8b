//! Custom error types for arxiv-reporter.
//!
//! Every failure the reporter can hit is a variant of [`ArxivError`]. Callers that
//! only care about the broad category ask for [`ArxivError::kind`].

use std::fmt;
use thiserror::Error;

/// Broad failure category used by the reporter to pick its user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The endpoint could not be reached or answered with an error status
    Connection,
    /// The response body is not well-formed XML
    Parse,
    /// Anything else: missing fields, bad input, output failures
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Connection => "connection",
            FailureKind::Parse => "parse",
            FailureKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// Main error type for arxiv-reporter operations.
#[derive(Debug, Error)]
pub enum ArxivError {
    /// Transport failure while sending the request or reading the body
    #[error("{}", describe_transport(.0))]
    Connection(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{reason}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Canonical reason phrase for the status
        reason: String,
    },

    /// Response body is not well-formed XML
    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),

    /// An entry lacks an element the report needs
    #[error("entry {entry}: missing {field}")]
    MissingField {
        /// 1-based position of the entry in the feed
        entry: usize,
        /// Name of the missing element or attribute
        field: &'static str,
    },

    /// The `published` timestamp does not start with a calendar date
    #[error("entry {entry}: invalid published date '{value}'")]
    InvalidDate {
        /// 1-based position of the entry in the feed
        entry: usize,
        /// Raw text that failed to parse
        value: String,
    },

    /// arXiv returned its error feed instead of results
    #[error("arXiv API error: {0}")]
    Api(String),

    /// Invalid query input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid client configuration
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ArxivError {
    /// Failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ArxivError::Connection(_) | ArxivError::Status { .. } => FailureKind::Connection,
            ArxivError::Parse(_) => FailureKind::Parse,
            _ => FailureKind::Unexpected,
        }
    }
}

/// Innermost cause of a transport failure, e.g. `Connection refused (os error 111)`.
/// reqwest's outer layers only repeat the request URL and the client stage.
fn describe_transport(err: &reqwest::Error) -> String {
    let mut root: &dyn std::error::Error = err;
    while let Some(cause) = root.source() {
        root = cause;
    }
    root.to_string()
}

/// Result type alias using `ArxivError`
pub type Result<T> = std::result::Result<T, ArxivError>;

/// Extension trait for turning absent feed elements into errors
pub trait OptionExt<T> {
    /// Convert `None` into [`ArxivError::MissingField`] for the given entry
    fn ok_or_missing(self, entry: usize, field: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_missing(self, entry: usize, field: &'static str) -> Result<T> {
        self.ok_or(ArxivError::MissingField { entry, field })
    }
}

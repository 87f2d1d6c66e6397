//! Fatal parse error type
//!
//! Contains the `ParseError` enum representing failures that abort the current
//! parse call. Grammar violations that can be recovered from are never
//! represented here; they travel through the reporter as `ValidationIssue`s.

use thiserror::Error;

/// Unrecoverable parse failure
///
/// Callers must treat any of these as "no usable document for this input".
///
/// # Error Categories
///
/// - **Source errors**: I/O failures, bytes that cannot be decoded
/// - **Timing errors**: SAMI synchronization markers that cannot be interpreted
/// - **Construction errors**: time values outside the representable range
/// - **Selection errors**: file extensions that map to no dialect
#[derive(Debug, Error)]
pub enum ParseError {
    /// Reading from the underlying source failed
    #[error("I/O error while reading subtitle source: {0}")]
    Io(#[from] std::io::Error),

    /// Line bytes are not valid in the configured text encoding
    #[error("Line {line} is not valid {encoding}")]
    Encoding {
        /// Line number (1-based) of the undecodable line
        line: usize,
        /// Name of the configured encoding
        encoding: &'static str,
    },

    /// A tag-delimited timing marker could not be interpreted at all
    #[error("Malformed timing marker at line {line}: {reason}")]
    MalformedTiming {
        /// Line number (1-based) of the marker
        line: usize,
        /// What was wrong with the marker
        reason: String,
    },

    /// A time value resolved to a negative millisecond count
    #[error("Invalid time range: {millis}ms is negative")]
    InvalidTimeRange {
        /// The offending millisecond value
        millis: i64,
    },

    /// No dialect is registered for the file extension
    #[error("Unsupported subtitle extension '{0}'")]
    UnsupportedExtension(String),
}

impl ParseError {
    /// Line number associated with the error, when there is one
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Encoding { line, .. } | Self::MalformedTiming { line, .. } => Some(*line),
            Self::Io(_) | Self::InvalidTimeRange { .. } | Self::UnsupportedExtension(_) => None,
        }
    }
}

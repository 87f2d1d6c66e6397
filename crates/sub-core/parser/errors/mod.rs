//! Parser error types for subtitle parsing
//!
//! # Error Philosophy
//!
//! - Prefer recovery over failure: grammar violations become issues
//! - Only source, encoding and uninterpretable timing markers are fatal
//! - Every issue carries the best-effort position at detection time
//!
//! # Module Organization
//!
//! - `parse_error` - Unrecoverable parsing errors
//! - `parse_issue` - Recoverable issues and their classification

pub mod parse_error;
pub mod parse_issue;

pub use parse_error::ParseError;
pub use parse_issue::{IssueCategory, IssueKind, IssueSeverity, Position, ValidationIssue};

/// Result type for operations that can fail fatally
pub type ParseResult<T> = Result<T, ParseError>;

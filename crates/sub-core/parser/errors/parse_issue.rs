//! Validation issue types for recoverable parsing problems
//!
//! Contains the value types delivered to validation listeners: severity,
//! the rule that fired, the message and the source position at the moment the
//! rule fired. Issues never interrupt parsing.

use core::fmt;

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IssueSeverity {
    /// Information that may be useful but doesn't affect the result
    Info,

    /// Non-standard input that was accepted as written
    Warning,

    /// Grammar violation that was repaired during parsing
    Error,
}

impl IssueSeverity {
    /// Lower the severity by one step, saturating at `Info`
    #[must_use]
    pub const fn downgrade(self) -> Self {
        match self {
            Self::Error => Self::Warning,
            Self::Warning | Self::Info => Self::Info,
        }
    }
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Issue categories for filtering and editor integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IssueCategory {
    /// Document and cue boundary structure
    Structure,

    /// Timecodes and cue timing
    Timing,

    /// Inline cue-text tags and entities
    Markup,

    /// Embedded style rules
    Style,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Timing => write!(f, "timing"),
            Self::Markup => write!(f, "markup"),
            Self::Style => write!(f, "style"),
        }
    }
}

/// The rule that produced an issue
///
/// Closed set so that strictness tables and tests can match on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IssueKind {
    /// Cue label line is not an integer
    InvalidLabel,
    /// Timing line does not match `<time> --> <time>`
    InvalidTiming,
    /// A single timecode field could not be interpreted
    InvalidTimecode,
    /// Cue ends before it starts
    NegativeDuration,
    /// Cue end was clamped to the maximum duration
    DurationClamped,
    /// Line appeared where the boundary state machine expected something else
    UnexpectedLine,
    /// Required document signature is missing
    MissingHeader,
    /// Cue setting is not of the form `key:value`
    InvalidCueSetting,
    /// Tag name is not in the dialect's tag table
    UnknownTag,
    /// Tag requires an annotation but has none
    MissingAnnotation,
    /// Tag carries an annotation it does not accept
    UnexpectedAnnotation,
    /// Ruby text outside a ruby container
    MisplacedRubyText,
    /// Start tag was never closed
    UnclosedTag,
    /// Close tag without `>` or without a matching start tag
    DisclosedTag,
    /// Bare `>` outside any tag
    StrayCloseBracket,
    /// Start tag body without a terminating `>`
    MalformedTag,
    /// Entity name is not recognized
    UnknownEntity,
    /// Entity is missing its terminating `;`
    UnterminatedEntity,
    /// Inline timestamp where the dialect does not allow one
    UnsupportedTimestamp,
    /// Element nesting exceeded the configured depth
    NestingTooDeep,
    /// Style block does not follow the selector/declaration grammar
    InvalidStyle,
}

impl IssueKind {
    /// Category the rule belongs to
    #[must_use]
    pub const fn category(self) -> IssueCategory {
        match self {
            Self::InvalidLabel
            | Self::UnexpectedLine
            | Self::MissingHeader
            | Self::InvalidCueSetting => IssueCategory::Structure,
            Self::InvalidTiming
            | Self::InvalidTimecode
            | Self::NegativeDuration
            | Self::DurationClamped => IssueCategory::Timing,
            Self::UnknownTag
            | Self::MissingAnnotation
            | Self::UnexpectedAnnotation
            | Self::MisplacedRubyText
            | Self::UnclosedTag
            | Self::DisclosedTag
            | Self::StrayCloseBracket
            | Self::MalformedTag
            | Self::UnknownEntity
            | Self::UnterminatedEntity
            | Self::UnsupportedTimestamp
            | Self::NestingTooDeep => IssueCategory::Markup,
            Self::InvalidStyle => IssueCategory::Style,
        }
    }
}

/// Line/column location in the source
///
/// Both values are 0 when no position provider was bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Line number (1-based once reading has started)
    pub line: usize,
    /// Column of the last delivered character
    pub column: usize,
}

impl Position {
    /// Create a position
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single grammar or semantic deviation
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationIssue {
    /// Issue severity level
    pub severity: IssueSeverity,

    /// Rule that fired
    pub kind: IssueKind,

    /// Human-readable message
    pub message: String,

    /// Source position when the rule fired
    pub position: Position,
}

impl ValidationIssue {
    /// Create new issue
    #[must_use]
    pub const fn new(
        severity: IssueSeverity,
        kind: IssueKind,
        message: String,
        position: Position,
    ) -> Self {
        Self {
            severity,
            kind,
            message,
            position,
        }
    }

    /// Category of the rule that fired
    #[must_use]
    pub const fn category(&self) -> IssueCategory {
        self.kind.category()
    }

    /// Check if this is an error-level issue
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, IssueSeverity::Error)
    }

    /// Format issue for display in editor or console
    #[must_use]
    pub fn format_for_display(&self) -> String {
        format!(
            "[{}:{}] {}: {}",
            self.position,
            self.category(),
            self.severity,
            self.message
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_for_display())
    }
}

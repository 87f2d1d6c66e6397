//! Diagnostic fan-out to validation listeners
//!
//! A [`DiagnosticReporter`] is built for one parse session. Listeners are
//! registered before parsing starts; during the parse the scanner and the
//! markup and style parsers share the reporter by reference and every issue
//! is delivered synchronously, in registration order, stamped with the
//! position read from the bound [`PositionCursor`].
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//! use sub_core::parser::{DiagnosticReporter, IssueCollector, IssueKind};
//!
//! let collector = Rc::new(IssueCollector::new());
//! let mut reporter = DiagnosticReporter::new();
//! reporter.add_listener(collector.clone());
//!
//! reporter.warn(IssueKind::UnknownTag, "Unknown tag <blink>");
//! assert_eq!(collector.len(), 1);
//! ```

use core::fmt;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use ahash::RandomState;

use super::errors::{IssueKind, IssueSeverity, Position, ValidationIssue};
use super::source::PositionCursor;
use crate::utils::hashers::create_hash_map;

/// Receiver of validation issues
///
/// Called synchronously for every issue. Implementations use interior
/// mutability to record what they receive.
pub trait ValidationListener {
    /// Handle one issue
    fn on_issue(&self, issue: &ValidationIssue);
}

/// What non-strict mode does with an issue kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LenientAction {
    /// Deliver unchanged
    Keep,
    /// Deliver one severity step lower
    Downgrade,
    /// Do not deliver
    Suppress,
}

/// Issue-kind to lenient-action mapping used when parsing non-strictly
///
/// Kinds without an entry are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrictnessTable {
    /// Configured actions
    actions: HashMap<IssueKind, LenientAction, RandomState>,
}

impl StrictnessTable {
    /// Table that keeps every issue kind
    #[must_use]
    pub fn empty() -> Self {
        Self {
            actions: create_hash_map(),
        }
    }

    /// Set the action for one kind
    #[must_use]
    pub fn with(mut self, kind: IssueKind, action: LenientAction) -> Self {
        self.set(kind, action);
        self
    }

    /// Set the action for one kind in place
    pub fn set(&mut self, kind: IssueKind, action: LenientAction) {
        self.actions.insert(kind, action);
    }

    /// Action for a kind
    #[must_use]
    pub fn action(&self, kind: IssueKind) -> LenientAction {
        self.actions
            .get(&kind)
            .copied()
            .unwrap_or(LenientAction::Keep)
    }
}

impl Default for StrictnessTable {
    fn default() -> Self {
        Self::empty()
            .with(IssueKind::UnknownTag, LenientAction::Suppress)
            .with(IssueKind::UnexpectedAnnotation, LenientAction::Suppress)
            .with(IssueKind::UnsupportedTimestamp, LenientAction::Suppress)
            .with(IssueKind::StrayCloseBracket, LenientAction::Suppress)
            .with(IssueKind::UnknownEntity, LenientAction::Downgrade)
            .with(IssueKind::UnterminatedEntity, LenientAction::Downgrade)
            .with(IssueKind::MissingAnnotation, LenientAction::Downgrade)
            .with(IssueKind::MisplacedRubyText, LenientAction::Downgrade)
            .with(IssueKind::UnclosedTag, LenientAction::Downgrade)
    }
}

/// Per-session issue reporter
pub struct DiagnosticReporter {
    /// Registered listeners, in registration order
    listeners: Vec<Rc<dyn ValidationListener>>,
    /// Position provider, if bound
    cursor: Option<PositionCursor>,
    /// Strict mode delivers every issue unchanged
    strict: bool,
    /// Lenient-mode adjustments
    strictness: StrictnessTable,
}

impl DiagnosticReporter {
    /// Create a strict reporter with no listeners and no position provider
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            cursor: None,
            strict: true,
            strictness: StrictnessTable::default(),
        }
    }

    /// Register a listener
    ///
    /// Listeners are not deduplicated; registering twice delivers twice.
    pub fn add_listener(&mut self, listener: Rc<dyn ValidationListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Bind the position provider used to stamp issues
    pub fn bind(&mut self, cursor: PositionCursor) {
        self.cursor = Some(cursor);
    }

    /// Select strict or lenient delivery
    pub fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Replace the lenient-mode table
    pub fn set_strictness(&mut self, table: StrictnessTable) {
        self.strictness = table;
    }

    /// Whether issues are delivered unchanged
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Current position, `{0, 0}` when unbound
    #[must_use]
    pub fn position(&self) -> Position {
        self.cursor
            .as_ref()
            .map_or_else(Position::default, PositionCursor::get)
    }

    /// Report an informational issue
    pub fn info(&self, kind: IssueKind, message: impl Into<String>) {
        self.report(IssueSeverity::Info, kind, message);
    }

    /// Report a warning
    pub fn warn(&self, kind: IssueKind, message: impl Into<String>) {
        self.report(IssueSeverity::Warning, kind, message);
    }

    /// Report an error
    pub fn error(&self, kind: IssueKind, message: impl Into<String>) {
        self.report(IssueSeverity::Error, kind, message);
    }

    /// Report an issue with explicit severity
    pub fn report(&self, severity: IssueSeverity, kind: IssueKind, message: impl Into<String>) {
        self.report_at(severity, kind, message, self.position());
    }

    /// Report an issue stamped with `position` instead of the cursor's
    pub fn report_at(
        &self,
        severity: IssueSeverity,
        kind: IssueKind,
        message: impl Into<String>,
        position: Position,
    ) {
        let severity = if self.strict {
            severity
        } else {
            match self.strictness.action(kind) {
                LenientAction::Keep => severity,
                LenientAction::Downgrade => severity.downgrade(),
                LenientAction::Suppress => return,
            }
        };

        let issue = ValidationIssue::new(severity, kind, message.into(), position);
        log::trace!("{issue}");

        for listener in &self.listeners {
            listener.on_issue(&issue);
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DiagnosticReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticReporter")
            .field("listeners", &self.listeners.len())
            .field("position", &self.position())
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// Listener that keeps every issue it receives
#[derive(Debug, Default)]
pub struct IssueCollector {
    /// Issues in delivery order
    issues: RefCell<Vec<ValidationIssue>>,
}

impl IssueCollector {
    /// Create new empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected issues
    #[must_use]
    pub fn issues(&self) -> Vec<ValidationIssue> {
        self.issues.borrow().clone()
    }

    /// Take all issues, leaving the collector empty
    ///
    /// Issues are handed out once; a second call only sees issues reported
    /// after the first.
    #[must_use]
    pub fn take_issues(&self) -> Vec<ValidationIssue> {
        core::mem::take(&mut *self.issues.borrow_mut())
    }

    /// Number of collected issues
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.borrow().len()
    }

    /// Check if nothing was collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.borrow().is_empty()
    }

    /// Check if any error-level issue was collected
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.issues.borrow().iter().any(ValidationIssue::is_error)
    }

    /// Number of collected issues of one kind
    #[must_use]
    pub fn count_kind(&self, kind: IssueKind) -> usize {
        self.issues
            .borrow()
            .iter()
            .filter(|issue| issue.kind == kind)
            .count()
    }
}

impl ValidationListener for IssueCollector {
    fn on_issue(&self, issue: &ValidationIssue) {
        self.issues.borrow_mut().push(issue.clone());
    }
}

/// Listener that only counts issues per severity
#[derive(Debug, Default)]
pub struct IssueCounter {
    /// Info-level count
    infos: Cell<usize>,
    /// Warning-level count
    warnings: Cell<usize>,
    /// Error-level count
    errors: Cell<usize>,
}

impl IssueCounter {
    /// Create counter at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count for one severity
    #[must_use]
    pub fn count(&self, severity: IssueSeverity) -> usize {
        match severity {
            IssueSeverity::Info => self.infos.get(),
            IssueSeverity::Warning => self.warnings.get(),
            IssueSeverity::Error => self.errors.get(),
        }
    }

    /// Count across all severities
    #[must_use]
    pub fn total(&self) -> usize {
        self.infos.get() + self.warnings.get() + self.errors.get()
    }
}

impl ValidationListener for IssueCounter {
    fn on_issue(&self, issue: &ValidationIssue) {
        let cell = match issue.severity {
            IssueSeverity::Info => &self.infos,
            IssueSeverity::Warning => &self.warnings,
            IssueSeverity::Error => &self.errors,
        };
        cell.set(cell.get() + 1);
    }
}

/// Listener that forwards issues to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl ValidationListener for LogListener {
    fn on_issue(&self, issue: &ValidationIssue) {
        let level = match issue.severity {
            IssueSeverity::Info => log::Level::Info,
            IssueSeverity::Warning => log::Level::Warn,
            IssueSeverity::Error => log::Level::Error,
        };
        log::log!(target: "sub_core::validation", level, "{issue}");
    }
}

//! Per-dialect tag tables for the markup tree parser
//!
//! A [`MarkupProfile`] says which inline tags a dialect recognizes, what each
//! tag expects after its name, where it may appear, and whether inline
//! timestamps are allowed. The shared parser only consults the profile.

use std::collections::HashMap;
use std::sync::OnceLock;

use ahash::RandomState;

use crate::utils::hashers::create_hash_map;
use crate::Dialect;

/// What a tag accepts after its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationRule {
    /// Nothing may follow the name and classes
    Forbidden,
    /// Attributes or an annotation may follow
    Optional,
    /// A non-empty annotation must follow
    Required,
}

/// Rule for one recognized tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRule {
    /// Annotation requirement
    pub annotation: AnnotationRule,
    /// Tag the element must be a direct child of, if constrained
    pub parent: Option<&'static str>,
}

impl TagRule {
    /// Tag with no annotation and no placement constraint
    pub const PLAIN: Self = Self {
        annotation: AnnotationRule::Forbidden,
        parent: None,
    };

    /// Tag taking optional attributes
    pub const ATTRIBUTED: Self = Self {
        annotation: AnnotationRule::Optional,
        parent: None,
    };

    /// Tag requiring an annotation
    pub const ANNOTATED: Self = Self {
        annotation: AnnotationRule::Required,
        parent: None,
    };

    /// Tag allowed only directly inside `parent`
    #[must_use]
    pub const fn child_of(parent: &'static str) -> Self {
        Self {
            annotation: AnnotationRule::Forbidden,
            parent: Some(parent),
        }
    }
}

/// Immutable tag table for one dialect
#[derive(Debug, Clone)]
pub struct MarkupProfile {
    /// Recognized tags by (normalized) name
    tags: HashMap<&'static str, TagRule, RandomState>,
    /// Inline `<hh:mm:ss.mmm>` timestamps are allowed
    timestamps: bool,
    /// Tag names are matched exactly rather than ASCII-case-insensitively
    case_sensitive: bool,
    /// Named entities also match in any ASCII case
    entities_ignore_case: bool,
}

impl MarkupProfile {
    /// Create an empty profile
    #[must_use]
    pub fn new(case_sensitive: bool) -> Self {
        Self {
            tags: create_hash_map(),
            timestamps: false,
            case_sensitive,
            entities_ignore_case: false,
        }
    }

    /// Add a recognized tag
    #[must_use]
    pub fn with_tag(mut self, name: &'static str, rule: TagRule) -> Self {
        self.tags.insert(name, rule);
        self
    }

    /// Allow inline timestamps
    #[must_use]
    pub const fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    /// Match named entities regardless of ASCII case
    #[must_use]
    pub const fn with_case_insensitive_entities(mut self) -> Self {
        self.entities_ignore_case = true;
        self
    }

    /// SubRip: basic formatting plus `font`
    #[must_use]
    pub fn srt() -> Self {
        Self::new(false)
            .with_tag("b", TagRule::PLAIN)
            .with_tag("i", TagRule::PLAIN)
            .with_tag("u", TagRule::PLAIN)
            .with_tag("s", TagRule::PLAIN)
            .with_tag("font", TagRule::ATTRIBUTED)
    }

    /// SAMI: basic formatting plus `font` and `span`, HTML-style entities
    #[must_use]
    pub fn sami() -> Self {
        Self::srt()
            .with_tag("span", TagRule::ATTRIBUTED)
            .with_case_insensitive_entities()
    }

    /// WebVTT cue text tags and timestamps
    #[must_use]
    pub fn webvtt() -> Self {
        Self::new(true)
            .with_tag("b", TagRule::PLAIN)
            .with_tag("i", TagRule::PLAIN)
            .with_tag("u", TagRule::PLAIN)
            .with_tag("c", TagRule::PLAIN)
            .with_tag("v", TagRule::ANNOTATED)
            .with_tag("lang", TagRule::ANNOTATED)
            .with_tag("ruby", TagRule::PLAIN)
            .with_tag("rt", TagRule::child_of("ruby"))
            .with_timestamps()
    }

    /// Shared profile for a dialect
    #[must_use]
    pub fn for_dialect(dialect: Dialect) -> &'static Self {
        static SRT: OnceLock<MarkupProfile> = OnceLock::new();
        static SAMI: OnceLock<MarkupProfile> = OnceLock::new();
        static WEBVTT: OnceLock<MarkupProfile> = OnceLock::new();

        match dialect {
            Dialect::Srt => SRT.get_or_init(Self::srt),
            Dialect::Sami => SAMI.get_or_init(Self::sami),
            Dialect::WebVtt => WEBVTT.get_or_init(Self::webvtt),
        }
    }

    /// Normalize a tag name for lookup and close-tag matching
    #[must_use]
    pub fn normalize(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        }
    }

    /// Rule for a normalized tag name
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&TagRule> {
        self.tags.get(name)
    }

    /// Whether inline timestamps are allowed
    #[must_use]
    pub const fn supports_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Whether named entities match in any ASCII case
    #[must_use]
    pub const fn entities_ignore_case(&self) -> bool {
        self.entities_ignore_case
    }
}

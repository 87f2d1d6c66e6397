//! Format-neutral subtitle document model
//!
//! One [`Document`] is produced per parse call. It is filled in during the
//! single parse pass and only read afterwards. Extras that only one dialect
//! has (WebVTT style rules and regions) live in side tables on the document
//! instead of in per-dialect document types.

mod cue;

pub use cue::{
    Cue, InlineTimestamp, Line, StyleProperties, TagAnnotation, TextFormatting, TextSpan,
};

use std::collections::BTreeMap;

use crate::style::StyleRule;
use crate::Dialect;

/// Document-level properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Property {
    /// Document title
    Title,
    /// Free-form description
    Description,
    /// Copyright notice
    Copyright,
    /// Primary language
    Language,
    /// Text following the WebVTT signature
    Header,
}

/// A WebVTT region definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Region {
    /// Settings in source order
    settings: Vec<(String, String)>,
}

impl Region {
    /// Create a region from its settings
    #[must_use]
    pub const fn new(settings: Vec<(String, String)>) -> Self {
        Self { settings }
    }

    /// Region identifier from its `id` setting
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.setting("id")
    }

    /// Look up a setting by key
    #[must_use]
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Settings in source order
    #[must_use]
    pub fn settings(&self) -> &[(String, String)] {
        &self.settings
    }
}

/// Parsed subtitle document
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    /// Dialect the document was parsed as
    dialect: Dialect,
    /// Document-level properties
    properties: BTreeMap<Property, String>,
    /// Cues in document order
    cues: Vec<Cue>,
    /// Style rules from header style blocks
    style_rules: Vec<StyleRule>,
    /// Region definitions
    regions: Vec<Region>,
}

impl Document {
    /// Create an empty document
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            properties: BTreeMap::new(),
            cues: Vec::new(),
            style_rules: Vec::new(),
            regions: Vec::new(),
        }
    }

    /// Dialect the document was parsed as
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// All properties, ordered by property
    pub fn properties(&self) -> impl Iterator<Item = (Property, &str)> {
        self.properties.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Look up one property
    #[must_use]
    pub fn property(&self, property: Property) -> Option<&str> {
        self.properties.get(&property).map(String::as_str)
    }

    /// Cues in document order
    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Number of cues
    #[must_use]
    pub fn cue_count(&self) -> usize {
        self.cues.len()
    }

    /// Style rules from header style blocks
    #[must_use]
    pub fn style_rules(&self) -> &[StyleRule] {
        &self.style_rules
    }

    /// Region definitions
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Set a property, replacing any earlier value
    pub(crate) fn set_property(&mut self, property: Property, value: impl Into<String>) {
        self.properties.insert(property, value.into());
    }

    /// Append a cue
    pub(crate) fn push_cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    /// Append style rules
    pub(crate) fn extend_style_rules(&mut self, rules: impl IntoIterator<Item = StyleRule>) {
        self.style_rules.extend(rules);
    }

    /// Append a region
    pub(crate) fn push_region(&mut self, region: Region) {
        self.regions.push(region);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimeCode;

    #[test]
    fn properties_are_ordered_and_replaceable() {
        let mut doc = Document::new(Dialect::Sami);
        doc.set_property(Property::Language, "en");
        doc.set_property(Property::Title, "first");
        doc.set_property(Property::Title, "second");

        let props: Vec<_> = doc.properties().collect();
        assert_eq!(
            props,
            vec![(Property::Title, "second"), (Property::Language, "en")]
        );
        assert_eq!(doc.property(Property::Copyright), None);
    }

    #[test]
    fn cue_storage() {
        let mut doc = Document::new(Dialect::Srt);
        assert_eq!(doc.cue_count(), 0);
        doc.push_cue(Cue::new(
            None,
            Some(TimeCode::ZERO),
            Some(TimeCode::from_millis(5)),
            Vec::new(),
            Vec::new(),
        ));
        assert_eq!(doc.cue_count(), 1);
        assert_eq!(doc.cues()[0].end(), Some(TimeCode::from_millis(5)));
        assert_eq!(doc.dialect(), Dialect::Srt);
    }

    #[test]
    fn region_lookup() {
        let region = Region::new(vec![
            ("id".into(), "fred".into()),
            ("width".into(), "40%".into()),
        ]);
        assert_eq!(region.id(), Some("fred"));
        assert_eq!(region.setting("width"), Some("40%"));
        assert_eq!(region.settings().len(), 2);
    }
}

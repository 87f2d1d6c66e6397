//! Embedded cue style rules
//!
//! WebVTT `STYLE` blocks carry a small CSS subset addressed at cues through
//! the `::cue` and `::cue-region` pseudo-elements. [`StyleRuleParser`]
//! validates a block and extracts the rules that are well-formed.

pub mod parser;

pub use parser::StyleRuleParser;

/// Pseudo-element a selector starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PseudoElement {
    /// `::cue`
    Cue,
    /// `::cue-region`
    CueRegion,
}

/// Trailing predicate of a selector
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectorPredicate {
    /// `:past` or `:future`
    PseudoClass(String),
    /// `:lang(tag)`
    Lang(String),
    /// `[name]` or `[name="value"]`
    Attribute {
        /// Attribute name
        name: String,
        /// Required value, if any
        value: Option<String>,
    },
}

/// One selector of a rule
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selector {
    /// Pseudo-element addressed
    pub pseudo_element: PseudoElement,
    /// Tag name inside the parentheses
    pub tag: Option<String>,
    /// `#id` inside the parentheses
    pub id: Option<String>,
    /// `.class` segments in source order
    pub classes: Vec<String>,
    /// Pseudo-class, language or attribute predicate
    pub predicate: Option<SelectorPredicate>,
}

impl Selector {
    /// Bare selector for a pseudo-element
    #[must_use]
    pub const fn new(pseudo_element: PseudoElement) -> Self {
        Self {
            pseudo_element,
            tag: None,
            id: None,
            classes: Vec::new(),
            predicate: None,
        }
    }

    /// Check if the selector applies to every cue
    #[must_use]
    pub fn is_universal(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.predicate.is_none()
    }
}

/// `property: value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    /// Property name
    pub property: String,
    /// Value text, trimmed
    pub value: String,
}

/// Selectors sharing one declaration block
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StyleRule {
    /// Comma-separated selectors, in source order
    pub selectors: Vec<Selector>,
    /// Declarations, in source order
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    /// Value of the last declaration of `property`
    #[must_use]
    pub fn declaration(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .rev()
            .find(|declaration| declaration.property == property)
            .map(|declaration| declaration.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_declaration_wins() {
        let rule = StyleRule {
            selectors: vec![Selector::new(PseudoElement::Cue)],
            declarations: vec![
                Declaration {
                    property: "color".into(),
                    value: "red".into(),
                },
                Declaration {
                    property: "color".into(),
                    value: "blue".into(),
                },
            ],
        };
        assert_eq!(rule.declaration("color"), Some("blue"));
        assert_eq!(rule.declaration("font-size"), None);
        assert!(rule.selectors[0].is_universal());
    }
}

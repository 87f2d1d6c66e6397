//! `::cue` style rule parser
//!
//! Block comments are blanked out first, then rules are read one at a time.
//! A rule with any deviation is reported as [`IssueKind::InvalidStyle`] and
//! dropped; parsing picks up again after the next top-level `}`.

use super::{Declaration, PseudoElement, Selector, SelectorPredicate, StyleRule};
use crate::parser::errors::IssueKind;
use crate::parser::reporter::DiagnosticReporter;

/// Pseudo-classes accepted after `:`
const PSEUDO_CLASSES: &[&str] = &["past", "future"];

/// Rule-level parse failure message
type RuleResult<T> = Result<T, String>;

/// Stateless parser for style blocks
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleRuleParser;

impl StyleRuleParser {
    /// Parse a style block, returning the well-formed rules
    #[must_use]
    pub fn parse(text: &str, reporter: &DiagnosticReporter) -> Vec<StyleRule> {
        let source = strip_comments(text, reporter);
        let mut rules = Vec::new();
        let mut rest = source.as_str();

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }

            match parse_rule(rest) {
                Ok((rule, remaining)) => {
                    rules.push(rule);
                    rest = remaining;
                }
                Err(message) => {
                    reporter.error(IssueKind::InvalidStyle, message);
                    rest = resync(rest);
                }
            }
        }

        log::debug!("Parsed {} style rule(s)", rules.len());
        rules
    }
}

/// Replace block comments with a space
///
/// An unterminated comment is reported and swallows the rest of the input.
fn strip_comments(text: &str, reporter: &DiagnosticReporter) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("/*") {
        output.push_str(&rest[..start]);
        let Some(len) = rest[start + 2..].find("*/") else {
            reporter.error(IssueKind::InvalidStyle, "Unterminated comment in style block");
            return output;
        };
        output.push(' ');
        rest = &rest[start + 2 + len + 2..];
    }

    output.push_str(rest);
    output
}

/// Skip past the next top-level `}`
fn resync(text: &str) -> &str {
    let mut depth = 0usize;
    for (index, c) in text.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[index + 1..];
                }
            }
            _ => {}
        }
    }
    ""
}

/// Parse one rule from the start of `text`
fn parse_rule(text: &str) -> RuleResult<(StyleRule, &str)> {
    let open = text
        .find(['{', '}'])
        .ok_or_else(|| format!("Style rule '{}' has no declaration block", text.trim()))?;
    if text.as_bytes()[open] == b'}' {
        return Err("Unbalanced '}' in style block".to_string());
    }

    let selectors = parse_selector_list(&text[..open])?;

    let body_start = open + 1;
    let close = text[body_start..]
        .find(['{', '}'])
        .map(|offset| body_start + offset)
        .ok_or_else(|| "Unbalanced '{': declaration block is not closed".to_string())?;
    if text.as_bytes()[close] == b'{' {
        return Err("Unexpected '{' inside a declaration block".to_string());
    }

    let declarations = parse_declarations(&text[body_start..close])?;

    Ok((
        StyleRule {
            selectors,
            declarations,
        },
        &text[close + 1..],
    ))
}

/// Split a selector list on top-level commas
fn parse_selector_list(prelude: &str) -> RuleResult<Vec<Selector>> {
    let mut selectors = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, c) in prelude.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                selectors.push(parse_selector(&prelude[start..index])?);
                start = index + 1;
            }
            _ => {}
        }
    }
    selectors.push(parse_selector(&prelude[start..])?);

    Ok(selectors)
}

/// Parse `::cue[(...)]` or `::cue-region[(...)]`
fn parse_selector(text: &str) -> RuleResult<Selector> {
    let text = text.trim();
    if text.is_empty() {
        return Err("Empty selector".to_string());
    }

    let Some(after_colons) = text.strip_prefix("::") else {
        return Err(format!("Selector '{text}' does not start with a pseudo-element"));
    };
    let name_len = after_colons
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(after_colons.len());
    let pseudo_element = match &after_colons[..name_len] {
        "cue" => PseudoElement::Cue,
        "cue-region" => PseudoElement::CueRegion,
        other => return Err(format!("Unknown pseudo-element '::{other}'")),
    };

    let mut selector = Selector::new(pseudo_element);
    let rest = after_colons[name_len..].trim_start();
    if rest.is_empty() {
        return Ok(selector);
    }

    if !rest.starts_with('(') {
        return Err(format!("Unexpected '{rest}' after pseudo-element"));
    }
    let close = matching_paren(rest)
        .ok_or_else(|| format!("Unbalanced parentheses in selector '{text}'"))?;
    let trailing = rest[close + 1..].trim();
    if !trailing.is_empty() {
        return Err(format!("Unexpected '{trailing}' after selector '{text}'"));
    }

    parse_inner(rest[1..close].trim(), &mut selector)?;
    Ok(selector)
}

/// Byte index of the `)` closing the `(` at index 0
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (index, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}

/// Length of the leading identifier run
fn ident_len(text: &str) -> usize {
    text.find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(text.len())
}

/// Parse the parenthesized part of a selector
fn parse_inner(inner: &str, selector: &mut Selector) -> RuleResult<()> {
    let mut rest = inner;

    let tag_len = ident_len(rest);
    if tag_len > 0 {
        selector.tag = Some(rest[..tag_len].to_string());
        rest = &rest[tag_len..];
    }

    if let Some(after) = rest.strip_prefix('#') {
        let len = ident_len(after);
        if len == 0 {
            return Err("Empty '#id' in selector".to_string());
        }
        selector.id = Some(after[..len].to_string());
        rest = &after[len..];
    }

    while let Some(after) = rest.strip_prefix('.') {
        let len = ident_len(after);
        if len == 0 {
            return Err("Empty '.class' in selector".to_string());
        }
        selector.classes.push(after[..len].to_string());
        rest = &after[len..];
    }

    if let Some(after) = rest.strip_prefix(':') {
        let len = ident_len(after);
        let name = &after[..len];
        rest = &after[len..];

        if name == "lang" {
            let Some(args) = rest.strip_prefix('(') else {
                return Err("':lang' requires a parenthesized language".to_string());
            };
            let close = args
                .find(')')
                .ok_or_else(|| "Unbalanced parentheses in ':lang(...)'".to_string())?;
            selector.predicate = Some(SelectorPredicate::Lang(args[..close].trim().to_string()));
            rest = &args[close + 1..];
        } else if PSEUDO_CLASSES.contains(&name) {
            selector.predicate = Some(SelectorPredicate::PseudoClass(name.to_string()));
        } else {
            return Err(format!("Unknown pseudo-class ':{name}'"));
        }
    } else if let Some(after) = rest.strip_prefix('[') {
        let close = after
            .find(']')
            .ok_or_else(|| "Unbalanced '[' in attribute selector".to_string())?;
        selector.predicate = Some(parse_attribute(&after[..close])?);
        rest = &after[close + 1..];
    }

    let rest = rest.trim();
    if rest.is_empty() {
        Ok(())
    } else {
        Err(format!("Unexpected '{rest}' in selector"))
    }
}

/// Parse `name` or `name="value"` from inside `[...]`
fn parse_attribute(text: &str) -> RuleResult<SelectorPredicate> {
    let (name, value) = match text.split_once('=') {
        Some((name, value)) => {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (name.trim(), Some(value.to_string()))
        }
        None => (text.trim(), None),
    };

    if name.is_empty() {
        return Err("Empty attribute name in selector".to_string());
    }

    Ok(SelectorPredicate::Attribute {
        name: name.to_string(),
        value,
    })
}

/// Parse `property: value; ...`
fn parse_declarations(body: &str) -> RuleResult<Vec<Declaration>> {
    let mut declarations = Vec::new();

    for part in body.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (property, value) = part
            .split_once(':')
            .ok_or_else(|| format!("Declaration '{part}' is missing its ':'"))?;
        let property = property.trim();
        if property.is_empty() {
            return Err(format!("Declaration '{part}' has an empty property name"));
        }
        declarations.push(Declaration {
            property: property.to_string(),
            value: value.trim().to_string(),
        });
    }

    Ok(declarations)
}

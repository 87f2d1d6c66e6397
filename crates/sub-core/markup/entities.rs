//! Character entity table and numeric reference decoding

use std::collections::HashMap;
use std::sync::OnceLock;

use ahash::RandomState;

use crate::utils::hashers::create_hash_map_with_capacity;

/// Named entities recognized in cue text
const NAMED_ENTITIES: &[(&str, char)] = &[
    ("lt", '<'),
    ("gt", '>'),
    ("amp", '&'),
    ("nbsp", '\u{a0}'),
    ("lrm", '\u{200e}'),
    ("rlm", '\u{200f}'),
    ("quot", '"'),
    ("apos", '\''),
];

fn table() -> &'static HashMap<&'static str, char, RandomState> {
    static TABLE: OnceLock<HashMap<&'static str, char, RandomState>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut map = create_hash_map_with_capacity(NAMED_ENTITIES.len());
        map.extend(NAMED_ENTITIES.iter().copied());
        map
    })
}

/// Look up a named entity, without the `&` and `;`
#[must_use]
pub fn lookup(name: &str) -> Option<char> {
    table().get(name).copied()
}

/// Look up a named entity in any ASCII case, as HTML-derived formats allow
#[must_use]
pub fn lookup_ignore_case(name: &str) -> Option<char> {
    lookup(name).or_else(|| {
        name.bytes()
            .any(|b| b.is_ascii_uppercase())
            .then(|| lookup(&name.to_ascii_lowercase()))
            .flatten()
    })
}

/// Decode the digits of a numeric reference
///
/// `digits` is the text between `&#` and `;`, with an optional leading `x`
/// or `X` for hexadecimal.
#[must_use]
pub fn decode_numeric(digits: &str) -> Option<char> {
    let value = match digits.strip_prefix(['x', 'X']) {
        Some(hex) if !hex.is_empty() => u32::from_str_radix(hex, 16).ok()?,
        Some(_) => return None,
        None if !digits.is_empty() => digits.parse::<u32>().ok()?,
        None => return None,
    };
    char::from_u32(value).filter(|c| *c != '\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_lookup() {
        assert_eq!(lookup("lt"), Some('<'));
        assert_eq!(lookup("nbsp"), Some('\u{a0}'));
        assert_eq!(lookup("NBSP"), None);
        assert_eq!(lookup("nb"), None);
    }

    #[test]
    fn case_folded_lookup() {
        assert_eq!(lookup_ignore_case("NBSP"), Some('\u{a0}'));
        assert_eq!(lookup_ignore_case("Amp"), Some('&'));
        assert_eq!(lookup_ignore_case("lt"), Some('<'));
        assert_eq!(lookup_ignore_case("NB"), None);
    }

    #[test]
    fn numeric_references() {
        assert_eq!(decode_numeric("65"), Some('A'));
        assert_eq!(decode_numeric("x41"), Some('A'));
        assert_eq!(decode_numeric("X263A"), Some('\u{263a}'));
        assert_eq!(decode_numeric("x"), None);
        assert_eq!(decode_numeric(""), None);
        assert_eq!(decode_numeric("0"), None);
        assert_eq!(decode_numeric("xD800"), None);
        assert_eq!(decode_numeric("99999999999"), None);
    }
}

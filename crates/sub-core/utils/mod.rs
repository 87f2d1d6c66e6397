//! Utility functions and shared types for sub-core
//!
//! Contains the source decoding helpers used by the line reader and the
//! lookup-map constructors shared by the markup tables.

pub mod encoding;
pub mod hashers;

pub use encoding::{strip_utf8_bom, TextEncoding};
pub use hashers::{create_hash_map, create_hash_map_with_capacity};

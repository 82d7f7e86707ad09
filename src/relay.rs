//! Relay-style opaque identifiers.
//!
//! A global id is `base64("<type>:<id>")`; a connection cursor is
//! `base64("arrayconnection:<id>")`. Both are deterministic and reversible.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::{Error, Result};

const CURSOR_PREFIX: &str = "arrayconnection";

/// Encode `(type_name, id)` as an opaque global id.
pub fn to_global_id(type_name: &str, id: u64) -> String {
    STANDARD.encode(format!("{type_name}:{id}"))
}

/// Decode a global id into `(type_name, id)`.
pub fn from_global_id(global_id: &str) -> Result<(String, u64)> {
    let invalid = || Error::InvalidGlobalId(global_id.to_string());

    let bytes = STANDARD.decode(global_id.trim()).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    let (type_name, id) = text.split_once(':').ok_or_else(invalid)?;
    if type_name.is_empty() {
        return Err(invalid());
    }
    let id = id.parse::<u64>().map_err(|_| invalid())?;
    Ok((type_name.to_string(), id))
}

/// Decode a global id, rejecting any type other than `expected`.
pub fn decode_typed(expected: &str, global_id: &str) -> Result<u64> {
    let (type_name, id) = from_global_id(global_id)?;
    if type_name != expected {
        return Err(Error::InvalidGlobalId(format!(
            "{global_id}: expected type '{expected}', found '{type_name}'"
        )));
    }
    Ok(id)
}

pub fn encode_cursor(id: u64) -> String {
    to_global_id(CURSOR_PREFIX, id)
}

pub fn decode_cursor(cursor: &str) -> Result<u64> {
    decode_typed(CURSOR_PREFIX, cursor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_encoding() {
        // base64("byline:12")
        assert_eq!(to_global_id("byline", 12), "YnlsaW5lOjEy");
        assert_eq!(from_global_id("YnlsaW5lOjEy").unwrap(), ("byline".to_string(), 12));
    }

    #[test]
    fn test_decode_typed_rejects_other_prefix() {
        let id = to_global_id("post", 5);
        assert!(matches!(decode_typed("byline", &id), Err(Error::InvalidGlobalId(_))));
        assert_eq!(decode_typed("post", &id).unwrap(), 5);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(from_global_id("!!!").is_err());
        assert!(from_global_id(&STANDARD.encode("no-colon")).is_err());
        assert!(from_global_id(&STANDARD.encode(":5")).is_err());
        assert!(from_global_id(&STANDARD.encode("byline:abc")).is_err());
    }

    #[test]
    fn test_cursor_is_not_a_node_id() {
        let cursor = encode_cursor(9);
        assert_eq!(decode_cursor(&cursor).unwrap(), 9);
        assert!(decode_typed("byline", &cursor).is_err());
    }

    proptest! {
        #[test]
        fn prop_global_id_round_trips(type_name in "[a-zA-Z_][a-zA-Z0-9_]{0,15}", id in any::<u64>()) {
            let encoded = to_global_id(&type_name, id);
            prop_assert_eq!(decode_typed(&type_name, &encoded).unwrap(), id);
        }
    }
}

//! Deterministic JSON canonicalization and digest computation.
//!
//! The canonical form is the byte string every signature in the system is
//! computed over. Signing and verification call the same functions here, so
//! a document canonicalizes identically on both sides.
//!
//! Rules:
//! - object keys sorted by Unicode code point (no locale collation)
//! - numbers in shortest round-tripping decimal form (ECMAScript layout)
//! - strings and keys normalized to NFC before escaping
//! - no insignificant whitespace
//!
//! # Example
//!
//! ```
//! let canonical = ct_canon::canonicalize_str(r#"{ "b": 2, "a": 1.0 }"#).unwrap();
//! assert_eq!(canonical, r#"{"a":1,"b":2}"#);
//! ```

mod digest;
mod number;

use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use thiserror::Error;
use unicode_normalization::{is_nfc, UnicodeNormalization};

pub use digest::{Digest, DigestError, HashAlgorithm};

/// Errors raised while producing the canonical form.
#[derive(Debug, Error)]
pub enum CanonicalizationError {
    #[error("empty input")]
    EmptyInput,

    #[error("malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("duplicate object key after normalization: {0:?}")]
    DuplicateKey(String),

    #[error("number cannot be canonicalized: {0}")]
    Number(String),
}

/// Canonicalize UTF-8 JSON bytes.
pub fn canonicalize_bytes(input: &[u8]) -> Result<Vec<u8>, CanonicalizationError> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Err(CanonicalizationError::EmptyInput);
    }
    let value: Value = serde_json::from_slice(input)?;
    Ok(canonicalize_value(&value)?.into_bytes())
}

/// Canonicalize JSON text.
pub fn canonicalize_str(input: &str) -> Result<String, CanonicalizationError> {
    if input.trim().is_empty() {
        return Err(CanonicalizationError::EmptyInput);
    }
    let value: Value = serde_json::from_str(input)?;
    canonicalize_value(&value)
}

/// Canonicalize an already parsed JSON value.
pub fn canonicalize_value(value: &Value) -> Result<String, CanonicalizationError> {
    let mut out = String::new();
    write_value(value, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, out: &mut String) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => number::write_number(number, out)?,
        Value::String(text) => write_string(&normalize(text), out),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_value(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            // BTreeMap<String, _> orders by UTF-8 bytes, which is code point order.
            let mut members: BTreeMap<Cow<'_, str>, &Value> = BTreeMap::new();
            for (key, member) in map {
                let key = normalize(key);
                if members.contains_key(&key) {
                    return Err(CanonicalizationError::DuplicateKey(key.into_owned()));
                }
                members.insert(key, member);
            }

            out.push('{');
            for (index, (key, member)) in members.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_string(&key, out);
                out.push(':');
                write_value(member, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

fn normalize(text: &str) -> Cow<'_, str> {
    if is_nfc(text) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.nfc().collect())
    }
}

fn write_string(text: &str, out: &mut String) {
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\u{0C}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

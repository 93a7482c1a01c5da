//! Signature envelope codec.
//!
//! An envelope wraps the backend's opaque signature blob with descriptive
//! metadata. It is stored as a single-element list under the `signature`
//! field; the list shape leaves room for multi-scheme signatures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CODING_SYSTEM: &str = "Content-Trust";
pub const CODING_VERSION: &str = "1.0";
/// `targetFormat` for envelopes over canonicalized JSON documents.
pub const JSON_TARGET_FORMAT: &str = "application/json";

/// Errors raised while reading or writing a `signature` field.
///
/// Each decoding failure is a distinct, user-visible message.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Signature missing.")]
    SignatureMissing,

    #[error("Signature data missing.")]
    DataMissing,

    #[error("Signature data is not a string.")]
    DataType,

    #[error("Signature data is not valid base64.")]
    DataEncoding,

    #[error("Malformed signature envelope: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Identifies the backend scheme that produced a signature blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureScheme {
    /// Machine code, e.g. `ED25519`.
    pub code: String,
    /// Human label, e.g. `Ed25519 Signature`.
    pub display: String,
    /// URI or media type describing the blob format.
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    pub system: String,
    pub version: String,
    pub code: String,
    pub display: String,
    #[serde(default)]
    pub user_selected: bool,
}

impl Coding {
    pub fn for_scheme(scheme: &SignatureScheme) -> Self {
        Self {
            system: CODING_SYSTEM.to_string(),
            version: CODING_VERSION.to_string(),
            code: scheme.code.clone(),
            display: scheme.display.clone(),
            user_selected: false,
        }
    }
}

/// A signature blob plus metadata, serialized with FHIR `Signature` names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    #[serde(rename = "type")]
    pub coding: Vec<Coding>,

    #[serde(rename = "when")]
    pub timestamp: DateTime<Utc>,

    #[serde(rename = "who", default, skip_serializing_if = "Option::is_none")]
    pub signer_identity: Option<String>,

    #[serde(rename = "onBehalfOf", default, skip_serializing_if = "Option::is_none")]
    pub on_behalf_of: Option<String>,

    #[serde(rename = "targetFormat", default, skip_serializing_if = "Option::is_none")]
    pub target_format: Option<String>,

    #[serde(rename = "sigFormat")]
    pub signature_format: String,

    #[serde(with = "base64_data")]
    pub data: Vec<u8>,
}

impl SignatureEnvelope {
    /// Envelope with exactly one coding entry for `scheme`.
    pub fn new(scheme: &SignatureScheme, timestamp: DateTime<Utc>, data: Vec<u8>) -> Self {
        Self {
            coding: vec![Coding::for_scheme(scheme)],
            timestamp,
            signer_identity: None,
            on_behalf_of: None,
            target_format: None,
            signature_format: scheme.format.clone(),
            data,
        }
    }

    /// Encode as the value of a `signature` field.
    pub fn to_field(&self) -> Result<Value, EnvelopeError> {
        Ok(serde_json::to_value(std::slice::from_ref(self))?)
    }

    /// Fully decode the first envelope of a `signature` field.
    pub fn from_field(field: Option<&Value>) -> Result<Self, EnvelopeError> {
        let first = first_entry(field)?;
        if first.get("data").map_or(true, Value::is_null) {
            return Err(EnvelopeError::DataMissing);
        }
        Ok(serde_json::from_value(first.clone())?)
    }
}

/// Extract the signature blob from a `signature` field.
///
/// Only `signature[0].data` is read; the remaining metadata is descriptive.
pub fn signature_data(field: Option<&Value>) -> Result<Vec<u8>, EnvelopeError> {
    use base64::{engine::general_purpose::STANDARD, Engine as _};

    let data = match first_entry(field)?.get("data") {
        None | Some(Value::Null) => return Err(EnvelopeError::DataMissing),
        Some(Value::String(data)) => data,
        Some(_) => return Err(EnvelopeError::DataType),
    };
    STANDARD
        .decode(data)
        .map_err(|_| EnvelopeError::DataEncoding)
}

fn first_entry(field: Option<&Value>) -> Result<&Value, EnvelopeError> {
    match field {
        Some(Value::Array(entries)) => entries.first().ok_or(EnvelopeError::SignatureMissing),
        _ => Err(EnvelopeError::SignatureMissing),
    }
}

mod base64_data {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

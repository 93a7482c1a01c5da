//! Document model with an explicit, one-level provenance relation.

use serde_json::{Map, Value};
use thiserror::Error;

/// Reserved field holding the envelope list.
pub const SIGNATURE_FIELD: &str = "signature";
/// Reserved field holding the nested provenance sub-document.
pub const PROVENANCE_FIELD: &str = "provenance";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Input missing.")]
    Missing,

    #[error("Input is not a JSON object.")]
    NotAnObject,
}

/// Something that can carry a `signature` field and be canonicalized for it.
pub trait Sealable {
    /// The raw `signature` field, if present.
    fn signature_field(&self) -> Option<&Value>;

    /// Working copy of the content covered by this object's signature.
    ///
    /// Never includes this object's own `signature` field.
    fn signing_content(&self) -> Value;

    fn set_signature(&mut self, field: Value);

    fn remove_signature(&mut self) -> Option<Value>;
}

/// The nested provenance sub-document.
///
/// A `provenance` member inside it is plain content, not another relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    fields: Map<String, Value>,
}

impl Provenance {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl Sealable for Provenance {
    fn signature_field(&self) -> Option<&Value> {
        self.fields.get(SIGNATURE_FIELD)
    }

    fn signing_content(&self) -> Value {
        let mut content = self.fields.clone();
        content.remove(SIGNATURE_FIELD);
        Value::Object(content)
    }

    fn set_signature(&mut self, field: Value) {
        self.fields.insert(SIGNATURE_FIELD.to_string(), field);
    }

    fn remove_signature(&mut self) -> Option<Value> {
        self.fields.remove(SIGNATURE_FIELD)
    }
}

/// A top-level JSON object, optionally carrying a provenance sub-document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Every member except an object-valued `provenance`.
    fields: Map<String, Value>,
    provenance: Option<Provenance>,
    /// Position of `provenance` among the members, for re-assembly.
    provenance_slot: usize,
}

impl Document {
    /// Split a JSON value into a document and its provenance.
    ///
    /// A `provenance` member that is not an object is kept as plain content.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Err(DocumentError::Missing),
            _ => return Err(DocumentError::NotAnObject),
        };

        let mut fields = Map::new();
        let mut provenance = None;
        let mut provenance_slot = 0;
        for (key, member) in map {
            if key == PROVENANCE_FIELD {
                if let Value::Object(inner) = member {
                    provenance_slot = fields.len();
                    provenance = Some(Provenance { fields: inner });
                    continue;
                }
                fields.insert(key, member);
                continue;
            }
            fields.insert(key, member);
        }

        Ok(Self {
            fields,
            provenance,
            provenance_slot,
        })
    }

    /// Re-assemble the JSON object, keeping the original member order.
    pub fn into_value(self) -> Value {
        let mut provenance = self.provenance.map(|p| Value::Object(p.fields));
        let mut out = Map::new();
        for (index, (key, member)) in self.fields.into_iter().enumerate() {
            if index == self.provenance_slot {
                if let Some(inner) = provenance.take() {
                    out.insert(PROVENANCE_FIELD.to_string(), inner);
                }
            }
            out.insert(key, member);
        }
        if let Some(inner) = provenance {
            out.insert(PROVENANCE_FIELD.to_string(), inner);
        }
        Value::Object(out)
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    pub fn provenance_mut(&mut self) -> Option<&mut Provenance> {
        self.provenance.as_mut()
    }

    pub fn has_provenance(&self) -> bool {
        self.provenance.is_some()
    }

    /// Drop the provenance's signature, if any.
    pub fn strip_provenance_signature(&mut self) -> Option<Value> {
        self.provenance
            .as_mut()
            .and_then(Sealable::remove_signature)
    }
}

impl Sealable for Document {
    fn signature_field(&self) -> Option<&Value> {
        self.fields.get(SIGNATURE_FIELD)
    }

    /// The outer signature covers the provenance content but not the
    /// provenance's own signature, which is attached after the outer one.
    fn signing_content(&self) -> Value {
        let mut content = self.fields.clone();
        content.remove(SIGNATURE_FIELD);
        if let Some(provenance) = &self.provenance {
            content.insert(PROVENANCE_FIELD.to_string(), provenance.signing_content());
        }
        Value::Object(content)
    }

    fn set_signature(&mut self, field: Value) {
        self.fields.insert(SIGNATURE_FIELD.to_string(), field);
    }

    fn remove_signature(&mut self) -> Option<Value> {
        self.fields.remove(SIGNATURE_FIELD)
    }
}

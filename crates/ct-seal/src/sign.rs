//! Signing orchestration: canonicalize, digest, seal, attach.

use crate::backend::{BackendError, SigningBackend};
use crate::document::{Document, DocumentError, Sealable, SIGNATURE_FIELD};
use crate::envelope::{EnvelopeError, SignatureEnvelope, JSON_TARGET_FORMAT};
use crate::identity::IdentityMetadata;
use crate::types::Status;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use ct_canon::{canonicalize_value, CanonicalizationError, Digest, DigestError, HashAlgorithm};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const HASH_FIELD: &str = "hash";

#[derive(Debug, Error)]
pub enum SigningError {
    #[error(transparent)]
    Input(#[from] DocumentError),

    #[error("Resource did not contain provenance.")]
    ProvenanceMissing,

    #[error("Input did not contain hash.")]
    HashMissing,

    #[error("Hash is not valid base64.")]
    HashEncoding,

    #[error(transparent)]
    Digest(#[from] DigestError),

    #[error("Failed to canonicalize input: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SigningError {
    /// FAILED for anything the caller can fix, ERROR for faults.
    pub fn status(&self) -> Status {
        match self {
            Self::Backend(err) => err.status(),
            Self::Envelope(_) => Status::Error,
            _ => Status::Failed,
        }
    }
}

/// Drives the signing backend over documents and raw hashes.
///
/// Every digest is signed through its own freshly opened session.
pub struct SigningOrchestrator {
    backend: Arc<dyn SigningBackend>,
    algorithm: HashAlgorithm,
}

impl SigningOrchestrator {
    pub fn new(backend: Arc<dyn SigningBackend>, algorithm: HashAlgorithm) -> Self {
        Self { backend, algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Sign a JSON document and, if asked, its provenance.
    pub fn sign_resource(
        &self,
        resource: Value,
        identity: &IdentityMetadata,
        sign_provenance: bool,
    ) -> Result<Value, SigningError> {
        let document = Document::from_value(resource)?;
        Ok(self
            .sign_document(document, identity, sign_provenance)?
            .into_value())
    }

    /// Seal the outer document, then the provenance with a new session.
    ///
    /// Signatures are attached only once every requested seal succeeded, so
    /// a failure never leaves a half-signed document behind.
    pub fn sign_document(
        &self,
        mut document: Document,
        identity: &IdentityMetadata,
        sign_provenance: bool,
    ) -> Result<Document, SigningError> {
        let outer = self.seal(&document, identity)?;

        let provenance = if sign_provenance {
            let provenance = document
                .provenance()
                .ok_or(SigningError::ProvenanceMissing)?;
            debug!("Signing provenance resource.");
            Some(self.seal(provenance, identity)?)
        } else {
            None
        };

        document.set_signature(outer);
        if let (Some(field), Some(target)) = (provenance, document.provenance_mut()) {
            target.set_signature(field);
        }
        Ok(document)
    }

    /// Sign a base64 digest supplied as `{"hash": ...}`.
    ///
    /// The envelope is attached under `signature` of the same object.
    pub fn sign_hash(
        &self,
        input: Value,
        identity: &IdentityMetadata,
    ) -> Result<Value, SigningError> {
        let mut object = match input {
            Value::Object(object) => object,
            Value::Null => return Err(DocumentError::Missing.into()),
            _ => return Err(DocumentError::NotAnObject.into()),
        };
        let encoded = object
            .get(HASH_FIELD)
            .and_then(Value::as_str)
            .ok_or(SigningError::HashMissing)?;
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| SigningError::HashEncoding)?;
        let digest = Digest::from_raw(self.algorithm, bytes)?;

        let envelope = self.seal_digest(&digest, identity, None)?;
        object.insert(SIGNATURE_FIELD.to_string(), envelope.to_field()?);
        Ok(Value::Object(object))
    }

    fn seal<S: Sealable>(
        &self,
        target: &S,
        identity: &IdentityMetadata,
    ) -> Result<Value, SigningError> {
        let canonical = canonicalize_value(&target.signing_content())?;
        let digest = Digest::compute(self.algorithm, canonical.as_bytes());
        let envelope = self.seal_digest(&digest, identity, Some(JSON_TARGET_FORMAT))?;
        Ok(envelope.to_field()?)
    }

    fn seal_digest(
        &self,
        digest: &Digest,
        identity: &IdentityMetadata,
        target_format: Option<&str>,
    ) -> Result<SignatureEnvelope, SigningError> {
        let session = self.backend.open_session(identity)?;
        let data = session.sign(digest)?;

        let mut envelope = SignatureEnvelope::new(&self.backend.scheme(), Utc::now(), data);
        envelope.signer_identity = identity.signer().map(str::to_string);
        envelope.target_format = target_format.map(str::to_string);
        Ok(envelope)
    }
}

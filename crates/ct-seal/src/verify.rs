//! Verification orchestration.

use crate::backend::{BackendError, BackendVerdict, TrustPolicy, VerificationBackend};
use crate::document::{Document, DocumentError, Sealable};
use crate::envelope::signature_data;
use crate::sign::HASH_FIELD;
use crate::types::{Status, ValidationReport, VerificationResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ct_canon::{canonicalize_value, Digest};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Input errors that abort verification before any verdict is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error(transparent)]
    Input(#[from] DocumentError),

    #[error("Resource did not contain provenance.")]
    ProvenanceMissing,

    #[error("Input did not contain hash.")]
    HashMissing,

    #[error("Input did not contain signature.")]
    SignatureMissing,

    #[error("{0} is not valid base64.")]
    Encoding(&'static str),
}

/// Single-document verification against a fixed trust policy.
#[derive(Clone)]
pub struct Verifier {
    backend: Arc<dyn VerificationBackend>,
    policy: TrustPolicy,
}

impl Verifier {
    pub fn new(backend: Arc<dyn VerificationBackend>, policy: TrustPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    /// Verify the signature carried by `target` over its own content.
    ///
    /// The digest is recomputed with the algorithm recorded in the signature
    /// blob, never one chosen by the caller.
    pub fn verify<S: Sealable>(&self, target: &S) -> VerificationResponse {
        let blob = match signature_data(target.signature_field()) {
            Ok(blob) => blob,
            Err(err) => return VerificationResponse::failed(err.to_string()),
        };
        let algorithm = match self.backend.input_algorithm(&blob) {
            Ok(algorithm) => algorithm,
            Err(err) => return backend_failure(err),
        };
        let canonical = match canonicalize_value(&target.signing_content()) {
            Ok(canonical) => canonical,
            Err(err) => return VerificationResponse::failed(err.to_string()),
        };
        let digest = Digest::compute(algorithm, canonical.as_bytes());
        self.judge(&blob, &digest)
    }

    /// Verify a digest held out of band against a raw signature blob.
    ///
    /// Any fault reading the blob or the digest is ERROR; only a backend
    /// rejection is FAILED.
    pub fn verify_hash(&self, hash: &[u8], signature: &[u8]) -> VerificationResponse {
        let algorithm = match self.backend.input_algorithm(signature) {
            Ok(algorithm) => algorithm,
            Err(err) => return VerificationResponse::error(err.to_string()),
        };
        let digest = match Digest::from_raw(algorithm, hash.to_vec()) {
            Ok(digest) => digest,
            Err(err) => return VerificationResponse::error(err.to_string()),
        };
        match self.backend.verify(signature, &digest, &self.policy) {
            Ok(BackendVerdict::Accepted) => VerificationResponse::ok(),
            Ok(BackendVerdict::Rejected(reason)) => VerificationResponse::failed(reason.message()),
            Err(err) => VerificationResponse::error(err.to_string()),
        }
    }

    fn judge(&self, signature: &[u8], digest: &Digest) -> VerificationResponse {
        match self.backend.verify(signature, digest, &self.policy) {
            Ok(BackendVerdict::Accepted) => VerificationResponse::ok(),
            Ok(BackendVerdict::Rejected(reason)) => VerificationResponse::failed(reason.message()),
            Err(err) => backend_failure(err),
        }
    }
}

fn backend_failure(err: BackendError) -> VerificationResponse {
    match err.status() {
        Status::Error => VerificationResponse::error(err.to_string()),
        _ => VerificationResponse::failed(err.to_string()),
    }
}

/// Verifies documents, their provenance, and raw hashes.
#[derive(Clone)]
pub struct VerificationOrchestrator {
    verifier: Verifier,
}

impl VerificationOrchestrator {
    pub fn new(backend: Arc<dyn VerificationBackend>, policy: TrustPolicy) -> Self {
        Self {
            verifier: Verifier::new(backend, policy),
        }
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn verify_resource(
        &self,
        resource: Value,
        verify_provenance: bool,
    ) -> Result<ValidationReport, VerificationError> {
        let document = Document::from_value(resource)?;
        self.verify_document(document, verify_provenance)
    }

    /// Verify the outer document and, if asked, its provenance.
    ///
    /// The outer document is always verified, whatever the provenance
    /// verdict; the two are reported side by side.
    pub fn verify_document(
        &self,
        mut document: Document,
        verify_provenance: bool,
    ) -> Result<ValidationReport, VerificationError> {
        if !verify_provenance {
            if document.strip_provenance_signature().is_some() {
                debug!("Ignoring provenance signature.");
            }
            return Ok(ValidationReport::resource_only(
                self.verifier.verify(&document),
            ));
        }

        let provenance = document
            .provenance()
            .ok_or(VerificationError::ProvenanceMissing)?;
        debug!("Verifying provenance resource.");
        let provenance_response = self.verifier.verify(provenance);
        let resource_response = self.verifier.verify(&document);

        Ok(ValidationReport {
            resource_validation_response: resource_response,
            provenance_validation_response: Some(provenance_response),
        })
    }

    /// Verify `{"hash": base64, "signature": base64}`.
    pub fn verify_hash(&self, input: &Value) -> Result<ValidationReport, VerificationError> {
        let object = match input {
            Value::Object(object) => object,
            Value::Null => return Err(DocumentError::Missing.into()),
            _ => return Err(DocumentError::NotAnObject.into()),
        };
        let hash = object
            .get(HASH_FIELD)
            .and_then(Value::as_str)
            .ok_or(VerificationError::HashMissing)?;
        let signature = object
            .get("signature")
            .and_then(Value::as_str)
            .ok_or(VerificationError::SignatureMissing)?;

        let hash = STANDARD
            .decode(hash)
            .map_err(|_| VerificationError::Encoding("Hash"))?;
        let signature = STANDARD
            .decode(signature)
            .map_err(|_| VerificationError::Encoding("Signature"))?;

        Ok(ValidationReport::resource_only(
            self.verifier.verify_hash(&hash, &signature),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ed25519::{Ed25519Signer, Ed25519Verifier};
    use crate::identity::IdentityMetadata;
    use crate::sign::SigningOrchestrator;
    use ct_canon::HashAlgorithm;
    use serde_json::json;

    struct Fixture {
        signing: SigningOrchestrator,
        verifying: VerificationOrchestrator,
    }

    fn fixture() -> Fixture {
        let signer = Ed25519Signer::generate("test").unwrap();
        let policy = signer.trust_policy();
        Fixture {
            signing: SigningOrchestrator::new(Arc::new(signer), HashAlgorithm::Sha256),
            verifying: VerificationOrchestrator::new(Arc::new(Ed25519Verifier), policy),
        }
    }

    fn identity() -> IdentityMetadata {
        IdentityMetadata::new()
            .with("preferred_username", "alice")
            .unwrap()
    }

    #[test]
    fn test_signed_document_verifies() {
        let fx = fixture();
        let signed = fx
            .signing
            .sign_resource(json!({"name": "Ada", "age": 36}), &identity(), false)
            .unwrap();
        let report = fx.verifying.verify_resource(signed, false).unwrap();
        assert!(report.all_ok());
        assert!(report.provenance_validation_response.is_none());
    }

    #[test]
    fn test_reordered_document_still_verifies() {
        let fx = fixture();
        let signed = fx
            .signing
            .sign_resource(json!({"a": 1, "b": [1.0, 2]}), &identity(), false)
            .unwrap();
        let reparsed: Value = serde_json::from_str(&signed.to_string()).unwrap();
        let report = fx.verifying.verify_resource(reparsed, false).unwrap();
        assert_eq!(report.resource_validation_response.status, Status::Ok);
    }

    #[test]
    fn test_tampered_document_is_wrong_document() {
        let fx = fixture();
        let mut signed = fx
            .signing
            .sign_resource(json!({"name": "Ada"}), &identity(), false)
            .unwrap();
        signed["name"] = json!("Adb");
        let report = fx.verifying.verify_resource(signed, false).unwrap();
        assert_eq!(
            report.resource_validation_response,
            VerificationResponse::failed("Wrong document")
        );
    }

    #[test]
    fn test_unsigned_document_reports_missing_signature() {
        let fx = fixture();
        let report = fx.verifying.verify_resource(json!({"a": 1}), false).unwrap();
        assert_eq!(
            report.resource_validation_response,
            VerificationResponse::failed("Signature missing.")
        );

        let report = fx
            .verifying
            .verify_resource(json!({"a": 1, "signature": []}), false)
            .unwrap();
        assert_eq!(
            report.resource_validation_response.message.as_deref(),
            Some("Signature missing.")
        );
    }

    #[test]
    fn test_envelope_without_data() {
        let fx = fixture();
        let report = fx
            .verifying
            .verify_resource(json!({"a": 1, "signature": [{"sigFormat": "x"}]}), false)
            .unwrap();
        assert_eq!(
            report.resource_validation_response,
            VerificationResponse::failed("Signature data missing.")
        );
    }

    #[test]
    fn test_garbage_blob_is_failed() {
        let fx = fixture();
        let data = STANDARD.encode(b"not a seal");
        let report = fx
            .verifying
            .verify_resource(json!({"a": 1, "signature": [{"data": data}]}), false)
            .unwrap();
        assert_eq!(report.resource_validation_response.status, Status::Failed);
    }

    #[test]
    fn test_untrusted_signer_is_failed() {
        let fx = fixture();
        let stranger = Ed25519Signer::generate("stranger").unwrap();
        let signed = SigningOrchestrator::new(Arc::new(stranger), HashAlgorithm::Sha256)
            .sign_resource(json!({"a": 1}), &identity(), false)
            .unwrap();
        let report = fx.verifying.verify_resource(signed, false).unwrap();
        assert_eq!(
            report.resource_validation_response,
            VerificationResponse::failed("Signing key is not trusted")
        );
    }

    #[test]
    fn test_algorithm_comes_from_blob() {
        let signer = Ed25519Signer::generate("test").unwrap();
        let policy = signer.trust_policy();
        let signed = SigningOrchestrator::new(Arc::new(signer), HashAlgorithm::Blake3)
            .sign_resource(json!({"a": 1}), &identity(), false)
            .unwrap();
        let report = VerificationOrchestrator::new(Arc::new(Ed25519Verifier), policy)
            .verify_resource(signed, false)
            .unwrap();
        assert!(report.all_ok());
    }

    #[test]
    fn test_provenance_verified_when_requested() {
        let fx = fixture();
        let signed = fx
            .signing
            .sign_resource(json!({"id": "1", "provenance": {"id": "p"}}), &identity(), true)
            .unwrap();
        let report = fx.verifying.verify_resource(signed, true).unwrap();
        assert!(report.all_ok());
        assert!(report.provenance_validation_response.is_some());
    }

    #[test]
    fn test_missing_provenance_aborts_verification() {
        let fx = fixture();
        let signed = fx
            .signing
            .sign_resource(json!({"id": "1"}), &identity(), false)
            .unwrap();
        assert_eq!(
            fx.verifying.verify_resource(signed, true),
            Err(VerificationError::ProvenanceMissing)
        );
    }

    #[test]
    fn test_provenance_failure_does_not_touch_outer_verdict() {
        let fx = fixture();
        let signed = fx
            .signing
            .sign_resource(json!({"id": "1", "provenance": {"id": "p"}}), &identity(), false)
            .unwrap();
        let report = fx.verifying.verify_resource(signed, true).unwrap();
        assert_eq!(report.resource_validation_response.status, Status::Ok);
        assert_eq!(
            report.provenance_validation_response,
            Some(VerificationResponse::failed("Signature missing."))
        );
    }

    #[test]
    fn test_verify_hash_round_trip() {
        let fx = fixture();
        let hash = STANDARD.encode([9u8; 32]);
        let signed = fx.signing.sign_hash(json!({"hash": hash}), &identity()).unwrap();
        let signature = signed["signature"][0]["data"].clone();

        let report = fx
            .verifying
            .verify_hash(&json!({"hash": hash, "signature": signature}))
            .unwrap();
        assert!(report.all_ok());

        let other = STANDARD.encode([8u8; 32]);
        let report = fx
            .verifying
            .verify_hash(&json!({"hash": other, "signature": signature}))
            .unwrap();
        assert_eq!(
            report.resource_validation_response,
            VerificationResponse::failed("Wrong document")
        );
    }

    #[test]
    fn test_unreadable_hash_signature_is_error() {
        let fx = fixture();
        let hash = STANDARD.encode([1u8; 32]);
        let garbage = STANDARD.encode(b"garbage");
        let report = fx
            .verifying
            .verify_hash(&json!({"hash": hash, "signature": garbage}))
            .unwrap();
        assert_eq!(report.resource_validation_response.status, Status::Error);

        let signed = fx.signing.sign_hash(json!({"hash": hash}), &identity()).unwrap();
        let signature = signed["signature"][0]["data"].clone();
        let short = STANDARD.encode([1u8; 4]);
        let report = fx
            .verifying
            .verify_hash(&json!({"hash": short, "signature": signature}))
            .unwrap();
        assert_eq!(report.resource_validation_response.status, Status::Error);
    }

    #[test]
    fn test_verify_hash_input_errors() {
        let fx = fixture();
        assert_eq!(
            fx.verifying.verify_hash(&json!({"signature": "AAAA"})),
            Err(VerificationError::HashMissing)
        );
        assert_eq!(
            fx.verifying.verify_hash(&json!({"hash": "AAAA"})),
            Err(VerificationError::SignatureMissing)
        );
        let err = fx
            .verifying
            .verify_hash(&json!({"hash": "!!", "signature": "AAAA"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Hash is not valid base64.");
        assert_eq!(
            fx.verifying.verify_hash(&Value::Null),
            Err(VerificationError::Input(DocumentError::Missing))
        );
    }
}

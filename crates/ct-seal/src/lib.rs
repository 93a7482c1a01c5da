//! Content-trust sealing for JSON documents.
//!
//! This crate turns a JSON document into a canonical digest, has an injected
//! backend sign it, and wraps the signature blob in an envelope stored under
//! the document's `signature` field. Verification recomputes the digest and
//! asks the backend for a verdict: OK, FAILED or ERROR.
//!
//! A document may carry one nested `provenance` sub-document, which is signed
//! and verified independently of its parent.
//!
//! # Example
//!
//! ```
//! use ct_seal::{
//!     Ed25519Signer, Ed25519Verifier, HashAlgorithm, IdentityMetadata, SigningOrchestrator,
//!     VerificationOrchestrator,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let signer = Ed25519Signer::generate("example").unwrap();
//! let policy = signer.trust_policy();
//! let signing = SigningOrchestrator::new(Arc::new(signer), HashAlgorithm::Sha256);
//!
//! let identity = IdentityMetadata::new()
//!     .with("preferred_username", "alice")
//!     .unwrap();
//! let signed = signing
//!     .sign_resource(json!({"resourceType": "Patient"}), &identity, false)
//!     .unwrap();
//!
//! let verifying = VerificationOrchestrator::new(Arc::new(Ed25519Verifier), policy);
//! let report = verifying.verify_resource(signed, false).unwrap();
//! assert!(report.all_ok());
//! ```

mod backend;
mod document;
mod ed25519;
mod envelope;
mod identity;
mod sign;
mod types;
mod verify;

pub use backend::{
    BackendError, BackendVerdict, ReasonCode, SigningBackend, SigningSession, TrustPolicy,
    VerificationBackend,
};
pub use ct_canon::{Digest, HashAlgorithm};
pub use document::{
    Document, DocumentError, Provenance, Sealable, PROVENANCE_FIELD, SIGNATURE_FIELD,
};
pub use ed25519::{keygen, Ed25519Signer, Ed25519Verifier, SealRecord};
pub use envelope::{
    signature_data, Coding, EnvelopeError, SignatureEnvelope, SignatureScheme, CODING_SYSTEM,
    CODING_VERSION, JSON_TARGET_FORMAT,
};
pub use identity::{IdentityClaim, IdentityError, IdentityMetadata};
pub use sign::{SigningError, SigningOrchestrator, HASH_FIELD};
pub use types::{Status, ValidationReport, VerificationResponse};
pub use verify::{VerificationError, VerificationOrchestrator, Verifier};

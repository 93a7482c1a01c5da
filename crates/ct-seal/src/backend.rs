//! Interfaces to the external signing and verification backend.
//!
//! The orchestrators only ever see these traits; the backend is injected,
//! never constructed by the pipeline itself.

use crate::envelope::SignatureScheme;
use crate::identity::IdentityMetadata;
use crate::types::Status;
use chrono::Duration;
use ct_canon::{Digest, HashAlgorithm};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Failures reported by a backend.
///
/// `Rejected` and `Malformed` are data-shaped and classify as FAILED;
/// `Unavailable` and `Internal` are faults and classify as ERROR.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Malformed(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl BackendError {
    pub fn status(&self) -> Status {
        match self {
            Self::Rejected(_) | Self::Malformed(_) => Status::Failed,
            Self::Unavailable(_) | Self::Internal(_) => Status::Error,
        }
    }
}

/// Why a backend declined a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    /// The recomputed digest is not the one that was signed.
    WrongDocument,
    /// The signing key is not a trust anchor of the policy.
    UntrustedKey,
    /// The signature does not verify against the anchor.
    InvalidSignature,
    /// The signature is older than the policy allows.
    Expired,
    /// The signature claims a time too far in the future.
    NotYetValid,
}

impl ReasonCode {
    pub fn message(self) -> &'static str {
        match self {
            Self::WrongDocument => "Wrong document",
            Self::UntrustedKey => "Signing key is not trusted",
            Self::InvalidSignature => "Signature verification failed",
            Self::Expired => "Signature has expired",
            Self::NotYetValid => "Signature time is in the future",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendVerdict {
    Accepted,
    Rejected(ReasonCode),
}

/// Backend-side rules deciding whether a signature is currently acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustPolicy {
    trusted_keys: BTreeMap<String, [u8; 32]>,
    max_age: Option<Duration>,
}

impl TrustPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trust anchor: a key id and its 32-byte public key.
    pub fn trust_key(mut self, key_id: impl Into<String>, public_key: [u8; 32]) -> Self {
        self.trusted_keys.insert(key_id.into(), public_key);
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn key(&self, key_id: &str) -> Option<&[u8; 32]> {
        self.trusted_keys.get(key_id)
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.trusted_keys.keys().map(String::as_str)
    }

    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }
}

/// A single-use signing context.
///
/// `sign` consumes the session: the backend's aggregation state is
/// single-shot, so each digest gets a freshly opened session.
pub trait SigningSession: Send {
    fn sign(self: Box<Self>, digest: &Digest) -> Result<Vec<u8>, BackendError>;
}

/// Produces signature blobs.
pub trait SigningBackend: Send + Sync {
    /// Scheme written into envelope codings.
    fn scheme(&self) -> SignatureScheme;

    /// Open a session that embeds `identity` into the blob it produces.
    fn open_session(
        &self,
        identity: &IdentityMetadata,
    ) -> Result<Box<dyn SigningSession>, BackendError>;
}

/// Judges signature blobs. Stateless per call.
pub trait VerificationBackend: Send + Sync {
    /// The hash algorithm recorded inside a signature blob.
    fn input_algorithm(&self, signature: &[u8]) -> Result<HashAlgorithm, BackendError>;

    fn verify(
        &self,
        signature: &[u8],
        digest: &Digest,
        policy: &TrustPolicy,
    ) -> Result<BackendVerdict, BackendError>;
}

//! Local Ed25519 backend.
//!
//! Signature blobs are JSON seal records: the signed digest, the identity
//! metadata, the signing time and key id, and an Ed25519 signature over the
//! canonical form of everything else in the record.

use crate::backend::{
    BackendError, BackendVerdict, ReasonCode, SigningBackend, SigningSession, TrustPolicy,
    VerificationBackend,
};
use crate::envelope::SignatureScheme;
use crate::identity::{IdentityClaim, IdentityMetadata};
use chrono::{DateTime, Duration, Utc};
use ct_canon::{canonicalize_value, Digest, HashAlgorithm};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SCHEME_CODE: &str = "ED25519";
pub const SCHEME_DISPLAY: &str = "Ed25519 Signature";
pub const SEAL_FORMAT: &str = "application/vnd.content-trust.seal+json";

const RECORD_VERSION: u8 = 1;
const SIGNATURE_PREFIX: &str = "ed25519:";
/// Tolerated clock difference between signer and verifier.
const MAX_CLOCK_SKEW_MINUTES: i64 = 5;

/// Generate a new Ed25519 keypair.
///
/// Returns (private_key_bytes, public_key_bytes).
pub fn keygen() -> Result<([u8; 32], [u8; 32]), BackendError> {
    let mut private_bytes = [0u8; 32];
    getrandom::fill(&mut private_bytes)
        .map_err(|e| BackendError::Internal(format!("failed to generate random bytes: {e}")))?;
    let public_bytes = SigningKey::from_bytes(&private_bytes)
        .verifying_key()
        .to_bytes();
    Ok((private_bytes, public_bytes))
}

/// The signature blob produced by this backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SealRecord {
    pub version: u8,
    pub algorithm: HashAlgorithm,
    /// Hex digest of the sealed content.
    pub input_hash: String,
    #[serde(default)]
    pub metadata: Vec<IdentityClaim>,
    pub signed_at: DateTime<Utc>,
    pub key_id: String,
    /// `ed25519:<hex>`; empty while the record is being signed.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

impl SealRecord {
    pub fn decode(blob: &[u8]) -> Result<Self, BackendError> {
        serde_json::from_slice(blob)
            .map_err(|e| BackendError::Malformed(format!("Malformed signature: {e}")))
    }

    pub fn encode(&self) -> Result<Vec<u8>, BackendError> {
        serde_json::to_vec(self).map_err(|e| BackendError::Internal(e.to_string()))
    }

    /// Canonical bytes covered by the Ed25519 signature.
    fn signing_bytes(&self) -> Result<Vec<u8>, BackendError> {
        let mut unsigned = self.clone();
        unsigned.signature.clear();
        let value =
            serde_json::to_value(&unsigned).map_err(|e| BackendError::Internal(e.to_string()))?;
        let canonical =
            canonicalize_value(&value).map_err(|e| BackendError::Internal(e.to_string()))?;
        Ok(canonical.into_bytes())
    }
}

/// Signing side of the local backend.
pub struct Ed25519Signer {
    key: Arc<SigningKey>,
    key_id: String,
}

impl Ed25519Signer {
    pub fn new(key_id: impl Into<String>, private_key: &[u8; 32]) -> Self {
        Self {
            key: Arc::new(SigningKey::from_bytes(private_key)),
            key_id: key_id.into(),
        }
    }

    /// Signer with a freshly generated key.
    pub fn generate(key_id: impl Into<String>) -> Result<Self, BackendError> {
        let (private_key, _) = keygen()?;
        Ok(Self::new(key_id, &private_key))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Trust policy anchoring this signer's own key.
    pub fn trust_policy(&self) -> TrustPolicy {
        TrustPolicy::new().trust_key(self.key_id.clone(), self.public_key())
    }
}

impl SigningBackend for Ed25519Signer {
    fn scheme(&self) -> SignatureScheme {
        SignatureScheme {
            code: SCHEME_CODE.to_string(),
            display: SCHEME_DISPLAY.to_string(),
            format: SEAL_FORMAT.to_string(),
        }
    }

    fn open_session(
        &self,
        identity: &IdentityMetadata,
    ) -> Result<Box<dyn SigningSession>, BackendError> {
        Ok(Box::new(Ed25519Session {
            key: Arc::clone(&self.key),
            key_id: self.key_id.clone(),
            metadata: identity.claims().to_vec(),
        }))
    }
}

struct Ed25519Session {
    key: Arc<SigningKey>,
    key_id: String,
    metadata: Vec<IdentityClaim>,
}

impl Ed25519Session {
    fn seal(self, digest: &Digest, signed_at: DateTime<Utc>) -> Result<Vec<u8>, BackendError> {
        let mut record = SealRecord {
            version: RECORD_VERSION,
            algorithm: digest.algorithm(),
            input_hash: digest.to_hex(),
            metadata: self.metadata,
            signed_at,
            key_id: self.key_id,
            signature: String::new(),
        };
        let signature = self.key.sign(&record.signing_bytes()?);
        record.signature = format!("{SIGNATURE_PREFIX}{}", hex::encode(signature.to_bytes()));
        record.encode()
    }
}

impl SigningSession for Ed25519Session {
    fn sign(self: Box<Self>, digest: &Digest) -> Result<Vec<u8>, BackendError> {
        self.seal(digest, Utc::now())
    }
}

/// Verification side of the local backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn judge(
        &self,
        record: &SealRecord,
        digest: &Digest,
        policy: &TrustPolicy,
        now: DateTime<Utc>,
    ) -> Result<BackendVerdict, BackendError> {
        if record.version != RECORD_VERSION {
            return Err(BackendError::Malformed(format!(
                "Unsupported signature version {}",
                record.version
            )));
        }

        let signed_hash = hex::decode(&record.input_hash)
            .map_err(|_| BackendError::Malformed("Malformed signature input hash".to_string()))?;
        if record.algorithm != digest.algorithm() || signed_hash != digest.as_bytes() {
            return Ok(BackendVerdict::Rejected(ReasonCode::WrongDocument));
        }

        let Some(anchor) = policy.key(&record.key_id) else {
            return Ok(BackendVerdict::Rejected(ReasonCode::UntrustedKey));
        };
        let verifying_key = VerifyingKey::from_bytes(anchor).map_err(|_| {
            BackendError::Internal(format!("trust anchor {} is not a valid key", record.key_id))
        })?;
        let signature = parse_signature(&record.signature)?;
        if verifying_key
            .verify(&record.signing_bytes()?, &signature)
            .is_err()
        {
            return Ok(BackendVerdict::Rejected(ReasonCode::InvalidSignature));
        }

        if record.signed_at > now + Duration::minutes(MAX_CLOCK_SKEW_MINUTES) {
            return Ok(BackendVerdict::Rejected(ReasonCode::NotYetValid));
        }
        if let Some(max_age) = policy.max_age() {
            if now - record.signed_at > max_age {
                return Ok(BackendVerdict::Rejected(ReasonCode::Expired));
            }
        }

        Ok(BackendVerdict::Accepted)
    }
}

impl VerificationBackend for Ed25519Verifier {
    fn input_algorithm(&self, signature: &[u8]) -> Result<HashAlgorithm, BackendError> {
        Ok(SealRecord::decode(signature)?.algorithm)
    }

    fn verify(
        &self,
        signature: &[u8],
        digest: &Digest,
        policy: &TrustPolicy,
    ) -> Result<BackendVerdict, BackendError> {
        let record = SealRecord::decode(signature)?;
        self.judge(&record, digest, policy, Utc::now())
    }
}

fn parse_signature(text: &str) -> Result<ed25519_dalek::Signature, BackendError> {
    let malformed = || BackendError::Malformed("Malformed Ed25519 signature".to_string());
    let sig_hex = text.strip_prefix(SIGNATURE_PREFIX).ok_or_else(malformed)?;
    let sig_bytes = hex::decode(sig_hex).map_err(|_| malformed())?;
    let sig_array: [u8; 64] = sig_bytes.try_into().map_err(|_| malformed())?;
    Ok(ed25519_dalek::Signature::from_bytes(&sig_array))
}

use crate::config::{parse_signing_key, trust_policy, ServeArgs};
use anyhow::{bail, Result};
use ct_canon::HashAlgorithm;
use ct_seal::{
    Ed25519Signer, Ed25519Verifier, SigningOrchestrator, TrustPolicy, VerificationOrchestrator,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared per-process resources. Orchestrators hold no per-request state.
pub struct AppState {
    pub signing: SigningOrchestrator,
    pub verifying: VerificationOrchestrator,
    /// Bearer token claims copied into the signing identity, in order.
    pub identity_claims: Vec<String>,
}

impl AppState {
    pub fn new(
        signer: Ed25519Signer,
        policy: TrustPolicy,
        algorithm: HashAlgorithm,
        identity_claims: Vec<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            signing: SigningOrchestrator::new(Arc::new(signer), algorithm),
            verifying: VerificationOrchestrator::new(Arc::new(Ed25519Verifier), policy),
            identity_claims,
        })
    }

    pub fn from_args(args: &ServeArgs) -> Result<Arc<Self>> {
        if args.identity_claims.iter().any(|claim| claim.trim().is_empty()) {
            bail!("identity claim names must not be empty");
        }

        let signer = match &args.signing_key_hex {
            Some(hex_str) => Ed25519Signer::new(&args.key_id, &parse_signing_key(hex_str)?),
            None => {
                warn!("CT_SIGNING_KEY_HEX not set, generating ephemeral key (dev mode)");
                Ed25519Signer::generate(&args.key_id)?
            }
        };
        info!(
            key_id = signer.key_id(),
            public_key = %hex::encode(signer.public_key()),
            algorithm = %args.hash_algorithm,
            "signing key loaded"
        );

        let policy = trust_policy(
            signer.trust_policy(),
            &args.trusted_keys,
            args.max_signature_age_secs,
        )?;

        Ok(Self::new(
            signer,
            policy,
            args.hash_algorithm,
            args.identity_claims.clone(),
        ))
    }
}

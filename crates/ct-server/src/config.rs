//! Process configuration: command-line flags with environment fallbacks.

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use clap::Args;
use ct_canon::HashAlgorithm;
use ct_seal::TrustPolicy;
use std::net::SocketAddr;
use std::str::FromStr;

/// Default `RUST_LOG` filter for the binary.
pub const DEFAULT_LOG_FILTER: &str = "ct_server=info,ct_seal=info,axum=info";

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address the HTTP server binds to.
    #[arg(long, env = "CT_LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Hex-encoded 32-byte Ed25519 seed. An ephemeral key is used when unset.
    #[arg(long, env = "CT_SIGNING_KEY_HEX", hide_env_values = true)]
    pub signing_key_hex: Option<String>,

    /// Key id recorded in every seal produced by this service.
    #[arg(long, env = "CT_KEY_ID", default_value = "ct-local")]
    pub key_id: String,

    /// Additional trust anchors as `id=hex`. The service key is always trusted.
    #[arg(long = "trusted-key", env = "CT_TRUSTED_KEYS", value_delimiter = ',')]
    pub trusted_keys: Vec<TrustedKey>,

    /// Reject signatures older than this many seconds.
    #[arg(long, env = "CT_MAX_SIGNATURE_AGE_SECS")]
    pub max_signature_age_secs: Option<u64>,

    /// Digest algorithm for new signatures.
    #[arg(long, env = "CT_HASH_ALGORITHM", default_value_t = HashAlgorithm::Sha256)]
    pub hash_algorithm: HashAlgorithm,

    /// Bearer token claims copied into the signing identity, in order.
    #[arg(
        long = "identity-claim",
        env = "CT_IDENTITY_CLAIMS",
        value_delimiter = ',',
        default_value = "preferred_username"
    )]
    pub identity_claims: Vec<String>,
}

/// A trust anchor given on the command line as `id=hex`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedKey {
    pub key_id: String,
    pub public_key: [u8; 32],
}

impl FromStr for TrustedKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_id, key_hex) = s
            .split_once('=')
            .ok_or_else(|| format!("expected `id=hex`, got `{s}`"))?;
        let key_id = key_id.trim();
        if key_id.is_empty() {
            return Err("trusted key id must not be empty".to_string());
        }
        let bytes = hex::decode(key_hex.trim())
            .map_err(|e| format!("invalid hex key for {key_id}: {e}"))?;
        let public_key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| format!("public key for {key_id} must be 32 bytes"))?;
        Ok(Self {
            key_id: key_id.to_string(),
            public_key,
        })
    }
}

/// Extend `base` with extra anchors and an optional freshness rule.
pub fn trust_policy(
    base: TrustPolicy,
    keys: &[TrustedKey],
    max_age_secs: Option<u64>,
) -> Result<TrustPolicy> {
    let mut policy = keys.iter().fold(base, |policy, key| {
        policy.trust_key(key.key_id.clone(), key.public_key)
    });
    if let Some(secs) = max_age_secs {
        let secs = i64::try_from(secs).context("maximum signature age is too large")?;
        let max_age = Duration::try_seconds(secs)
            .ok_or_else(|| anyhow!("maximum signature age is too large"))?;
        policy = policy.with_max_age(max_age);
    }
    Ok(policy)
}

/// Decode a hex-encoded 32-byte Ed25519 seed.
pub fn parse_signing_key(hex_str: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(hex_str.trim()).context("signing key is not valid hex")?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("signing key must be 32 bytes (64 hex chars)"))
}

use crate::config::{trust_policy, TrustedKey};
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use ct_seal::{
    Ed25519Verifier, SignatureEnvelope, Status, TrustPolicy, VerificationOrchestrator,
    VerificationResponse,
};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Signed JSON document
    pub file: PathBuf,
    /// Trust anchor as `id=hex`; repeat for several keys
    #[arg(long = "trusted-key", required = true)]
    pub trusted_keys: Vec<TrustedKey>,
    /// Also verify the provenance sub-document
    #[arg(long)]
    pub provenance: bool,
    /// Reject signatures older than this many seconds
    #[arg(long)]
    pub max_age_secs: Option<u64>,
}

/// Verify a signed document on disk and print the verdicts.
pub fn cmd_verify(args: VerifyArgs) -> Result<()> {
    let input = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let resource: Value = serde_json::from_slice(&input)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    let resource_seal = SignatureEnvelope::from_field(resource.get("signature")).ok();
    let provenance_seal = resource
        .get("provenance")
        .and_then(|provenance| SignatureEnvelope::from_field(provenance.get("signature")).ok());

    let policy = trust_policy(TrustPolicy::new(), &args.trusted_keys, args.max_age_secs)?;
    let orchestrator = VerificationOrchestrator::new(Arc::new(Ed25519Verifier), policy);
    let report = orchestrator
        .verify_resource(resource, args.provenance)
        .context("verification aborted")?;

    print_verdict("Resource", &report.resource_validation_response);
    print_seal(resource_seal.as_ref());
    if let Some(provenance) = &report.provenance_validation_response {
        print_verdict("Provenance", provenance);
        print_seal(provenance_seal.as_ref());
    }

    if !report.all_ok() {
        bail!("{} did not verify", args.file.display());
    }
    Ok(())
}

fn print_verdict(label: &str, response: &VerificationResponse) {
    let message = response.message.as_deref().unwrap_or_default();
    match response.status {
        Status::Ok => println!("{} {}: {}", "✓".green().bold(), label.bold(), "OK".green()),
        Status::Failed => println!(
            "{} {}: {} {}",
            "✗".red().bold(),
            label.bold(),
            "FAILED".red(),
            message
        ),
        Status::Error => println!(
            "{} {}: {} {}",
            "!".yellow().bold(),
            label.bold(),
            "ERROR".yellow(),
            message
        ),
    }
}

fn print_seal(seal: Option<&SignatureEnvelope>) {
    let Some(seal) = seal else { return };
    let who = seal.signer_identity.as_deref().unwrap_or("unknown");
    println!(
        "    signed by {} at {}",
        who.bold(),
        seal.timestamp.to_rfc3339()
    );
}

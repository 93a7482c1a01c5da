use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use ct_canon::{canonicalize_bytes, Digest, HashAlgorithm};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct CanonArgs {
    /// JSON file to canonicalize
    pub file: PathBuf,
    /// Digest algorithm for the printed hash
    #[arg(long, default_value_t = HashAlgorithm::Sha256)]
    pub algorithm: HashAlgorithm,
}

/// Print the canonical form of a JSON file and its digest.
pub fn cmd_canon(args: CanonArgs) -> Result<()> {
    let input = fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let canonical = canonicalize_bytes(&input)
        .with_context(|| format!("failed to canonicalize {}", args.file.display()))?;
    let digest = Digest::compute(args.algorithm, &canonical);

    println!("{}", String::from_utf8_lossy(&canonical));
    println!("{}: {}", args.algorithm.id().bold(), digest.to_hex());
    Ok(())
}

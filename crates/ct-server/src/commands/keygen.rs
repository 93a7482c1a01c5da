use anyhow::Result;
use clap::Args;
use ct_seal::Ed25519Signer;

#[derive(Debug, Args)]
pub struct KeygenArgs {
    /// Key id recorded in seals made with the new key
    #[arg(long, default_value = "ct-local")]
    pub key_id: String,
}

/// Generate a signing key and print it as `ct serve` configuration.
///
/// The first line is the environment assignment for the service, the second
/// the anchor verifiers pass to `ct verify` or `ct serve --trusted-key`.
pub fn cmd_keygen(args: KeygenArgs) -> Result<()> {
    let (private_key, _) = ct_seal::keygen()?;
    let signer = Ed25519Signer::new(args.key_id, &private_key);

    println!("CT_KEY_ID={}", signer.key_id());
    println!("CT_SIGNING_KEY_HEX={}", hex::encode(private_key));
    println!(
        "--trusted-key {}={}",
        signer.key_id(),
        hex::encode(signer.public_key())
    );
    Ok(())
}

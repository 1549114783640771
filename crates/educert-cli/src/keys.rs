//! # Key Subcommands
//!
//! P-256 key generation and commitment signing.
//!
//! Keys are written as two files: `<prefix>.key` holds the 32-byte secret
//! scalar as hex, `<prefix>.pub` the uncompressed SEC1 public key as hex.
//! With `--pem` a `<prefix>.pem` SubjectPublicKeyInfo file is written too.
//!
//! ## Security Invariant
//!
//! The secret scalar is only ever written to the `.key` file; it is never
//! printed or logged.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::RngCore;

use educert_crypto::P256KeyPair;

/// Arguments for `educert keygen`.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "educert")]
    pub prefix: String,
    /// Also write the public key as SubjectPublicKeyInfo PEM.
    #[arg(long)]
    pub pem: bool,
}

/// Arguments for `educert sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Path to the private key file (hex-encoded 32-byte scalar).
    #[arg(long)]
    pub key: PathBuf,
    /// Commitment hash to sign (64 hex characters).
    #[arg(long)]
    pub hash: String,
}

/// Execute `educert keygen`.
pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    let written = generate_key_files(&args.output, &args.prefix, args.pem)?;
    println!("OK: generated P-256 keypair");
    println!("  Private key: {}", written.secret.display());
    println!("  Public key:  {}", written.public.display());
    if let Some(pem) = &written.pem {
        println!("  Public PEM:  {}", pem.display());
    }
    println!("  Public key (hex): {}", written.public_key_hex);
    Ok(0)
}

/// Execute `educert sign`. Prints the DER signature as hex.
pub fn run_sign(args: &SignArgs) -> Result<u8> {
    let keys = read_key_pair(&args.key)?;
    let signature = keys
        .sign_commitment_hex(&args.hash)
        .context("failed to sign commitment")?;
    println!("{signature}");
    Ok(0)
}

/// Paths written by [`generate_key_files`].
#[derive(Debug)]
pub struct KeyFiles {
    pub secret: PathBuf,
    pub public: PathBuf,
    pub pem: Option<PathBuf>,
    pub public_key_hex: String,
}

/// Generate a key pair and write it under `output_dir`.
pub fn generate_key_files(output_dir: &Path, prefix: &str, pem: bool) -> Result<KeyFiles> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("failed to create output directory: {}", output_dir.display())
    })?;

    let mut seed = [0u8; 32];
    let keys = loop {
        rand::rngs::OsRng.fill_bytes(&mut seed);
        // A scalar of zero or above the curve order is rejected; draw again.
        if let Ok(keys) = P256KeyPair::from_seed(&seed) {
            break keys;
        }
    };

    let secret = output_dir.join(format!("{prefix}.key"));
    let public = output_dir.join(format!("{prefix}.pub"));
    let public_key_hex = keys.public_key_hex();

    std::fs::write(&secret, hex::encode(seed))
        .with_context(|| format!("failed to write private key: {}", secret.display()))?;
    std::fs::write(&public, &public_key_hex)
        .with_context(|| format!("failed to write public key: {}", public.display()))?;

    let pem = if pem {
        let path = output_dir.join(format!("{prefix}.pem"));
        let text = keys.public_key_pem().context("failed to encode public key PEM")?;
        std::fs::write(&path, text)
            .with_context(|| format!("failed to write public key PEM: {}", path.display()))?;
        Some(path)
    } else {
        None
    };

    tracing::debug!(prefix, "key pair written");
    Ok(KeyFiles {
        secret,
        public,
        pem,
        public_key_hex,
    })
}

/// Load a key pair from a `.key` file.
pub fn read_key_pair(path: &Path) -> Result<P256KeyPair> {
    if !path.exists() {
        bail!("private key file not found: {}", path.display());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read private key: {}", path.display()))?;
    let bytes = hex::decode(text.trim()).context("invalid private key hex")?;
    let seed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
        anyhow::anyhow!(
            "private key must be 32 bytes (64 hex chars), got {} bytes",
            bytes.len()
        )
    })?;
    P256KeyPair::from_seed(&seed).context("invalid private key")
}

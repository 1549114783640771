//! # P-256 ECDSA Signing and Verification
//!
//! Issuer and holder both sign the credential commitment with
//! `SHA256withECDSA` over the raw 32 commitment bytes (the hex string is
//! decoded first, it is not signed as text).
//!
//! ## Accepted encodings
//!
//! - Public key: SubjectPublicKeyInfo PEM (`-----BEGIN PUBLIC KEY-----`),
//!   uncompressed SEC1 hex (`04 || x || y`, 130 chars) or bare coordinate
//!   hex (`x || y`, 128 chars). Hex may be either case. Compressed points
//!   are not accepted.
//! - Signature: DER hex, or fixed-width `r || s` hex (128 chars).
//!
//! [`canonical_public_key`] maps every accepted encoding of one key to the
//! same text, lowercase uncompressed SEC1 hex. Uniqueness checks and key
//! comparisons go through it.
//!
//! ## Security Invariant
//!
//! [`verify`] returns `bool` and treats every malformed key, hash or
//! signature as a failed check. Private keys are never serialized or
//! logged: `P256KeyPair` has no `Serialize` impl and a redacted `Debug`.

use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};

use educert_core::CommitmentHash;

use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Verify `signature_hex` over the commitment `message_hash_hex` with
/// `public_key` (PEM or coordinate hex).
pub fn verify(public_key: &str, message_hash_hex: &str, signature_hex: &str) -> bool {
    let Some(key) = parse_public_key(public_key) else {
        return false;
    };
    let Ok(message) = hex::decode(message_hash_hex.trim()) else {
        return false;
    };
    let Some(signature) = parse_signature(signature_hex) else {
        return false;
    };
    key.verify(&message, &signature).is_ok()
}

/// Parse a public key in any accepted encoding.
pub fn parse_public_key(text: &str) -> Option<VerifyingKey> {
    let text = text.trim();
    if text.starts_with("-----BEGIN") {
        return p256::PublicKey::from_public_key_pem(text)
            .ok()
            .map(VerifyingKey::from);
    }
    let mut bytes = hex::decode(text).ok()?;
    if bytes.len() == 64 {
        bytes.insert(0, 0x04);
    }
    if bytes.len() != 65 || bytes[0] != 0x04 {
        return None;
    }
    VerifyingKey::from_sec1_bytes(&bytes).ok()
}

/// Re-encode a public key in any accepted encoding as lowercase
/// uncompressed SEC1 hex. `None` if it does not parse.
pub fn canonical_public_key(text: &str) -> Option<String> {
    parse_public_key(text).map(|key| hex::encode(key.to_encoded_point(false).as_bytes()))
}

fn parse_signature(signature_hex: &str) -> Option<Signature> {
    let bytes = hex::decode(signature_hex.trim()).ok()?;
    Signature::from_der(&bytes)
        .or_else(|_| Signature::from_slice(&bytes))
        .ok()
}

// ---------------------------------------------------------------------------
// Key pair
// ---------------------------------------------------------------------------

/// A P-256 signing key for tooling and tests.
pub struct P256KeyPair {
    signing_key: SigningKey,
}

impl P256KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::rngs::OsRng),
        }
    }

    /// Create a key pair from a 32-byte secret scalar.
    ///
    /// # Errors
    ///
    /// `KeyError` if the scalar is zero or not below the curve order.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(seed).map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Ok(Self { signing_key })
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key().clone()
    }

    /// Uncompressed SEC1 public key as lowercase hex (`04 || x || y`).
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key().to_encoded_point(false).as_bytes())
    }

    /// SubjectPublicKeyInfo PEM with LF line endings.
    pub fn public_key_pem(&self) -> Result<String, CryptoError> {
        p256::PublicKey::from(self.verifying_key())
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyError(e.to_string()))
    }

    /// Sign the raw bytes of a commitment. Returns DER hex.
    pub fn sign_commitment(&self, commitment: &CommitmentHash) -> String {
        let signature: Signature = self.signing_key.sign(commitment.as_bytes());
        hex::encode(signature.to_der().as_bytes())
    }

    /// Sign a commitment given as hex text.
    ///
    /// # Errors
    ///
    /// `SigningFailed` if `message_hash_hex` is not 64 hex characters.
    pub fn sign_commitment_hex(&self, message_hash_hex: &str) -> Result<String, CryptoError> {
        let commitment = CommitmentHash::from_hex(message_hash_hex)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        Ok(self.sign_commitment(&commitment))
    }
}

impl std::fmt::Debug for P256KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P256KeyPair(<private>)")
    }
}

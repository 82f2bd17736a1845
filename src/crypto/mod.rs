use secp256k1::{Message, PublicKey, Secp256k1, ecdsa::Signature};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 over the inputs joined by a single space after sorting them,
/// so the order the caller passes them in never changes the digest.
pub fn crypto_hash(inputs: &[&str]) -> String {
    let mut sorted = inputs.to_vec();
    sorted.sort_unstable();
    let mut hasher = Sha256::new();
    hasher.update(sorted.join(" ").as_bytes());
    hex::encode(hasher.finalize())
}

/// Number of leading zero bits of a hex digest.
/// Non-hex characters end the count.
pub fn leading_zero_bits(hash_hex: &str) -> u32 {
    let mut total = 0u32;
    for c in hash_hex.chars() {
        match c.to_digit(16) {
            Some(0) => total += 4,
            Some(nibble) => {
                // nibble occupies the low 4 bits of the u32
                total += nibble.leading_zeros() - 28;
                break;
            }
            None => break,
        }
    }
    total
}

/// The 32-byte message that gets signed for `data`: the digest of `crypto_hash(data)`.
pub(crate) fn signing_message(data: &str) -> Result<Message> {
    let digest = hex::decode(crypto_hash(&[data]))?;
    Ok(Message::from_slice(&digest)?)
}

/// Verify a hex DER signature over `data` against a hex compressed public key.
/// Malformed keys or signatures verify as `false`.
pub fn verify_signature(public_key_hex: &str, signature_hex: &str, data: &str) -> bool {
    match try_verify(public_key_hex, signature_hex, data) {
        Ok(valid) => valid,
        Err(e) => {
            log::debug!("signature check failed to decode: {e}");
            false
        }
    }
}

fn try_verify(public_key_hex: &str, signature_hex: &str, data: &str) -> Result<bool> {
    let secp = Secp256k1::verification_only();
    let pk = PublicKey::from_slice(&hex::decode(public_key_hex)?)?;
    let sig = Signature::from_der(&hex::decode(signature_hex)?)?;
    let msg = signing_message(data)?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}

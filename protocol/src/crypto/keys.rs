//! # Key Material
//!
//! Ed25519 keypairs used to authorize inputs.
//!
//! Key storage and hierarchical derivation are the caller's business. This
//! module only wraps an already-derived signing key and knows how to turn its
//! public half into the compact pay-to-witness-pubkey-hash program that
//! locks outputs to it.
//!
//! Key bytes are never logged and never appear in `Debug` output.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use std::fmt;
use thiserror::Error;

use super::hash::ripemd160;

/// Errors that can occur while loading key material.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not hex")]
    InvalidSecretKey,
}

/// An Ed25519 keypair able to authorize spends and issuances.
///
/// Deliberately not `Serialize`: exporting a secret should be an explicit
/// call to [`Keypair::secret_key_bytes`].
///
/// # Examples
///
/// ```
/// use btm_offline::crypto::keys::Keypair;
///
/// let kp = Keypair::generate();
/// let sig = kp.sign(b"sighash");
/// assert!(kp.verify(b"sighash", &sig));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    pub fn from_seed(seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load a keypair from a hex-encoded 32-byte secret.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        let seed: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&seed))
    }

    pub fn secret_key_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.signing_key.to_bytes()
    }

    /// Raw 32-byte public key. This is the second witness argument of a
    /// pay-to-witness-pubkey-hash spend.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> bool {
        verify_signature(&self.public_key_bytes(), message, signature)
    }

    /// The control program that locks value to this key.
    pub fn p2wpkh_program(&self) -> Vec<u8> {
        p2wpkh_program(&self.public_key_bytes())
    }

    /// The single-key issuance program controlled by this key.
    pub fn issuance_program(&self) -> Vec<u8> {
        issuance_program(&self.public_key_bytes())
    }
}

/// Verify `signature` over `message` against a raw public key.
///
/// Malformed keys verify as `false` rather than erroring; callers only want
/// a yes/no answer.
pub fn verify_signature(public_key: &[u8; 32], message: &[u8], signature: &[u8; 64]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    verifying_key
        .verify(message, &Signature::from_bytes(signature))
        .is_ok()
}

/// Build `OP_0 OP_DATA_20 RIPEMD160(pubkey)`.
pub fn p2wpkh_program(public_key: &[u8; 32]) -> Vec<u8> {
    let mut program = Vec::with_capacity(22);
    program.push(0x00);
    program.push(0x14);
    program.extend_from_slice(&ripemd160(public_key));
    program
}

/// Build the 1-of-1 issuance program:
/// `OP_TXSIGHASH OP_DATA_32 <pubkey> OP_1 OP_1 OP_CHECKMULTISIG`.
pub fn issuance_program(public_key: &[u8; 32]) -> Vec<u8> {
    let mut program = Vec::with_capacity(37);
    program.push(0xae);
    program.push(0x20);
    program.extend_from_slice(public_key);
    program.extend_from_slice(&[0x51, 0x51, 0xad]);
    program
}

/// Extract the 20-byte key hash if `program` is pay-to-witness-pubkey-hash.
pub fn p2wpkh_key_hash(program: &[u8]) -> Option<&[u8]> {
    match program {
        [0x00, 0x14, hash @ ..] if hash.len() == 20 => Some(hash),
        _ => None,
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(pub={})", self.public_key_hex())
    }
}

impl PartialEq for Keypair {
    /// Compared by public key; secret material is never compared directly.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for Keypair {}

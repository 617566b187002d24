//! # Cryptographic Primitives
//!
//! Thin wrappers around audited implementations: SHA3-256 and RIPEMD-160
//! from RustCrypto, Ed25519 from ed25519-dalek. Nothing here is
//! hand-rolled.

pub mod hash;
pub mod keys;

pub use hash::{ripemd160, sha3_256, sha3_256_multi, AssetId, Hash};
pub use keys::{issuance_program, p2wpkh_program, Keypair};

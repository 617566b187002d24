//! Witness derivation with Ed25519 keypairs.
//!
//! Signing runs once the transaction id is final. Each input signs its own
//! signature hash, `SHA3-256(input_entry_id ‖ tx_id)`, so a witness commits
//! to both the input and the whole transaction.
//!
//! Key material is never owned here. The caller hands in a [`KeyProvider`]
//! (an in-memory [`KeyRing`] is provided) and the signer looks keys up by the
//! program they must satisfy.

use std::collections::HashMap;

use tracing::debug;

use super::error::SigningError;
use super::graph::MappedTransaction;
use super::raw::Witness;
use super::types::Input;
use crate::crypto::hash::{ripemd160, Hash};
use crate::crypto::keys::{p2wpkh_key_hash, verify_signature, Keypair};

/// Source of signing keys, looked up by the program an input must satisfy.
///
/// For a spend the program is the spent output's control program; for an
/// issuance it is the issuance program.
pub trait KeyProvider {
    fn keypair_for(&self, program: &[u8]) -> Option<&Keypair>;
}

/// A simple in-memory [`KeyProvider`].
///
/// # Examples
///
/// ```
/// use btm_offline::crypto::keys::Keypair;
/// use btm_offline::transaction::{KeyProvider, KeyRing};
///
/// let kp = Keypair::from_seed(&[1u8; 32]);
/// let mut ring = KeyRing::new();
/// ring.insert(kp.clone());
/// assert_eq!(ring.keypair_for(&kp.p2wpkh_program()), Some(&kp));
/// assert_eq!(ring.keypair_for(&kp.issuance_program()), Some(&kp));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<Vec<u8>, Keypair>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `keypair` for its pay-to-witness-pubkey-hash program and its
    /// single-key issuance program.
    pub fn insert(&mut self, keypair: Keypair) {
        self.keys
            .insert(keypair.issuance_program(), keypair.clone());
        self.keys.insert(keypair.p2wpkh_program(), keypair);
    }

    /// Register `keypair` for an arbitrary issuance program.
    pub fn insert_for_program(&mut self, program: Vec<u8>, keypair: Keypair) {
        self.keys.insert(program, keypair);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<Keypair> for KeyRing {
    fn from_iter<I: IntoIterator<Item = Keypair>>(iter: I) -> Self {
        let mut ring = KeyRing::new();
        for keypair in iter {
            ring.insert(keypair);
        }
        ring
    }
}

impl KeyProvider for KeyRing {
    fn keypair_for(&self, program: &[u8]) -> Option<&Keypair> {
        self.keys.get(program)
    }
}

/// Derive one witness per input, in input order.
///
/// The first failure aborts the whole fold; no partial witness list is ever
/// returned.
pub fn sign_inputs(
    inputs: &[Input],
    mapped: &MappedTransaction,
    keys: &dyn KeyProvider,
) -> Result<Vec<Witness>, SigningError> {
    inputs
        .iter()
        .zip(&mapped.input_ids)
        .enumerate()
        .map(|(index, (input, input_id))| {
            let sighash = super::graph::sighash(input_id, &mapped.tx_id);
            sign_input(index, input, &sighash, keys)
        })
        .collect()
}

fn sign_input(
    index: usize,
    input: &Input,
    sighash: &Hash,
    keys: &dyn KeyProvider,
) -> Result<Witness, SigningError> {
    let program = input.program();
    let witness = match input {
        Input::Spend(_) => {
            let key_hash =
                p2wpkh_key_hash(program).ok_or_else(|| SigningError::UnsupportedProgram {
                    index,
                    program: hex::encode(program),
                })?;
            let keypair = lookup(index, program, keys)?;
            if ripemd160(&keypair.public_key_bytes()) != key_hash {
                return Err(SigningError::KeyMismatch { index });
            }
            vec![
                keypair.sign(sighash.as_bytes()).to_vec(),
                keypair.public_key_bytes().to_vec(),
            ]
        }
        Input::Issuance(_) => {
            let keypair = lookup(index, program, keys)?;
            if let Some(embedded) = single_key_issuance_pubkey(program) {
                if embedded != keypair.public_key_bytes() {
                    return Err(SigningError::KeyMismatch { index });
                }
            }
            vec![keypair.sign(sighash.as_bytes()).to_vec()]
        }
    };

    debug!(index, issuance = input.is_issuance(), "input signed");
    Ok(witness)
}

fn lookup<'k>(
    index: usize,
    program: &[u8],
    keys: &'k dyn KeyProvider,
) -> Result<&'k Keypair, SigningError> {
    keys.keypair_for(program)
        .ok_or_else(|| SigningError::MissingKey {
            index,
            program: hex::encode(program),
        })
}

/// The public key embedded in a 1-of-1 issuance program, if `program` is one.
fn single_key_issuance_pubkey(program: &[u8]) -> Option<&[u8]> {
    match program {
        [0xae, 0x20, rest @ ..] if rest.len() == 35 && rest[32..] == [0x51, 0x51, 0xad] => {
            Some(&rest[..32])
        }
        _ => None,
    }
}

/// Check a witness produced by [`sign_inputs`] against its signature hash.
pub fn verify_witness(input: &Input, witness: &[Vec<u8>], sighash: &Hash) -> bool {
    let signature: Option<[u8; 64]> = witness
        .first()
        .and_then(|sig| sig.as_slice().try_into().ok());
    let Some(signature) = signature else {
        return false;
    };

    let public_key: Option<[u8; 32]> = match input {
        Input::Spend(spend) => witness
            .get(1)
            .and_then(|pk| pk.as_slice().try_into().ok())
            .filter(|pk: &[u8; 32]| {
                p2wpkh_key_hash(&spend.control_program) == Some(&ripemd160(pk)[..])
            }),
        Input::Issuance(issuance) => single_key_issuance_pubkey(&issuance.issuance_program)
            .and_then(|pk| pk.try_into().ok()),
    };

    public_key
        .map(|pk| verify_signature(&pk, sighash.as_bytes(), &signature))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FEE_ASSET_ID;
    use crate::transaction::graph::{map_transaction, sighash};
    use crate::transaction::types::{IssuanceInput, Output, SpendInput};

    fn spend_for(kp: &Keypair, amount: u64) -> Input {
        Input::Spend(SpendInput {
            source_id: Hash::new([0x44; 32]),
            source_position: 1,
            asset_id: FEE_ASSET_ID,
            amount,
            control_program: kp.p2wpkh_program(),
            vm_version: 1,
        })
    }

    fn issuance_for(kp: &Keypair) -> Input {
        Input::Issuance(IssuanceInput {
            nonce: vec![7; 8],
            asset_definition: b"{\"name\":\"TOKEN\"}".to_vec(),
            issuance_program: kp.issuance_program(),
            vm_version: 1,
            amount: 10,
        })
    }

    fn mapped(inputs: &[Input]) -> MappedTransaction {
        let mut outputs = Vec::new();
        for input in inputs {
            outputs.push(Output::new(
                input.asset_id().unwrap(),
                input.amount(),
                vec![0x51],
            ));
        }
        map_transaction(1, 0, inputs, &outputs).unwrap()
    }

    #[test]
    fn spend_witness_is_signature_and_pubkey() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let inputs = vec![spend_for(&kp, 100)];
        let mapped = mapped(&inputs);
        let ring: KeyRing = std::iter::once(kp.clone()).collect();

        let witnesses = sign_inputs(&inputs, &mapped, &ring).unwrap();
        assert_eq!(witnesses.len(), 1);
        assert_eq!(witnesses[0].len(), 2);
        assert_eq!(witnesses[0][0].len(), 64);
        assert_eq!(witnesses[0][1], kp.public_key_bytes().to_vec());

        let msg = sighash(&mapped.input_ids[0], &mapped.tx_id);
        assert!(verify_witness(&inputs[0], &witnesses[0], &msg));
        assert!(!verify_witness(&inputs[0], &witnesses[0], &mapped.tx_id));
    }

    #[test]
    fn issuance_witness_is_signature_only() {
        let kp = Keypair::from_seed(&[2u8; 32]);
        let inputs = vec![issuance_for(&kp)];
        let mapped = mapped(&inputs);
        let mut ring = KeyRing::new();
        ring.insert(kp);

        let witnesses = sign_inputs(&inputs, &mapped, &ring).unwrap();
        assert_eq!(witnesses[0].len(), 1);
        let msg = sighash(&mapped.input_ids[0], &mapped.tx_id);
        assert!(verify_witness(&inputs[0], &witnesses[0], &msg));
    }

    #[test]
    fn missing_key_aborts_with_index() {
        let kp1 = Keypair::from_seed(&[1u8; 32]);
        let kp2 = Keypair::from_seed(&[2u8; 32]);
        let inputs = vec![spend_for(&kp1, 5), spend_for(&kp2, 6)];
        let mapped = mapped(&inputs);
        let mut ring = KeyRing::new();
        ring.insert(kp1);

        let err = sign_inputs(&inputs, &mapped, &ring).unwrap_err();
        assert!(matches!(err, SigningError::MissingKey { index: 1, .. }));
    }

    #[test]
    fn non_p2wpkh_spend_is_unsupported() {
        let kp = Keypair::from_seed(&[1u8; 32]);
        let inputs = vec![Input::Spend(SpendInput {
            source_id: Hash::new([0x44; 32]),
            source_position: 0,
            asset_id: FEE_ASSET_ID,
            amount: 5,
            control_program: vec![0x51],
            vm_version: 1,
        })];
        let mapped = mapped(&inputs);
        let mut ring = KeyRing::new();
        ring.insert_for_program(vec![0x51], kp);

        let err = sign_inputs(&inputs, &mapped, &ring).unwrap_err();
        assert_eq!(
            err,
            SigningError::UnsupportedProgram {
                index: 0,
                program: "51".into()
            }
        );
    }

    #[test]
    fn wrong_key_for_program_is_mismatch() {
        let owner = Keypair::from_seed(&[1u8; 32]);
        let other = Keypair::from_seed(&[3u8; 32]);
        let inputs = vec![spend_for(&owner, 5)];
        let mapped = mapped(&inputs);
        let mut ring = KeyRing::new();
        ring.insert_for_program(owner.p2wpkh_program(), other);

        let err = sign_inputs(&inputs, &mapped, &ring).unwrap_err();
        assert_eq!(err, SigningError::KeyMismatch { index: 0 });
    }

    #[test]
    fn custom_issuance_program_uses_registered_key() {
        let kp = Keypair::from_seed(&[4u8; 32]);
        let inputs = vec![Input::Issuance(IssuanceInput {
            nonce: vec![1; 8],
            asset_definition: vec![],
            issuance_program: vec![0x51],
            vm_version: 1,
            amount: 3,
        })];
        let mapped = mapped(&inputs);
        let mut ring = KeyRing::new();
        ring.insert_for_program(vec![0x51], kp);

        let witnesses = sign_inputs(&inputs, &mapped, &ring).unwrap();
        assert_eq!(witnesses[0][0].len(), 64);
    }

    #[test]
    fn key_ring_registers_both_programs() {
        let kp = Keypair::from_seed(&[5u8; 32]);
        let ring: KeyRing = vec![kp.clone()].into_iter().collect();
        assert_eq!(ring.len(), 2);
        assert!(ring.keypair_for(&kp.p2wpkh_program()).is_some());
        assert!(ring.keypair_for(&kp.issuance_program()).is_some());
        assert!(ring.keypair_for(&[0x00]).is_none());
    }
}

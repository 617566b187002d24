//! Caller-facing input and output types.
//!
//! These are plain data: the builder owns them until the pipeline finishes,
//! and the derived parts (entry ids, witnesses, fee) live on the final
//! [`super::Transaction`], never here.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::{is_retirement_program, FEE_ASSET_ID, VM_VERSION};
use crate::crypto::hash::{AssetId, Hash};
use crate::encoding::SerializationError;
use crate::entry::types::hex_bytes;
use crate::entry::{AssetAmount, AssetDefinition, Program};

fn default_vm_version() -> u64 {
    VM_VERSION
}

/// Spends an existing unspent output.
///
/// `source_id` and `source_position` identify the output the way the node
/// reports it (the id of the mux that produced it and the position within
/// that mux), together with its asset, amount and control program. The
/// builder rebuilds the prior output entry from these fields to derive the
/// spent output id, so every field must match chain data exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendInput {
    pub source_id: Hash,
    pub source_position: u64,
    pub asset_id: AssetId,
    pub amount: u64,
    #[serde(with = "hex_bytes")]
    pub control_program: Vec<u8>,
    #[serde(default = "default_vm_version")]
    pub vm_version: u64,
}

/// Mints `amount` units of the asset defined by `issuance_program` and
/// `asset_definition`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceInput {
    /// Makes otherwise identical issuances distinct.
    #[serde(with = "hex_bytes")]
    pub nonce: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub asset_definition: Vec<u8>,
    #[serde(with = "hex_bytes")]
    pub issuance_program: Vec<u8>,
    #[serde(default = "default_vm_version")]
    pub vm_version: u64,
    pub amount: u64,
}

impl IssuanceInput {
    /// A fresh 8-byte nonce from the OS RNG.
    pub fn random_nonce() -> Vec<u8> {
        let mut nonce = vec![0u8; 8];
        rand::rngs::OsRng.fill_bytes(&mut nonce);
        nonce
    }

    pub fn asset_definition(&self) -> AssetDefinition {
        AssetDefinition::new(
            Program::new(self.vm_version, self.issuance_program.clone()),
            &self.asset_definition,
        )
    }

    /// Asset id derived from the issuance program and definition.
    pub fn asset_id(&self) -> Result<AssetId, SerializationError> {
        self.asset_definition().compute_asset_id()
    }

    pub fn nonce_hash(&self) -> Hash {
        Hash::digest(&self.nonce)
    }
}

/// One transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
    Spend(SpendInput),
    Issuance(IssuanceInput),
}

impl Input {
    pub fn amount(&self) -> u64 {
        match self {
            Input::Spend(s) => s.amount,
            Input::Issuance(i) => i.amount,
        }
    }

    pub fn asset_id(&self) -> Result<AssetId, SerializationError> {
        match self {
            Input::Spend(s) => Ok(s.asset_id),
            Input::Issuance(i) => i.asset_id(),
        }
    }

    pub fn asset_amount(&self) -> Result<AssetAmount, SerializationError> {
        Ok(AssetAmount::new(self.asset_id()?, self.amount()))
    }

    /// The program that must be satisfied to use this input: the spent
    /// output's control program, or the issuance program.
    pub fn program(&self) -> &[u8] {
        match self {
            Input::Spend(s) => &s.control_program,
            Input::Issuance(i) => &i.issuance_program,
        }
    }

    pub fn is_issuance(&self) -> bool {
        matches!(self, Input::Issuance(_))
    }
}

impl From<SpendInput> for Input {
    fn from(input: SpendInput) -> Self {
        Input::Spend(input)
    }
}

impl From<IssuanceInput> for Input {
    fn from(input: IssuanceInput) -> Self {
        Input::Issuance(input)
    }
}

/// A requested output. Programs starting with `OP_FAIL` retire the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub asset_id: AssetId,
    pub amount: u64,
    #[serde(with = "hex_bytes")]
    pub control_program: Vec<u8>,
}

impl Output {
    pub fn new(asset_id: AssetId, amount: u64, control_program: Vec<u8>) -> Self {
        Self {
            asset_id,
            amount,
            control_program,
        }
    }

    /// An output of the native fee asset.
    pub fn fee_asset(amount: u64, control_program: Vec<u8>) -> Self {
        Self::new(FEE_ASSET_ID, amount, control_program)
    }

    pub fn asset_amount(&self) -> AssetAmount {
        AssetAmount::new(self.asset_id, self.amount)
    }

    pub fn is_retirement(&self) -> bool {
        is_retirement_program(&self.control_program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OP_RETIRE;

    fn issuance() -> IssuanceInput {
        IssuanceInput {
            nonce: vec![1, 2, 3, 4, 5, 6, 7, 8],
            asset_definition: b"{\"name\":\"GOLD\"}".to_vec(),
            issuance_program: vec![0xae],
            vm_version: 1,
            amount: 100,
        }
    }

    #[test]
    fn issuance_asset_id_is_stable() {
        let a = issuance().asset_id().unwrap();
        let b = issuance().asset_id().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, FEE_ASSET_ID);
    }

    #[test]
    fn random_nonces_differ() {
        let a = IssuanceInput::random_nonce();
        let b = IssuanceInput::random_nonce();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn retirement_outputs_detected() {
        assert!(Output::fee_asset(1, vec![OP_RETIRE, 0x00]).is_retirement());
        assert!(!Output::fee_asset(1, vec![0x00, 0x14]).is_retirement());
    }

    #[test]
    fn input_json_is_tagged() {
        let input = Input::Spend(SpendInput {
            source_id: Hash::new([1; 32]),
            source_position: 0,
            asset_id: FEE_ASSET_ID,
            amount: 10,
            control_program: vec![0x00, 0x14],
            vm_version: 1,
        });
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["type"], "spend");
        assert_eq!(json["control_program"], "0014");
        let back: Input = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn vm_version_defaults_to_one() {
        let json = format!(
            r#"{{"type":"spend","source_id":"{}","source_position":2,"asset_id":"{}","amount":5,"control_program":"51"}}"#,
            "11".repeat(32),
            "ff".repeat(32)
        );
        let input: Input = serde_json::from_str(&json).unwrap();
        match input {
            Input::Spend(s) => assert_eq!(s.vm_version, 1),
            Input::Issuance(_) => panic!("expected spend"),
        }
    }
}

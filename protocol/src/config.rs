//! # Ledger Configuration & Constants
//!
//! Every consensus-relevant constant used by the offline builder lives here.
//! Changing any value in the first two sections changes transaction ids and
//! invalidates signatures, so they track the target ledger exactly.
//!
//! The fee parameters are approximations of the node's own estimator and are
//! exposed as a [`FeeSchedule`] so callers can override them without a
//! rebuild.

use serde::{Deserialize, Serialize};

use crate::crypto::hash::AssetId;

// ---------------------------------------------------------------------------
// Wire Format
// ---------------------------------------------------------------------------

/// Leading byte of every serialized transaction: all serialization flags set
/// (asset versions, witnesses and commitment suffixes present).
pub const SERIALIZATION_FLAGS: u8 = 0x07;

/// Asset version written in front of every input and output.
pub const ASSET_VERSION: u64 = 1;

/// VM version used for freshly built programs.
pub const VM_VERSION: u64 = 1;

/// Default transaction version.
pub const TX_VERSION: u64 = 1;

/// Commitment type byte of an issuance input.
pub const ISSUANCE_INPUT_TYPE: u8 = 0x00;

/// Commitment type byte of a spend input.
pub const SPEND_INPUT_TYPE: u8 = 0x01;

// ---------------------------------------------------------------------------
// Entry Graph
// ---------------------------------------------------------------------------

/// The native fee asset. 32 bytes of 0xff.
pub const FEE_ASSET_ID: AssetId = AssetId::new([0xff; 32]);

/// `OP_FAIL`. A control program starting with this byte burns its value.
pub const OP_RETIRE: u8 = 0x6a;

/// `OP_TRUE`. The mux accepts unconditionally.
pub const OP_TRUE: u8 = 0x51;

/// Domain prefix mixed into every entry id.
pub const ENTRY_ID_PREFIX: &[u8] = b"entryid:";

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Granularity the fee is rounded up to, in neu.
pub const DEFAULT_BASE_RATE: u64 = 100_000;

/// Fixed gas charged to every transaction regardless of size.
pub const DEFAULT_FLEXIBLE_GAS: u64 = 1_800;

/// Neu paid per unit of gas.
pub const DEFAULT_VM_GAS_RATE: u64 = 200;

/// Gas per serialized byte.
pub const DEFAULT_STORAGE_GAS_RATE: u64 = 1;

/// Witness bytes budgeted per input (one signature plus one public key,
/// with quorum fixed at 1).
pub const DEFAULT_BASE_WITNESS_SIZE: u64 = 300;

/// Gas charged per input locked by a pay-to-witness-pubkey-hash program.
pub const DEFAULT_P2WPKH_GAS: u64 = 1_419;

/// Byte length of a pay-to-witness-pubkey-hash control program:
/// `OP_0 OP_DATA_20 <20-byte hash>`.
pub const P2WPKH_PROGRAM_LEN: usize = 22;

/// Change at or below this amount is dropped instead of creating an output.
pub const DEFAULT_DUST_THRESHOLD: u64 = 10_000;

// ---------------------------------------------------------------------------
// FeeSchedule
// ---------------------------------------------------------------------------

/// Tunable parameters of the fee estimator.
///
/// `Default` yields the ledger's mainnet values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub base_rate: u64,
    pub flexible_gas: u64,
    pub vm_gas_rate: u64,
    pub storage_gas_rate: u64,
    pub base_witness_size: u64,
    pub p2wpkh_gas: u64,
    pub p2wpkh_program_len: usize,
    pub dust_threshold: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            base_rate: DEFAULT_BASE_RATE,
            flexible_gas: DEFAULT_FLEXIBLE_GAS,
            vm_gas_rate: DEFAULT_VM_GAS_RATE,
            storage_gas_rate: DEFAULT_STORAGE_GAS_RATE,
            base_witness_size: DEFAULT_BASE_WITNESS_SIZE,
            p2wpkh_gas: DEFAULT_P2WPKH_GAS,
            p2wpkh_program_len: P2WPKH_PROGRAM_LEN,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
        }
    }
}

/// Returns `true` if `program` is a retirement (burn) program.
pub fn is_retirement_program(program: &[u8]) -> bool {
    program.first() == Some(&OP_RETIRE)
}

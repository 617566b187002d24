//! Build requests and reports: the JSON that goes in and out of `build`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use btm_offline::config::{FeeSchedule, TX_VERSION};
use btm_offline::crypto::hash::Hash;
use btm_offline::crypto::keys::Keypair;
use btm_offline::transaction::{
    map_transaction, Input, KeyRing, MappedOutput, Output, RawTransaction, Transaction,
    TransactionBuilder,
};

fn default_version() -> u64 {
    TX_VERSION
}

/// A transaction to build, as read from disk.
///
/// ```json
/// {
///   "time_range": 0,
///   "inputs": [{ "type": "spend", "source_id": "…", "source_position": 0,
///                "asset_id": "ff…ff", "amount": 1000000,
///                "control_program": "0014…" }],
///   "outputs": [],
///   "change_program": "0014…",
///   "keys": ["<hex ed25519 secret>"]
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BuildRequest {
    #[serde(default = "default_version")]
    pub version: u64,
    #[serde(default)]
    pub time_range: u64,
    pub inputs: Vec<Input>,
    #[serde(default)]
    pub outputs: Vec<Output>,
    /// Hex control program receiving the change.
    pub change_program: String,
    /// Hex Ed25519 secret keys.
    #[serde(default)]
    pub keys: Vec<String>,
}

impl BuildRequest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read request {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse request {}", path.display()))
    }

    pub fn key_ring(&self) -> Result<KeyRing> {
        self.keys
            .iter()
            .enumerate()
            .map(|(i, secret)| {
                Keypair::from_hex(secret.trim()).with_context(|| format!("key {} is invalid", i))
            })
            .collect()
    }

    /// Run the pipeline.
    pub fn build(self, schedule: &FeeSchedule) -> Result<Transaction> {
        let keys = self.key_ring()?;
        let change_program = hex::decode(self.change_program.trim())
            .context("change_program is not valid hex")?;

        let tx = TransactionBuilder::new()
            .version(self.version)
            .time_range(self.time_range)
            .add_inputs(self.inputs)
            .add_outputs(self.outputs)
            .build(&change_program, &keys, schedule)
            .context("transaction build failed")?;
        Ok(tx)
    }
}

/// Load a fee schedule override, or the defaults when `path` is `None`.
pub fn load_fee_schedule(path: Option<&Path>) -> Result<FeeSchedule> {
    let Some(path) = path else {
        return Ok(FeeSchedule::default());
    };
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fee schedule {}", path.display()))?;
    serde_json::from_str(&data)
        .with_context(|| format!("failed to parse fee schedule {}", path.display()))
}

/// Summary printed by `build`.
#[derive(Debug, Serialize)]
pub struct BuildReport<'a> {
    pub tx_id: Hash,
    pub fee: u64,
    pub estimated_fee: u64,
    pub size: u64,
    pub raw_transaction: &'a str,
    pub outputs: &'a [MappedOutput],
}

impl<'a> From<&'a Transaction> for BuildReport<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            tx_id: tx.tx_id(),
            fee: tx.fee(),
            estimated_fee: tx.estimated_fee(),
            size: tx.size(),
            raw_transaction: tx.raw_transaction(),
            outputs: tx.outputs(),
        }
    }
}

/// Output of `decode`: the parsed transaction and its recomputed id.
#[derive(Debug, Serialize)]
pub struct DecodeReport {
    pub tx_id: Hash,
    pub transaction: RawTransaction,
}

pub fn decode(hex_str: &str) -> Result<DecodeReport> {
    let transaction =
        RawTransaction::from_hex(hex_str.trim()).context("failed to decode raw transaction")?;
    let (inputs, outputs) = transaction.clone().into_parts();
    let mapped = map_transaction(
        transaction.version,
        transaction.time_range,
        &inputs,
        &outputs,
    )
    .context("failed to map decoded transaction")?;
    Ok(DecodeReport {
        tx_id: mapped.tx_id,
        transaction,
    })
}

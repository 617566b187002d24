//! Transaction construction via the builder pattern.
//!
//! [`TransactionBuilder`] collects the caller's inputs and outputs and hands
//! them to a fixed pipeline of pure stage functions:
//!
//! ```text
//! Draft ─validate─► Validated ─estimate─► FeeEstimated ─map_graph─► GraphMapped
//!                                                                       │
//!                         Transaction ◄─finalize─ Signed ◄─sign─────────┘
//! ```
//!
//! Each stage consumes the previous record and returns the next one or a
//! [`TxError`]. Nothing is mutated in place, and nothing partially built
//! ever leaves [`TransactionBuilder::build`]: the caller gets a fully signed
//! [`Transaction`] or an error.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::error::{GraphMappingError, TxError, ValidationError};
use super::fee::{estimate_fee, finalize_outputs};
use super::graph::{map_transaction, verify_conservation, MappedTransaction};
use super::raw::{encode_transaction, serialize_arguments, Witness};
use super::signing::{sign_inputs, KeyProvider};
use super::types::{Input, Output};
use crate::config::{FeeSchedule, TX_VERSION};
use crate::encoding::MAX_VARINT63;
use crate::crypto::hash::Hash;

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// The pipeline stages, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    Draft,
    Validated,
    FeeEstimated,
    GraphMapped,
    Signed,
    Final,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BuildStage::Draft => "draft",
            BuildStage::Validated => "validated",
            BuildStage::FeeEstimated => "fee-estimated",
            BuildStage::GraphMapped => "graph-mapped",
            BuildStage::Signed => "signed",
            BuildStage::Final => "final",
        };
        write!(f, "{}", s)
    }
}

/// Everything the caller asked for, unchecked.
#[derive(Debug, Clone)]
pub struct Draft {
    pub version: u64,
    pub time_range: u64,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub change_program: Vec<u8>,
}

/// A draft whose fields passed [`validate`].
#[derive(Debug, Clone)]
pub struct Validated {
    draft: Draft,
}

/// The final output list, with the fee taken out of the change.
#[derive(Debug, Clone)]
pub struct FeeEstimated {
    version: u64,
    time_range: u64,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    fee: u64,
    estimated_fee: u64,
    has_change: bool,
}

/// The final entry graph; the transaction id is fixed from here on.
#[derive(Debug)]
pub struct GraphMapped {
    estimated: FeeEstimated,
    mapped: MappedTransaction,
}

/// One witness per input.
#[derive(Debug)]
pub struct Signed {
    graph: GraphMapped,
    witnesses: Vec<Witness>,
}

/// Check every caller-supplied field.
pub fn validate(draft: Draft) -> Result<Validated, TxError> {
    check_draft(&draft).map_err(|e| TxError::new(BuildStage::Validated, e))?;

    debug!(
        stage = %BuildStage::Validated,
        inputs = draft.inputs.len(),
        outputs = draft.outputs.len(),
        "draft validated"
    );
    Ok(Validated { draft })
}

fn check_draft(draft: &Draft) -> Result<(), ValidationError> {
    if draft.version < 1 || draft.version > MAX_VARINT63 {
        return Err(ValidationError::InvalidVersion(draft.version));
    }
    if draft.time_range > MAX_VARINT63 {
        return Err(ValidationError::InvalidTimeRange(draft.time_range));
    }
    if draft.inputs.is_empty() {
        return Err(ValidationError::NoInputs);
    }

    for (index, input) in draft.inputs.iter().enumerate() {
        let reason = match input {
            Input::Spend(s) if s.control_program.is_empty() => Some("control program is empty"),
            Input::Issuance(i) if i.nonce.is_empty() => Some("nonce is empty"),
            Input::Issuance(i) if i.issuance_program.is_empty() => {
                Some("issuance program is empty")
            }
            _ if input.amount() == 0 => Some("amount must be positive"),
            _ if input.amount() > MAX_VARINT63 => Some("amount exceeds the 63-bit limit"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(ValidationError::InvalidInput { index, reason });
        }
    }

    for (index, output) in draft.outputs.iter().enumerate() {
        let reason = if output.control_program.is_empty() {
            Some("control program is empty")
        } else if output.amount == 0 {
            Some("amount must be positive")
        } else if output.amount > MAX_VARINT63 {
            Some("amount exceeds the 63-bit limit")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ValidationError::InvalidOutput { index, reason });
        }
    }

    if draft.change_program.is_empty() {
        return Err(ValidationError::EmptyChangeProgram);
    }
    Ok(())
}

/// Estimate the fee from a provisional build and settle the change.
pub fn estimate(validated: Validated, schedule: &FeeSchedule) -> Result<FeeEstimated, TxError> {
    let Draft {
        version,
        time_range,
        inputs,
        outputs,
        change_program,
    } = validated.draft;

    let estimate = estimate_fee(
        version,
        time_range,
        &inputs,
        &outputs,
        &change_program,
        schedule,
    )
    .map_err(|e| TxError::new(BuildStage::FeeEstimated, e))?;
    let finalized = finalize_outputs(&outputs, &estimate, &change_program, schedule)
        .map_err(|e| TxError::new(BuildStage::FeeEstimated, e))?;

    debug!(
        stage = %BuildStage::FeeEstimated,
        fee = finalized.fee,
        estimated_fee = finalized.estimated_fee,
        change = ?finalized.change,
        "fee settled"
    );
    Ok(FeeEstimated {
        version,
        time_range,
        inputs,
        outputs: finalized.outputs,
        fee: finalized.fee,
        estimated_fee: finalized.estimated_fee,
        has_change: finalized.change.is_some(),
    })
}

/// Build the final entry graph and check conservation against it.
pub fn map_graph(estimated: FeeEstimated) -> Result<GraphMapped, TxError> {
    let at = |e: GraphMappingError| TxError::new(BuildStage::GraphMapped, e);
    verify_conservation(&estimated.inputs, &estimated.outputs, estimated.fee).map_err(at)?;
    let mapped = map_transaction(
        estimated.version,
        estimated.time_range,
        &estimated.inputs,
        &estimated.outputs,
    )
    .map_err(at)?;

    debug!(
        stage = %BuildStage::GraphMapped,
        tx_id = %mapped.tx_id,
        entries = mapped.entries.len(),
        "graph mapped"
    );
    Ok(GraphMapped { estimated, mapped })
}

/// Derive every witness against the final transaction id.
pub fn sign(graph: GraphMapped, keys: &dyn KeyProvider) -> Result<Signed, TxError> {
    let witnesses = sign_inputs(&graph.estimated.inputs, &graph.mapped, keys)
        .map_err(|e| TxError::new(BuildStage::Signed, e))?;
    debug!(
        stage = %BuildStage::Signed,
        tx_id = %graph.mapped.tx_id,
        inputs = witnesses.len(),
        "inputs signed"
    );
    Ok(Signed { graph, witnesses })
}

/// Serialize the signed transaction.
pub fn finalize(signed: Signed) -> Result<Transaction, TxError> {
    let Signed { graph, witnesses } = signed;
    let GraphMapped { estimated, mapped } = graph;

    let raw = encode_transaction(
        estimated.version,
        estimated.time_range,
        &estimated.inputs,
        Some(witnesses.as_slice()),
        &estimated.outputs,
    )
    .map_err(|e| TxError::new(BuildStage::Final, e))?;

    let change_index = estimated
        .has_change
        .then(|| estimated.outputs.len().saturating_sub(1));

    let inputs = estimated
        .inputs
        .into_iter()
        .zip(mapped.input_ids.iter().copied())
        .zip(witnesses)
        .map(|((input, input_id), witness)| SignedInput {
            input,
            input_id,
            witness,
        })
        .collect();

    let outputs = estimated
        .outputs
        .into_iter()
        .zip(mapped.output_ids.iter().copied())
        .enumerate()
        .map(|(position, (output, entry_id))| MappedOutput {
            output,
            position: position as u64,
            entry_id,
            is_change: change_index == Some(position),
        })
        .collect();

    let tx = Transaction {
        tx_id: mapped.tx_id,
        version: estimated.version,
        time_range: estimated.time_range,
        size: raw.len() as u64,
        fee: estimated.fee,
        estimated_fee: estimated.estimated_fee,
        inputs,
        outputs,
        raw_transaction: hex::encode(&raw),
    };

    debug!(
        stage = %BuildStage::Final,
        tx_id = %tx.tx_id,
        size = tx.size,
        fee = tx.fee,
        "transaction built"
    );
    Ok(tx)
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A signed input and the entry id it was signed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedInput {
    #[serde(flatten)]
    pub input: Input,
    pub input_id: Hash,
    #[serde(serialize_with = "serialize_arguments")]
    pub witness: Witness,
}

/// An output with its position in the final list and its entry id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedOutput {
    #[serde(flatten)]
    pub output: Output,
    pub position: u64,
    pub entry_id: Hash,
    /// `true` for the change output appended by the fee stage.
    pub is_change: bool,
}

/// A fully signed, wire-ready transaction.
///
/// Only [`TransactionBuilder::build`] produces one, so every value of this
/// type carries a witness for every input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    tx_id: Hash,
    version: u64,
    time_range: u64,
    size: u64,
    fee: u64,
    estimated_fee: u64,
    inputs: Vec<SignedInput>,
    outputs: Vec<MappedOutput>,
    raw_transaction: String,
}

impl Transaction {
    pub fn tx_id(&self) -> Hash {
        self.tx_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn time_range(&self) -> u64 {
        self.time_range
    }

    /// Serialized length in bytes, witnesses included.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Effective fee: fee-asset inputs minus fee-asset outputs.
    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Fee computed by the estimator. Lower than [`Transaction::fee`] when
    /// dust change was forfeited.
    pub fn estimated_fee(&self) -> u64 {
        self.estimated_fee
    }

    pub fn inputs(&self) -> &[SignedInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[MappedOutput] {
        &self.outputs
    }

    pub fn change_output(&self) -> Option<&MappedOutput> {
        self.outputs.iter().find(|o| o.is_change)
    }

    /// Hex-encoded wire bytes, ready to submit.
    pub fn raw_transaction(&self) -> &str {
        &self.raw_transaction
    }

    /// The message input `index` signed.
    pub fn sighash(&self, index: usize) -> Option<Hash> {
        self.inputs
            .get(index)
            .map(|i| super::graph::sighash(&i.input_id, &self.tx_id))
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for signed [`Transaction`]s.
///
/// # Usage
///
/// ```rust
/// use btm_offline::config::{FeeSchedule, FEE_ASSET_ID};
/// use btm_offline::crypto::hash::Hash;
/// use btm_offline::crypto::keys::Keypair;
/// use btm_offline::transaction::{KeyRing, SpendInput, TransactionBuilder};
///
/// let key = Keypair::from_seed(&[1u8; 32]);
/// let keys: KeyRing = std::iter::once(key.clone()).collect();
///
/// let tx = TransactionBuilder::new()
///     .add_input(SpendInput {
///         source_id: Hash::new([0x11; 32]),
///         source_position: 0,
///         asset_id: FEE_ASSET_ID,
///         amount: 1_000_000,
///         control_program: key.p2wpkh_program(),
///         vm_version: 1,
///     })
///     .build(&key.p2wpkh_program(), &keys, &FeeSchedule::default())
///     .unwrap();
///
/// assert_eq!(tx.fee(), 800_000);
/// assert_eq!(tx.change_output().map(|o| o.output.amount), Some(200_000));
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    version: u64,
    time_range: u64,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    /// Version 1, time range 0, no inputs or outputs.
    pub fn new() -> Self {
        Self {
            version: TX_VERSION,
            time_range: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Upper block-height bound for inclusion; 0 means unbounded.
    pub fn time_range(mut self, time_range: u64) -> Self {
        self.time_range = time_range;
        self
    }

    pub fn add_input(mut self, input: impl Into<Input>) -> Self {
        self.inputs.push(input.into());
        self
    }

    pub fn add_inputs(mut self, inputs: impl IntoIterator<Item = Input>) -> Self {
        self.inputs.extend(inputs);
        self
    }

    /// Outputs keep the order they are added in; the order feeds the id.
    pub fn add_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn add_outputs(mut self, outputs: impl IntoIterator<Item = Output>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    /// Run the whole pipeline.
    ///
    /// Any fee-asset surplus left after the fee goes to `change_program`.
    pub fn build(
        self,
        change_program: &[u8],
        keys: &dyn KeyProvider,
        schedule: &FeeSchedule,
    ) -> Result<Transaction, TxError> {
        let draft = Draft {
            version: self.version,
            time_range: self.time_range,
            inputs: self.inputs,
            outputs: self.outputs,
            change_program: change_program.to_vec(),
        };
        debug!(
            stage = %BuildStage::Draft,
            inputs = draft.inputs.len(),
            outputs = draft.outputs.len(),
            "building transaction"
        );

        let validated = validate(draft)?;
        let estimated = estimate(validated, schedule)?;
        let graph = map_graph(estimated)?;
        let signed = sign(graph, keys)?;
        finalize(signed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Fee estimation.
//!
//! The fee depends on the size of the transaction that pays it, so it is
//! estimated from a provisional build that routes the whole fee-asset
//! surplus to a change output, then applied to the real output list:
//!
//! ```text
//! gas = storage_gas_rate × (unsigned_size + inputs × base_witness_size)
//!     + flexible_gas
//!     + p2wpkh_gas × (inputs locked by a p2wpkh-sized program)
//! fee = ⌈gas × vm_gas_rate / base_rate⌉ × base_rate
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use super::error::{GraphMappingError, TxErrorKind};
use super::raw::encode_transaction;
use super::types::{Input, Output};
use crate::config::{FeeSchedule, FEE_ASSET_ID};

/// The outcome of phase A and B: what the provisional transaction costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeeEstimate {
    /// Rounded fee in fee-asset base units.
    pub fee: u64,
    /// Fee-asset inputs minus fee-asset outputs, before the fee.
    pub surplus: u64,
    /// Length of the unsigned provisional transaction.
    pub base_tx_size: u64,
    /// Witness bytes budgeted for all inputs.
    pub witness_size: u64,
    pub gas: u64,
}

/// Output list after the fee has been taken out of the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedOutputs {
    pub outputs: Vec<Output>,
    /// Effective fee: inputs minus outputs of the fee asset.
    pub fee: u64,
    /// The rounded estimate. Differs from `fee` only when dust was dropped.
    pub estimated_fee: u64,
    /// Amount of the change output, if one was kept. It is always last.
    pub change: Option<u64>,
}

/// Σ fee-asset inputs − Σ fee-asset outputs.
pub fn fee_asset_surplus(inputs: &[Input], outputs: &[Output]) -> Result<u64, GraphMappingError> {
    let mut available: u64 = 0;
    for input in inputs {
        if input.asset_id()? == FEE_ASSET_ID {
            available = available
                .checked_add(input.amount())
                .ok_or(GraphMappingError::AmountOverflow(FEE_ASSET_ID))?;
        }
    }

    let mut required: u64 = 0;
    for output in outputs.iter().filter(|o| o.asset_id == FEE_ASSET_ID) {
        required = required
            .checked_add(output.amount)
            .ok_or(GraphMappingError::AmountOverflow(FEE_ASSET_ID))?;
    }

    available
        .checked_sub(required)
        .ok_or(GraphMappingError::InsufficientFunds {
            available,
            required,
        })
}

/// Witness bytes budgeted for `inputs`.
pub fn witness_budget(inputs: &[Input], schedule: &FeeSchedule) -> u64 {
    schedule
        .base_witness_size
        .saturating_mul(inputs.len() as u64)
}

/// Gas for a transaction of `size` unsigned bytes plus `witness_size`
/// budgeted witness bytes, spending `inputs`.
pub fn compute_gas(
    size: u64,
    witness_size: u64,
    inputs: &[Input],
    schedule: &FeeSchedule,
) -> u64 {
    let p2wpkh_inputs = inputs
        .iter()
        .filter(|i| !i.is_issuance() && i.program().len() == schedule.p2wpkh_program_len)
        .count() as u64;

    schedule
        .storage_gas_rate
        .saturating_mul(size.saturating_add(witness_size))
        .saturating_add(schedule.flexible_gas)
        .saturating_add(schedule.p2wpkh_gas.saturating_mul(p2wpkh_inputs))
}

/// Convert gas to a fee rounded up to a multiple of `base_rate`.
///
/// A zero `base_rate` disables rounding.
pub fn gas_to_fee(gas: u64, schedule: &FeeSchedule) -> u64 {
    let raw = gas.saturating_mul(schedule.vm_gas_rate);
    if schedule.base_rate == 0 {
        return raw;
    }
    raw.div_ceil(schedule.base_rate)
        .saturating_mul(schedule.base_rate)
}

/// Estimate the fee of the transaction `inputs → outputs + change`.
pub fn estimate_fee(
    version: u64,
    time_range: u64,
    inputs: &[Input],
    outputs: &[Output],
    change_program: &[u8],
    schedule: &FeeSchedule,
) -> Result<FeeEstimate, TxErrorKind> {
    let surplus = fee_asset_surplus(inputs, outputs)?;

    let mut provisional = outputs.to_vec();
    provisional.push(Output::fee_asset(surplus, change_program.to_vec()));
    let raw = encode_transaction(version, time_range, inputs, None, &provisional)?;

    let base_tx_size = raw.len() as u64;
    let witness_size = witness_budget(inputs, schedule);
    let gas = compute_gas(base_tx_size, witness_size, inputs, schedule);
    let fee = gas_to_fee(gas, schedule);

    debug!(
        surplus,
        base_tx_size,
        witness_size,
        gas,
        fee,
        "fee estimated"
    );

    Ok(FeeEstimate {
        fee,
        surplus,
        base_tx_size,
        witness_size,
        gas,
    })
}

/// Apply `estimate` to the caller's outputs.
///
/// Appends change when the remainder clears the dust threshold; otherwise
/// the remainder is added to the fee.
pub fn finalize_outputs(
    outputs: &[Output],
    estimate: &FeeEstimate,
    change_program: &[u8],
    schedule: &FeeSchedule,
) -> Result<FinalizedOutputs, GraphMappingError> {
    let remainder =
        estimate
            .surplus
            .checked_sub(estimate.fee)
            .ok_or(GraphMappingError::InsufficientFunds {
                available: estimate.surplus,
                required: estimate.fee,
            })?;

    let mut finalized = outputs.to_vec();
    if remainder > schedule.dust_threshold {
        finalized.push(Output::fee_asset(remainder, change_program.to_vec()));
        return Ok(FinalizedOutputs {
            outputs: finalized,
            fee: estimate.fee,
            estimated_fee: estimate.fee,
            change: Some(remainder),
        });
    }

    if remainder > 0 {
        warn!(
            remainder,
            dust_threshold = schedule.dust_threshold,
            "change below dust threshold added to fee"
        );
    }
    Ok(FinalizedOutputs {
        outputs: finalized,
        fee: estimate.surplus,
        estimated_fee: estimate.fee,
        change: None,
    })
}

//! Entry graph mapping: turns ordered inputs and outputs into the entry DAG
//! and derives the transaction id.
//!
//! The mapping is a pure function of its arguments. Ids depend only on field
//! values and explicit ordinals; the arena's hash index is never iterated, so
//! two mappings of the same ordered lists are byte-identical.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::error::GraphMappingError;
use super::types::{Input, Output};
use crate::config::{is_retirement_program, FEE_ASSET_ID, OP_TRUE, VM_VERSION};
use crate::crypto::hash::{sha3_256_multi, AssetId, Hash};
use crate::entry::{
    AssetAmount, Entry, EntryArena, Issuance, Mux, OutputEntry, Program, Retirement, Spend,
    TxHeader, ValueDestination, ValueSource,
};

/// The result of mapping one transaction.
#[derive(Debug)]
pub struct MappedTransaction {
    pub tx_id: Hash,
    pub mux_id: Hash,
    /// Spend or issuance entry id per input, in input order.
    pub input_ids: Vec<Hash>,
    /// Output or retirement entry id per output, in output order.
    pub output_ids: Vec<Hash>,
    pub entries: EntryArena,
}

impl MappedTransaction {
    /// Message an input's witness must sign.
    pub fn sighash(&self, index: usize) -> Option<Hash> {
        self.input_ids
            .get(index)
            .map(|input_id| sighash(input_id, &self.tx_id))
    }
}

/// `SHA3-256(input_id ‖ tx_id)`.
pub fn sighash(input_id: &Hash, tx_id: &Hash) -> Hash {
    Hash::new(sha3_256_multi(&[input_id.as_bytes(), tx_id.as_bytes()]))
}

/// Build the entry graph for the given (final) inputs and outputs.
pub fn map_transaction(
    version: u64,
    time_range: u64,
    inputs: &[Input],
    outputs: &[Output],
) -> Result<MappedTransaction, GraphMappingError> {
    let mut entries = EntryArena::new();
    let mut mux_sources = Vec::with_capacity(inputs.len());
    let mut input_ids = Vec::with_capacity(inputs.len());
    let mut first_seen: HashMap<Hash, usize> = HashMap::new();

    for (index, input) in inputs.iter().enumerate() {
        let value = input.asset_amount()?;
        let entry = input_entry(&mut entries, input, value, index as u64)?;
        let id = entries.insert(entry)?;
        if let Some(&first) = first_seen.get(&id) {
            return Err(GraphMappingError::DuplicateInput { index, first });
        }
        first_seen.insert(id, index);

        // The mux source position is always 0: each input entry has exactly
        // one value output.
        mux_sources.push(ValueSource::new(id, value, 0));
        input_ids.push(id);
    }

    let mux_id = entries.insert(Entry::Mux(Mux {
        sources: mux_sources,
        program: Program::new(VM_VERSION, vec![OP_TRUE]),
        witness_destinations: Vec::with_capacity(outputs.len()),
    }))?;

    for (index, (input, id)) in inputs.iter().zip(&input_ids).enumerate() {
        let destination = ValueDestination::new(mux_id, input.asset_amount()?, index as u64);
        if let Some(entry) = entries.get_mut(id) {
            entry.set_destination(destination);
        }
    }

    let mut output_ids = Vec::with_capacity(outputs.len());
    let mut mux_destinations = Vec::with_capacity(outputs.len());
    for (index, output) in outputs.iter().enumerate() {
        if output.control_program.is_empty() {
            return Err(GraphMappingError::EmptyControlProgram { index });
        }
        let ordinal = index as u64;
        let source = ValueSource::new(mux_id, output.asset_amount(), ordinal);
        let entry = if is_retirement_program(&output.control_program) {
            Entry::Retirement(Retirement { source, ordinal })
        } else {
            Entry::Output(OutputEntry {
                source,
                control_program: Program::new(VM_VERSION, output.control_program.clone()),
                ordinal,
            })
        };
        let id = entries.insert(entry)?;
        output_ids.push(id);
        mux_destinations.push(ValueDestination::new(id, source.value, 0));
    }

    if let Some(Entry::Mux(mux)) = entries.get_mut(&mux_id) {
        mux.witness_destinations = mux_destinations;
    }

    let tx_id = entries.insert(Entry::Header(TxHeader {
        version,
        serialized_size: 0,
        time_range,
        result_ids: output_ids.clone(),
    }))?;

    debug!(
        tx_id = %tx_id,
        inputs = inputs.len(),
        outputs = outputs.len(),
        entries = entries.len(),
        "entry graph mapped"
    );

    Ok(MappedTransaction {
        tx_id,
        mux_id,
        input_ids,
        output_ids,
        entries,
    })
}

fn input_entry(
    entries: &mut EntryArena,
    input: &Input,
    value: AssetAmount,
    ordinal: u64,
) -> Result<Entry, GraphMappingError> {
    Ok(match input {
        Input::Spend(spend) => {
            // Rebuild the output being spent. Its ordinal is irrelevant to the
            // ledger and always 0.
            let prevout = Entry::Output(OutputEntry {
                source: ValueSource::new(spend.source_id, value, spend.source_position),
                control_program: Program::new(spend.vm_version, spend.control_program.clone()),
                ordinal: 0,
            });
            let spent_output_id = entries.insert(prevout)?;
            Entry::Spend(Spend {
                spent_output_id,
                ordinal,
                witness_destination: None,
                witness_arguments: Vec::new(),
            })
        }
        Input::Issuance(issuance) => Entry::Issuance(Issuance {
            nonce_hash: issuance.nonce_hash(),
            value,
            ordinal,
            witness_destination: None,
            witness_asset_definition: Some(issuance.asset_definition()),
            witness_arguments: Vec::new(),
        }),
    })
}

/// Check per-asset conservation: every non-fee asset balances exactly and
/// the fee asset balances once `fee` is added to the outputs.
pub fn verify_conservation(
    inputs: &[Input],
    outputs: &[Output],
    fee: u64,
) -> Result<(), GraphMappingError> {
    // BTreeMap so the first reported imbalance is the same on every run.
    let mut totals: BTreeMap<AssetId, (u64, u64)> = BTreeMap::new();
    for input in inputs {
        let asset_id = input.asset_id()?;
        let entry = totals.entry(asset_id).or_default();
        entry.0 = entry
            .0
            .checked_add(input.amount())
            .ok_or(GraphMappingError::AmountOverflow(asset_id))?;
    }
    for output in outputs {
        let entry = totals.entry(output.asset_id).or_default();
        entry.1 = entry
            .1
            .checked_add(output.amount)
            .ok_or(GraphMappingError::AmountOverflow(output.asset_id))?;
    }

    let fee_entry = totals.entry(FEE_ASSET_ID).or_default();
    fee_entry.1 = fee_entry
        .1
        .checked_add(fee)
        .ok_or(GraphMappingError::AmountOverflow(FEE_ASSET_ID))?;

    for (asset_id, (inputs, outputs)) in totals {
        if inputs != outputs {
            return Err(GraphMappingError::AssetImbalance {
                asset_id,
                inputs,
                outputs,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OP_RETIRE;
    use crate::transaction::types::{IssuanceInput, SpendInput};

    fn spend(amount: u64, position: u64) -> Input {
        Input::Spend(SpendInput {
            source_id: Hash::new([0x11; 32]),
            source_position: position,
            asset_id: FEE_ASSET_ID,
            amount,
            control_program: vec![0x00, 0x14, 0x01],
            vm_version: 1,
        })
    }

    fn out(amount: u64, program: Vec<u8>) -> Output {
        Output::fee_asset(amount, program)
    }

    #[test]
    fn mapping_is_deterministic() {
        let inputs = vec![spend(1_000, 0), spend(2_000, 1)];
        let outputs = vec![out(2_500, vec![0x51]), out(100, vec![OP_RETIRE])];
        let a = map_transaction(1, 0, &inputs, &outputs).unwrap();
        let b = map_transaction(1, 0, &inputs, &outputs).unwrap();
        assert_eq!(a.tx_id, b.tx_id);
        assert_eq!(a.input_ids, b.input_ids);
        assert_eq!(a.output_ids, b.output_ids);
    }

    #[test]
    fn output_order_changes_tx_id() {
        let inputs = vec![spend(1_000, 0)];
        let x = out(600, vec![0x51]);
        let y = out(400, vec![0x52]);
        let a = map_transaction(1, 0, &inputs, &[x.clone(), y.clone()]).unwrap();
        let b = map_transaction(1, 0, &inputs, &[y, x]).unwrap();
        assert_ne!(a.tx_id, b.tx_id);
    }

    #[test]
    fn time_range_and_version_feed_tx_id() {
        let inputs = vec![spend(1_000, 0)];
        let outputs = vec![out(1_000, vec![0x51])];
        let base = map_transaction(1, 0, &inputs, &outputs).unwrap().tx_id;
        assert_ne!(base, map_transaction(1, 5, &inputs, &outputs).unwrap().tx_id);
        assert_ne!(base, map_transaction(2, 0, &inputs, &outputs).unwrap().tx_id);
    }

    #[test]
    fn retire_programs_map_to_retirement_entries() {
        let inputs = vec![spend(1_000, 0)];
        let outputs = vec![out(500, vec![0x51]), out(500, vec![OP_RETIRE, 0x01])];
        let mapped = map_transaction(1, 0, &inputs, &outputs).unwrap();

        assert!(matches!(
            mapped.entries.get(&mapped.output_ids[0]),
            Some(Entry::Output(_))
        ));
        match mapped.entries.get(&mapped.output_ids[1]) {
            Some(Entry::Retirement(r)) => {
                assert_eq!(r.ordinal, 1);
                assert_eq!(r.source.reference, mapped.mux_id);
            }
            other => panic!("expected retirement, got {:?}", other),
        }
    }

    #[test]
    fn inputs_point_at_the_mux() {
        let inputs = vec![spend(1_000, 0), spend(3, 7)];
        let mapped = map_transaction(1, 0, &inputs, &[out(1_003, vec![0x51])]).unwrap();

        for (index, id) in mapped.input_ids.iter().enumerate() {
            match mapped.entries.get(id) {
                Some(Entry::Spend(s)) => {
                    let dest = s.witness_destination.expect("destination set");
                    assert_eq!(dest.reference, mapped.mux_id);
                    assert_eq!(dest.position, index as u64);
                    assert!(mapped.entries.contains(&s.spent_output_id));
                }
                other => panic!("expected spend, got {:?}", other),
            }
        }
    }

    #[test]
    fn mux_sources_and_destinations_follow_list_order() {
        let inputs = vec![spend(10, 0), spend(20, 1)];
        let outputs = vec![out(25, vec![0x51]), out(5, vec![0x52])];
        let mapped = map_transaction(1, 0, &inputs, &outputs).unwrap();

        match mapped.entries.get(&mapped.mux_id) {
            Some(Entry::Mux(mux)) => {
                let sources: Vec<Hash> = mux.sources.iter().map(|s| s.reference).collect();
                assert_eq!(sources, mapped.input_ids);
                assert!(mux.sources.iter().all(|s| s.position == 0));
                let dests: Vec<Hash> =
                    mux.witness_destinations.iter().map(|d| d.reference).collect();
                assert_eq!(dests, mapped.output_ids);
                assert_eq!(mux.program.code, vec![OP_TRUE]);
            }
            other => panic!("expected mux, got {:?}", other),
        }
    }

    #[test]
    fn header_id_is_tx_id() {
        let mapped =
            map_transaction(1, 9, &[spend(5, 0)], &[out(5, vec![0x51])]).unwrap();
        match mapped.entries.get(&mapped.tx_id) {
            Some(Entry::Header(h)) => {
                assert_eq!(h.time_range, 9);
                assert_eq!(h.result_ids, mapped.output_ids);
            }
            other => panic!("expected header, got {:?}", other),
        }
    }

    #[test]
    fn issuance_inputs_map_to_issuance_entries() {
        let issuance = IssuanceInput {
            nonce: vec![1; 8],
            asset_definition: b"{}".to_vec(),
            issuance_program: vec![0xae],
            vm_version: 1,
            amount: 50,
        };
        let asset_id = issuance.asset_id().unwrap();
        let inputs = vec![Input::Issuance(issuance), spend(1_000, 0)];
        let outputs = vec![
            Output::new(asset_id, 50, vec![0x51]),
            out(1_000, vec![0x51]),
        ];
        let mapped = map_transaction(1, 0, &inputs, &outputs).unwrap();
        match mapped.entries.get(&mapped.input_ids[0]) {
            Some(Entry::Issuance(i)) => {
                assert_eq!(i.value.asset_id, asset_id);
                assert_eq!(i.ordinal, 0);
            }
            other => panic!("expected issuance, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_inputs_rejected() {
        let err = map_transaction(1, 0, &[spend(5, 0), spend(5, 0)], &[out(10, vec![0x51])])
            .unwrap_err();
        assert_eq!(err, GraphMappingError::DuplicateInput { index: 1, first: 0 });
    }

    #[test]
    fn empty_output_program_rejected() {
        let err = map_transaction(1, 0, &[spend(5, 0)], &[out(5, vec![])]).unwrap_err();
        assert_eq!(err, GraphMappingError::EmptyControlProgram { index: 0 });
    }

    #[test]
    fn sighash_binds_input_and_tx() {
        let mapped = map_transaction(1, 0, &[spend(5, 0)], &[out(5, vec![0x51])]).unwrap();
        let expected = sighash(&mapped.input_ids[0], &mapped.tx_id);
        assert_eq!(mapped.sighash(0), Some(expected));
        assert_eq!(mapped.sighash(1), None);
        assert_ne!(expected, sighash(&mapped.tx_id, &mapped.input_ids[0]));
    }

    #[test]
    fn conservation_accepts_balanced_transaction() {
        let inputs = vec![spend(1_000, 0)];
        let outputs = vec![out(900, vec![0x51])];
        assert!(verify_conservation(&inputs, &outputs, 100).is_ok());
    }

    #[test]
    fn conservation_rejects_unbalanced_fee_asset() {
        let inputs = vec![spend(1_000, 0)];
        let outputs = vec![out(900, vec![0x51])];
        assert_eq!(
            verify_conservation(&inputs, &outputs, 50),
            Err(GraphMappingError::AssetImbalance {
                asset_id: FEE_ASSET_ID,
                inputs: 1_000,
                outputs: 950,
            })
        );
    }

    #[test]
    fn conservation_rejects_unbalanced_other_asset() {
        let gold = AssetId::new([0x01; 32]);
        let inputs = vec![
            spend(1_000, 0),
            Input::Spend(SpendInput {
                source_id: Hash::new([0x22; 32]),
                source_position: 0,
                asset_id: gold,
                amount: 10,
                control_program: vec![0x51],
                vm_version: 1,
            }),
        ];
        let outputs = vec![out(1_000, vec![0x51]), Output::new(gold, 9, vec![0x51])];
        assert!(matches!(
            verify_conservation(&inputs, &outputs, 0),
            Err(GraphMappingError::AssetImbalance { asset_id, .. }) if asset_id == gold
        ));
    }
}

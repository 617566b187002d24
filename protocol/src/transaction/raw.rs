//! Wire format: the raw transaction bytes a node accepts.
//!
//! ```text
//! 0x07 varint63(version) varint63(time_range)
//! varint31(inputs)  input*
//! varint31(outputs) output*
//! ```
//!
//! Inputs and outputs each start with their asset version and then carry a
//! commitment and a witness as extensible strings. See the field-level
//! layout in [`write_input`] and [`write_output`].

use serde::Serialize;

use super::types::{Input, IssuanceInput, Output, SpendInput};
use crate::config::{
    ASSET_VERSION, ISSUANCE_INPUT_TYPE, SERIALIZATION_FLAGS, SPEND_INPUT_TYPE, VM_VERSION,
};
use crate::crypto::hash::{AssetId, Hash};
use crate::encoding::{CanonicalReader, CanonicalWriter, SerializationError};
use crate::entry::types::hex_bytes;

/// Witness arguments of one input.
pub type Witness = Vec<Vec<u8>>;

/// Serialize a transaction.
///
/// `witnesses` is `None` for the unsigned form used by fee estimation; each
/// input then carries an empty argument list.
pub fn encode_transaction(
    version: u64,
    time_range: u64,
    inputs: &[Input],
    witnesses: Option<&[Witness]>,
    outputs: &[Output],
) -> Result<Vec<u8>, SerializationError> {
    let mut w = CanonicalWriter::with_capacity(256);
    w.write_u8(SERIALIZATION_FLAGS);
    w.write_varint63(version)?;
    w.write_varint63(time_range)?;

    w.write_varint31(inputs.len() as u64)?;
    for (i, input) in inputs.iter().enumerate() {
        let arguments = witnesses
            .and_then(|ws| ws.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        write_input(&mut w, input, arguments)?;
    }

    w.write_varint31(outputs.len() as u64)?;
    for output in outputs {
        write_output(&mut w, output)?;
    }
    Ok(w.into_bytes())
}

/// ```text
/// varint63(asset_version)
/// varstr31(commitment)   spend:    0x01 varstr31(source_id asset_id varint63(amount)
///                                       varint63(source_position) varint63(vm_version)
///                                       varstr31(control_program))
///                        issuance: 0x00 varstr31(nonce) asset_id varint63(amount)
/// varstr31(witness)      spend:    varstr_list(arguments)
///                        issuance: varstr31(definition) varint63(vm_version)
///                                  varstr31(issuance_program) varstr_list(arguments)
/// ```
pub fn write_input(
    w: &mut CanonicalWriter,
    input: &Input,
    arguments: &[Vec<u8>],
) -> Result<(), SerializationError> {
    w.write_varint63(ASSET_VERSION)?;
    match input {
        Input::Spend(spend) => {
            w.write_extensible_string(|c| {
                c.write_u8(SPEND_INPUT_TYPE);
                c.write_extensible_string(|sc| {
                    sc.write_bytes(spend.source_id.as_bytes());
                    sc.write_bytes(spend.asset_id.as_bytes());
                    sc.write_varint63(spend.amount)?;
                    sc.write_varint63(spend.source_position)?;
                    sc.write_varint63(spend.vm_version)?;
                    sc.write_varstr31(&spend.control_program)
                })
            })?;
            w.write_extensible_string(|wit| wit.write_varstr_list(arguments))
        }
        Input::Issuance(issuance) => {
            let asset_id = issuance.asset_id()?;
            w.write_extensible_string(|c| {
                c.write_u8(ISSUANCE_INPUT_TYPE);
                c.write_varstr31(&issuance.nonce)?;
                c.write_bytes(asset_id.as_bytes());
                c.write_varint63(issuance.amount)
            })?;
            w.write_extensible_string(|wit| {
                wit.write_varstr31(&issuance.asset_definition)?;
                wit.write_varint63(issuance.vm_version)?;
                wit.write_varstr31(&issuance.issuance_program)?;
                wit.write_varstr_list(arguments)
            })
        }
    }
}

/// ```text
/// varint63(asset_version)
/// varstr31(asset_id varint63(amount) varint63(vm_version) varstr31(control_program))
/// varstr31(empty witness)
/// ```
pub fn write_output(w: &mut CanonicalWriter, output: &Output) -> Result<(), SerializationError> {
    w.write_varint63(ASSET_VERSION)?;
    w.write_extensible_string(|c| {
        c.write_bytes(output.asset_id.as_bytes());
        c.write_varint63(output.amount)?;
        c.write_varint63(VM_VERSION)?;
        c.write_varstr31(&output.control_program)
    })?;
    w.write_varstr31(&[])
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A decoded input together with its witness arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawInput {
    pub input: Input,
    /// Asset id as written on the wire. For issuances this is checked
    /// against the id derived from the witness.
    pub asset_id: AssetId,
    #[serde(serialize_with = "serialize_arguments")]
    pub arguments: Witness,
}

/// A decoded output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawOutput {
    pub asset_id: AssetId,
    pub amount: u64,
    pub vm_version: u64,
    #[serde(with = "hex_bytes")]
    pub control_program: Vec<u8>,
}

impl From<RawOutput> for Output {
    fn from(raw: RawOutput) -> Self {
        Output::new(raw.asset_id, raw.amount, raw.control_program)
    }
}

/// A transaction parsed back from its wire bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub version: u64,
    pub time_range: u64,
    pub inputs: Vec<RawInput>,
    pub outputs: Vec<RawOutput>,
}

impl RawTransaction {
    pub fn from_hex(hex_str: &str) -> Result<Self, SerializationError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| SerializationError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Parse exactly one transaction; trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        let mut r = CanonicalReader::new(bytes);
        let flags = r.read_u8()?;
        if flags != SERIALIZATION_FLAGS {
            return Err(SerializationError::UnsupportedFlags(flags));
        }
        let version = r.read_varint63()?;
        let time_range = r.read_varint63()?;

        let input_count = r.read_varint31()? as usize;
        let mut inputs = Vec::with_capacity(input_count.min(r.remaining()));
        for index in 0..input_count {
            inputs.push(read_input(&mut r, index)?);
        }

        let output_count = r.read_varint31()? as usize;
        let mut outputs = Vec::with_capacity(output_count.min(r.remaining()));
        for _ in 0..output_count {
            outputs.push(read_output(&mut r)?);
        }
        r.finish()?;

        Ok(Self {
            version,
            time_range,
            inputs,
            outputs,
        })
    }

    /// Inputs and outputs in builder form, e.g. to recompute the tx id.
    pub fn into_parts(self) -> (Vec<Input>, Vec<Output>) {
        (
            self.inputs.into_iter().map(|i| i.input).collect(),
            self.outputs.into_iter().map(Output::from).collect(),
        )
    }
}

fn read_asset_version(r: &mut CanonicalReader<'_>) -> Result<(), SerializationError> {
    match r.read_varint63()? {
        ASSET_VERSION => Ok(()),
        other => Err(SerializationError::UnsupportedAssetVersion(other)),
    }
}

fn read_input(r: &mut CanonicalReader<'_>, index: usize) -> Result<RawInput, SerializationError> {
    read_asset_version(r)?;
    let mut commitment = r.read_extensible_string()?;
    let mut witness = r.read_extensible_string()?;

    let raw = match commitment.read_u8()? {
        SPEND_INPUT_TYPE => {
            let mut sc = commitment.read_extensible_string()?;
            let source_id = Hash::new(sc.read_hash()?);
            let asset_id = AssetId::new(sc.read_hash()?);
            let amount = sc.read_varint63()?;
            let source_position = sc.read_varint63()?;
            let vm_version = sc.read_varint63()?;
            let control_program = sc.read_varstr31()?.to_vec();
            sc.finish()?;
            let arguments = witness.read_varstr_list()?;
            RawInput {
                input: Input::Spend(SpendInput {
                    source_id,
                    source_position,
                    asset_id,
                    amount,
                    control_program,
                    vm_version,
                }),
                asset_id,
                arguments,
            }
        }
        ISSUANCE_INPUT_TYPE => {
            let nonce = commitment.read_varstr31()?.to_vec();
            let asset_id = AssetId::new(commitment.read_hash()?);
            let amount = commitment.read_varint63()?;
            let asset_definition = witness.read_varstr31()?.to_vec();
            let vm_version = witness.read_varint63()?;
            let issuance_program = witness.read_varstr31()?.to_vec();
            let arguments = witness.read_varstr_list()?;
            let issuance = IssuanceInput {
                nonce,
                asset_definition,
                issuance_program,
                vm_version,
                amount,
            };
            if issuance.asset_id()? != asset_id {
                return Err(SerializationError::AssetIdMismatch(index));
            }
            RawInput {
                input: Input::Issuance(issuance),
                asset_id,
                arguments,
            }
        }
        other => return Err(SerializationError::UnknownInputType(other, index)),
    };
    commitment.finish()?;
    witness.finish()?;
    Ok(raw)
}

fn read_output(r: &mut CanonicalReader<'_>) -> Result<RawOutput, SerializationError> {
    read_asset_version(r)?;
    let mut c = r.read_extensible_string()?;
    let asset_id = AssetId::new(c.read_hash()?);
    let amount = c.read_varint63()?;
    let vm_version = c.read_varint63()?;
    let control_program = c.read_varstr31()?.to_vec();
    c.finish()?;
    // Output witnesses are always empty in this format version; skip it.
    r.read_varstr31()?;
    Ok(RawOutput {
        asset_id,
        amount,
        vm_version,
        control_program,
    })
}

pub(crate) fn serialize_arguments<S: serde::Serializer>(
    args: &Witness,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_seq(args.iter().map(hex::encode))
}

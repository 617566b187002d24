//! # Entry Model
//!
//! A transaction is mapped onto a small DAG of typed, content-addressed
//! entries before it can be identified or signed:
//!
//! ```text
//! Spend/Issuance ──┐
//! Spend/Issuance ──┼──► Mux ──┬──► Output / Retirement ──┐
//!        ...       ┘          └──► Output / Retirement ──┴──► TxHeader
//! ```
//!
//! Every entry's id is
//! `SHA3-256("entryid:" ‖ type ‖ ":" ‖ SHA3-256(body))`, where the body is
//! the [`hashing`] encoding of its hashed fields. Children are referenced by
//! id, never embedded, so equal content always yields an equal id.
//!
//! Fields prefixed `witness_` (and ordinals on inputs) are bookkeeping that
//! the ledger deliberately leaves out of the body. Setting them after an id
//! was computed never changes that id.

pub mod arena;
pub mod hashing;
pub mod types;

pub use arena::EntryArena;
pub use types::{AssetAmount, AssetDefinition, Program, ValueDestination, ValueSource};

use crate::config::ENTRY_ID_PREFIX;
use crate::crypto::hash::{sha3_256, sha3_256_multi, Hash};
use crate::encoding::{CanonicalWriter, SerializationError};
use hashing::{write_list_for_hash, WriteForHash};

/// The transaction header. Its id is the transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxHeader {
    pub version: u64,
    /// Not hashed.
    pub serialized_size: u64,
    pub time_range: u64,
    pub result_ids: Vec<Hash>,
}

/// Pools every input's value and redistributes it to the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mux {
    pub sources: Vec<ValueSource>,
    pub program: Program,
    pub witness_destinations: Vec<ValueDestination>,
}

/// A spendable output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEntry {
    pub source: ValueSource,
    pub control_program: Program,
    pub ordinal: u64,
}

/// Burned value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retirement {
    pub source: ValueSource,
    pub ordinal: u64,
}

/// Consumes a previously created output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spend {
    pub spent_output_id: Hash,
    pub ordinal: u64,
    pub witness_destination: Option<ValueDestination>,
    pub witness_arguments: Vec<Vec<u8>>,
}

/// Mints new units of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub nonce_hash: Hash,
    pub value: AssetAmount,
    pub ordinal: u64,
    pub witness_destination: Option<ValueDestination>,
    pub witness_asset_definition: Option<AssetDefinition>,
    pub witness_arguments: Vec<Vec<u8>>,
}

/// A node of the entry graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Header(TxHeader),
    Mux(Mux),
    Output(OutputEntry),
    Retirement(Retirement),
    Spend(Spend),
    Issuance(Issuance),
}

impl Entry {
    /// Type tag mixed into the id. The numeric suffixes are entry format
    /// versions; the header has none.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Entry::Header(_) => "txheader",
            Entry::Mux(_) => "mux1",
            Entry::Output(_) => "output1",
            Entry::Retirement(_) => "retirement1",
            Entry::Spend(_) => "spend1",
            Entry::Issuance(_) => "issuance1",
        }
    }

    /// Canonical encoding of the hashed fields.
    pub fn write_body(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        match self {
            Entry::Header(h) => {
                h.version.write_for_hash(w)?;
                h.time_range.write_for_hash(w)?;
                write_list_for_hash(w, &h.result_ids)
            }
            Entry::Mux(m) => {
                write_list_for_hash(w, &m.sources)?;
                m.program.write_for_hash(w)
            }
            Entry::Output(o) => {
                o.source.write_for_hash(w)?;
                o.control_program.write_for_hash(w)?;
                o.ordinal.write_for_hash(w)
            }
            Entry::Retirement(r) => {
                r.source.write_for_hash(w)?;
                r.ordinal.write_for_hash(w)
            }
            Entry::Spend(s) => s.spent_output_id.write_for_hash(w),
            Entry::Issuance(i) => {
                i.nonce_hash.write_for_hash(w)?;
                i.value.write_for_hash(w)
            }
        }
    }

    /// Content id of this entry.
    pub fn id(&self) -> Result<Hash, SerializationError> {
        let mut body = CanonicalWriter::with_capacity(128);
        self.write_body(&mut body)?;
        let inner = sha3_256(body.as_bytes());
        Ok(Hash::new(sha3_256_multi(&[
            ENTRY_ID_PREFIX,
            self.type_tag().as_bytes(),
            b":",
            &inner,
        ])))
    }

    /// Record where an input entry's value goes. No-op for other variants.
    pub fn set_destination(&mut self, destination: ValueDestination) {
        match self {
            Entry::Spend(s) => s.witness_destination = Some(destination),
            Entry::Issuance(i) => i.witness_destination = Some(destination),
            _ => {}
        }
    }
}

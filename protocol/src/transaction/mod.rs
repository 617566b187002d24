//! # Transaction Module
//!
//! Offline construction of signed transactions.
//!
//! ## Architecture
//!
//! ```text
//! types.rs    — Caller-facing inputs and outputs
//! builder.rs  — TransactionBuilder and the staged pipeline
//! fee.rs      — Two-pass fee estimation and change settlement
//! graph.rs    — Entry graph mapping, transaction id, signature hashes
//! signing.rs  — KeyProvider, KeyRing and witness derivation
//! raw.rs      — Wire encoding and decoding
//! error.rs    — Per-stage error enums
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Draft** — Collect inputs and outputs with [`TransactionBuilder`].
//! 2. **Validate** — Reject empty programs, zero amounts, bad versions.
//! 3. **Estimate** — Price a provisional build that sends the whole surplus
//!    to change, then take the fee out of the change (or drop it as dust).
//! 4. **Map** — Build the final entry graph; the header id is the tx id.
//! 5. **Sign** — One witness per input over `SHA3-256(input_id ‖ tx_id)`.
//! 6. **Finalize** — Serialize to wire bytes.

pub mod builder;
pub mod error;
pub mod fee;
pub mod graph;
pub mod raw;
pub mod signing;
pub mod types;

pub use builder::{BuildStage, MappedOutput, SignedInput, Transaction, TransactionBuilder};
pub use error::{
    GraphMappingError, SerializationError, SigningError, TxError, TxErrorKind, ValidationError,
};
pub use fee::{FeeEstimate, FinalizedOutputs};
pub use graph::{map_transaction, sighash, MappedTransaction};
pub use raw::{RawInput, RawOutput, RawTransaction, Witness};
pub use signing::{sign_inputs, KeyProvider, KeyRing};
pub use types::{Input, IssuanceInput, Output, SpendInput};

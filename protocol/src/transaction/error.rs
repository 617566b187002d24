//! Error taxonomy of the construction pipeline.
//!
//! One enum per concern, gathered in [`TxErrorKind`] and tagged with the
//! [`BuildStage`] that raised it by [`TxError`]. Every variant that concerns
//! a specific input or output carries its index. None of these are retryable
//! inside a build: the caller fixes the inputs and starts again.

use thiserror::Error;

use super::builder::BuildStage;
use crate::crypto::hash::AssetId;
pub use crate::encoding::SerializationError;

/// A required field is missing or invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("transaction version must be between 1 and 2^63 - 1, got {0}")]
    InvalidVersion(u64),

    #[error("time range {0} exceeds the 63-bit limit")]
    InvalidTimeRange(u64),

    #[error("transaction has no inputs")]
    NoInputs,

    #[error("input {index}: {reason}")]
    InvalidInput { index: usize, reason: &'static str },

    #[error("output {index}: {reason}")]
    InvalidOutput { index: usize, reason: &'static str },

    #[error("change control program is empty")]
    EmptyChangeProgram,
}

/// The entry graph cannot be built consistently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphMappingError {
    #[error("asset {asset_id} not conserved: inputs {inputs}, outputs {outputs}")]
    AssetImbalance {
        asset_id: AssetId,
        inputs: u64,
        outputs: u64,
    },

    #[error("insufficient funds: {available} available for the fee asset, {required} required")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("amount overflow summing asset {0}")]
    AmountOverflow(AssetId),

    #[error("input {index} duplicates input {first}")]
    DuplicateInput { index: usize, first: usize },

    #[error("output {index}: control program is empty")]
    EmptyControlProgram { index: usize },

    #[error("entry encoding failed: {0}")]
    Encoding(#[from] SerializationError),
}

/// Witness derivation failed for one input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("input {index}: no key available for program {program}")]
    MissingKey { index: usize, program: String },

    #[error("input {index}: unsupported program {program}")]
    UnsupportedProgram { index: usize, program: String },

    #[error("input {index}: key does not match program")]
    KeyMismatch { index: usize },
}

impl SigningError {
    pub fn index(&self) -> usize {
        match self {
            SigningError::MissingKey { index, .. }
            | SigningError::UnsupportedProgram { index, .. }
            | SigningError::KeyMismatch { index } => *index,
        }
    }
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxErrorKind {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("graph mapping failed: {0}")]
    GraphMapping(#[from] GraphMappingError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] SerializationError),

    #[error("signing failed: {0}")]
    Signing(#[from] SigningError),
}

impl TxErrorKind {
    /// Offending input or output index, where one applies.
    pub fn index(&self) -> Option<usize> {
        match self {
            TxErrorKind::Validation(ValidationError::InvalidInput { index, .. })
            | TxErrorKind::Validation(ValidationError::InvalidOutput { index, .. })
            | TxErrorKind::GraphMapping(GraphMappingError::DuplicateInput { index, .. })
            | TxErrorKind::GraphMapping(GraphMappingError::EmptyControlProgram { index }) => {
                Some(*index)
            }
            TxErrorKind::Signing(e) => Some(e.index()),
            _ => None,
        }
    }
}

/// Top-level failure of [`super::TransactionBuilder::build`].
///
/// `stage` is the stage the pipeline was trying to reach when it failed,
/// set by the stage function that raised the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage}: {kind}")]
pub struct TxError {
    stage: BuildStage,
    kind: TxErrorKind,
}

impl TxError {
    pub fn new(stage: BuildStage, kind: impl Into<TxErrorKind>) -> Self {
        Self {
            stage,
            kind: kind.into(),
        }
    }

    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    pub fn kind(&self) -> &TxErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> TxErrorKind {
        self.kind
    }

    /// Offending input or output index, where one applies.
    pub fn index(&self) -> Option<usize> {
        self.kind.index()
    }
}

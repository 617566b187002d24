//! Value types shared by entries: programs, asset amounts and the
//! source/destination edges of the entry graph.

use serde::{Deserialize, Serialize};

use super::hashing::WriteForHash;
use crate::crypto::hash::{sha3_256, AssetId, Hash};
use crate::encoding::{CanonicalWriter, SerializationError};

/// A VM program: `(vm_version, code)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub vm_version: u64,
    #[serde(with = "hex_bytes")]
    pub code: Vec<u8>,
}

impl Program {
    pub fn new(vm_version: u64, code: Vec<u8>) -> Self {
        Self { vm_version, code }
    }
}

impl WriteForHash for Program {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        self.vm_version.write_for_hash(w)?;
        self.code.write_for_hash(w)
    }
}

/// An amount of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset_id: AssetId,
    pub amount: u64,
}

impl AssetAmount {
    pub fn new(asset_id: AssetId, amount: u64) -> Self {
        Self { asset_id, amount }
    }
}

impl WriteForHash for AssetAmount {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        self.asset_id.write_for_hash(w)?;
        self.amount.write_for_hash(w)
    }
}

/// Edge from a producing entry: `value` flows out of `reference` at
/// `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSource {
    pub reference: Hash,
    pub value: AssetAmount,
    pub position: u64,
}

impl ValueSource {
    pub fn new(reference: Hash, value: AssetAmount, position: u64) -> Self {
        Self {
            reference,
            value,
            position,
        }
    }
}

impl WriteForHash for ValueSource {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        self.reference.write_for_hash(w)?;
        self.value.write_for_hash(w)?;
        self.position.write_for_hash(w)
    }
}

/// Edge to a consuming entry. Never hashed by the entries that hold it, which
/// is what lets an input point forward to the mux without a hash cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDestination {
    pub reference: Hash,
    pub value: AssetAmount,
    pub position: u64,
}

impl ValueDestination {
    pub fn new(reference: Hash, value: AssetAmount, position: u64) -> Self {
        Self {
            reference,
            value,
            position,
        }
    }
}

/// The issuance program plus the hash of the definition document. Its hash
/// is the asset id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDefinition {
    pub issuance_program: Program,
    pub data: Hash,
}

impl AssetDefinition {
    /// `data` is the hash of the raw definition bytes.
    pub fn new(issuance_program: Program, definition: &[u8]) -> Self {
        Self {
            issuance_program,
            data: Hash::digest(definition),
        }
    }

    pub fn compute_asset_id(&self) -> Result<AssetId, SerializationError> {
        let mut w = CanonicalWriter::new();
        self.write_for_hash(&mut w)?;
        Ok(AssetId::new(sha3_256(w.as_bytes())))
    }
}

impl WriteForHash for AssetDefinition {
    fn write_for_hash(&self, w: &mut CanonicalWriter) -> Result<(), SerializationError> {
        self.issuance_program.write_for_hash(w)?;
        self.data.write_for_hash(w)
    }
}

/// Serde adapter rendering byte vectors as hex strings.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

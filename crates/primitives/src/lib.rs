use core::fmt;
use core::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// A single cell of a data square. Every chunk within one square has the
/// same length.
pub type Chunk = Vec<u8>;

/// An axis-line commitment. Opaque bytes; the length is decided by the tree
/// that produced it (32 for the default SHA-256 tree).
pub type Commitment = Vec<u8>;

/// The two axes of a data square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// The byte used for the parity namespace of erasure-extended chunks.
pub const PARITY_NAMESPACE_BYTE: u8 = 0xFF;

/// A namespace identifier, prefixed uniformly per row before hashing.
/// All identifiers within one square share the same size.
#[serde_as]
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Serialize, Deserialize, Debug)]
pub struct NamespaceId(#[serde_as(as = "serde_with::hex::Hex")] Vec<u8>);

impl NamespaceId {
    pub fn new(id: Vec<u8>) -> Self {
        Self(id)
    }

    /// The parity namespace of a given size, an all-`0xFF` identifier.
    pub fn parity(size: usize) -> Self {
        Self(vec![PARITY_NAMESPACE_BYTE; size])
    }

    pub fn size(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<u8>> for NamespaceId {
    fn from(id: Vec<u8>) -> Self {
        Self(id)
    }
}

impl Deref for NamespaceId {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// An inclusion proof for a single chunk of an axis-line.
///
/// `set[0]` is the raw leaf; the remaining entries are the sibling subtree
/// hashes from the leaf up to the root.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub root: Commitment,
    #[serde_as(as = "Vec<serde_with::hex::Hex>")]
    pub set: Vec<Vec<u8>>,
    pub index: u64,
    pub leaf_count: u64,
}

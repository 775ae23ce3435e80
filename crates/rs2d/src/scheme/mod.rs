//! Axis commitments over the extended square.

use rs2d_primitives::{Axis, Chunk, Commitment, Proof};

use crate::square::ExtendedDataSquare;

mod merkle;

pub use merkle::DefaultTree;

/// A per-axis-line commitment tree.
///
/// Callers pick one tree for a square and commit to that choice out of
/// band; the same tree must be used for building commitments, repairing
/// and verifying proofs. Implementations may augment leaves before hashing
/// (a namespace-aware tree, for instance); the augmentation is observable
/// only through the resulting roots and proofs, never through the square's
/// cells.
pub trait Tree: Send + Sync {
    /// The root over one axis-line of chunks.
    fn root(&self, leaves: &[Chunk]) -> Commitment;

    /// An inclusion proof for `leaves[index]`.
    fn prove(&self, index: usize, leaves: &[Chunk]) -> Proof;
}

/// The roots of every axis-line on one axis of a finalised square,
/// `2k` of them in line order.
pub fn commitments(axis: Axis, eds: &ExtendedDataSquare, tree: &dyn Tree) -> Vec<Commitment> {
    (0..eds.width())
        .map(|i| match axis {
            Axis::Row => tree.root(&eds.row(i)),
            Axis::Column => tree.root(&eds.column(i)),
        })
        .collect()
}

/// An inclusion proof for the chunk at position `index` of axis-line
/// `line`.
///
/// Panics if `line` or `index` is out of range for the square.
pub fn prove(
    eds: &ExtendedDataSquare,
    axis: Axis,
    line: usize,
    index: usize,
    tree: &dyn Tree,
) -> Proof {
    let leaves = match axis {
        Axis::Row => eds.row(line),
        Axis::Column => eds.column(line),
    };
    tree.prove(index, &leaves)
}

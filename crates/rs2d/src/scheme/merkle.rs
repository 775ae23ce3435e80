//! The default axis tree: a domain-separated binary SHA-256 Merkle tree.

use rs2d_primitives::{Chunk, Commitment, Proof};
use sha2::{Digest, Sha256};

use super::Tree;

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Binary SHA-256 Merkle tree over raw chunk bytes.
///
/// Leaves are hashed as `H(0x00 || leaf)` and interior nodes as
/// `H(0x01 || left || right)`; an unbalanced level splits at the largest
/// power of two below the leaf count.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTree;

fn leaf_hash(leaf: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(leaf);
    hasher.finalize().into()
}

fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Largest power of two strictly below `n`. `n` must be at least 2.
fn split_point(n: usize) -> usize {
    1 << (usize::BITS - 1 - (n - 1).leading_zeros())
}

fn subtree_root(leaves: &[Chunk]) -> [u8; 32] {
    match leaves {
        [] => Sha256::new().finalize().into(),
        [leaf] => leaf_hash(leaf),
        _ => {
            let split = split_point(leaves.len());
            node_hash(
                &subtree_root(&leaves[..split]),
                &subtree_root(&leaves[split..]),
            )
        }
    }
}

// Walks down to the leaf, recording each sibling subtree root on the way
// back up, so siblings end up ordered leaf-to-root.
fn subtree_proof(leaves: &[Chunk], index: usize, siblings: &mut Vec<Vec<u8>>) -> [u8; 32] {
    if leaves.len() == 1 {
        return leaf_hash(&leaves[0]);
    }
    let split = split_point(leaves.len());
    if index < split {
        let here = subtree_proof(&leaves[..split], index, siblings);
        let sibling = subtree_root(&leaves[split..]);
        siblings.push(sibling.to_vec());
        node_hash(&here, &sibling)
    } else {
        let here = subtree_proof(&leaves[split..], index - split, siblings);
        let sibling = subtree_root(&leaves[..split]);
        siblings.push(sibling.to_vec());
        node_hash(&sibling, &here)
    }
}

impl Tree for DefaultTree {
    fn root(&self, leaves: &[Chunk]) -> Commitment {
        subtree_root(leaves).to_vec()
    }

    fn prove(&self, index: usize, leaves: &[Chunk]) -> Proof {
        let mut set = vec![leaves[index].clone()];
        let mut siblings = Vec::new();
        let root = subtree_proof(leaves, index, &mut siblings);
        set.extend(siblings);
        Proof {
            root: root.to_vec(),
            set,
            index: index as u64,
            leaf_count: leaves.len() as u64,
        }
    }
}

impl DefaultTree {
    /// Recompute the root from a proof set and compare it to the claimed
    /// root.
    pub fn verify(proof: &Proof) -> bool {
        let Some(leaf) = proof.set.first() else {
            return false;
        };

        // Re-derive the left/right turns from root to leaf.
        let mut turns = Vec::new();
        let (mut count, mut index) = (proof.leaf_count as usize, proof.index as usize);
        if index >= count || count == 0 {
            return false;
        }
        while count > 1 {
            let split = split_point(count);
            if index < split {
                turns.push(true);
                count = split;
            } else {
                turns.push(false);
                index -= split;
                count -= split;
            }
        }
        if proof.set.len() != turns.len() + 1 {
            return false;
        }

        let mut hash = leaf_hash(leaf);
        for (went_left, sibling) in turns.iter().rev().zip(&proof.set[1..]) {
            let Ok(sibling) = <[u8; 32]>::try_from(sibling.as_slice()) else {
                return false;
            };
            hash = if *went_left {
                node_hash(&hash, &sibling)
            } else {
                node_hash(&sibling, &hash)
            };
        }
        hash.as_slice() == proof.root
    }
}

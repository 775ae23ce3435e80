//! Two dimensional Reed-Solomon Merkle tree data availability scheme.
//!
//! An original `k x k` square of equal-sized chunks is extended to a
//! `2k x 2k` square by systematic Reed-Solomon coding along both axes,
//! and committed to with one Merkle root per row and per column. Any
//! subset of cells that leaves at least `k` recoverable positions on
//! enough axis-lines can be repaired back to the full square; supplied
//! commitments that contradict each other are detected during repair and
//! reported as Byzantine row or column faults carrying the offending
//! axis-line.
//!
//! # Overview
//!
//! - [`compute_extended_data_square`] builds the extended square from
//!   original chunks; [`parallel_compute_extended_data_square`] does the
//!   same across a worker pool.
//! - [`compute_named_extended_data_square`] additionally prefixes cells
//!   with namespace identifiers before hashing.
//! - [`commitments`] derives the row or column roots under a chosen
//!   [`Tree`]; [`prove`] produces inclusion proofs for single cells.
//! - [`repair_extended_data_square`] reconstructs a square from partial
//!   cells and the committed roots.
//!
//! The erasure codec and the commitment tree are ports: the built-in
//! [`CodecType::RsGf8`] codec and [`DefaultTree`] cover the common case,
//! and user-supplied trees plug in through the [`Tree`] trait.

#![forbid(unsafe_code)]

mod erasure;
mod error;
mod gf256;
mod grid;
mod parallel;
mod repair;
mod scheme;
mod square;

pub use rs2d_primitives::{
    Axis, Chunk, Commitment, NamespaceId, Proof, PARITY_NAMESPACE_BYTE,
};

pub use erasure::{Codec, CodecType};
pub use error::{BuildError, CodecError, DecodeError, RepairError};
pub use parallel::parallel_compute_extended_data_square;
pub use repair::repair_extended_data_square;
pub use scheme::{commitments, prove, DefaultTree, Tree};
pub use square::{
    compute_extended_data_square, compute_named_extended_data_square,
    import_extended_data_square, ExtendedDataSquare,
};

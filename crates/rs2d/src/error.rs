//! Typed errors for square construction, erasure coding and repair.

use rs2d_primitives::{Axis, Chunk};
use thiserror::Error;

/// Errors from the erasure codec port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The backend does not support a line of this length.
    #[error("unsupported codeword length {len}: this codec extends up to {max} chunks per line")]
    UnsupportedLen {
        /// Number of original chunks handed to the codec.
        len: usize,
        /// Largest supported original line length.
        max: usize,
    },

    /// Chunks of unequal size handed to the codec.
    #[error("codec chunks must be of equal size: expected {expected}, got {got}")]
    ChunkSize {
        /// Size of the first chunk.
        expected: usize,
        /// Size of the offending chunk.
        got: usize,
    },
}

/// Errors from erasure-decoding a single axis-line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer present positions than the code can recover from.
    #[error("insufficient chunks: {present} present, {needed} needed")]
    Insufficient { present: usize, needed: usize },

    /// The present positions are inconsistent with every valid codeword.
    #[error("present chunks do not form a valid codeword")]
    Corrupt,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from building or importing an extended data square.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The flat chunk count is not a perfect square.
    #[error("number of chunks must be a square number, got {len}")]
    NotSquare { len: usize },

    /// A chunk (or filler chunk) does not match the square's chunk size.
    #[error("all chunks must be of equal size: expected {expected}, got {got}")]
    ChunkSize { expected: usize, got: usize },

    /// More chunks than the codec supports.
    #[error("number of chunks exceeds the maximum: {len} > {max}")]
    TooManyChunks { len: usize, max: usize },

    /// Imported squares must have an even width.
    #[error("square width must be even, got {width}")]
    OddWidth { width: usize },

    /// No chunks to build a square from.
    #[error("no chunks present")]
    Empty,

    /// Namespace identifier count does not match the original square.
    #[error("unexpected number of namespace ids: wanted {wanted}, got {got}")]
    NamespaceCount { wanted: usize, got: usize },

    /// Namespace identifiers of inconsistent size.
    #[error("namespace ids must be of equal size: expected {expected}, got {got}")]
    NamespaceSize { expected: usize, got: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from repairing an extended data square from partial cells.
///
/// The Byzantine variants carry the full axis-line as observed at detection
/// time, with `None` for positions that were never recovered. This is the
/// evidence a caller needs to construct a fraud proof.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepairError {
    /// A row inconsistent with its committed root or with the code.
    #[error("byzantine row {index}")]
    ByzantineRow {
        index: usize,
        chunks: Vec<Option<Chunk>>,
    },

    /// A column inconsistent with its committed root or with the code.
    #[error("byzantine column {index}")]
    ByzantineColumn {
        index: usize,
        chunks: Vec<Option<Chunk>>,
    },

    /// A full sweep over both axes filled no new cell.
    #[error("not enough chunks to repair the square")]
    Unrepairable,

    /// A commitment vector does not match the square width.
    #[error("expected {expected} {axis} roots, got {got}")]
    RootCount {
        axis: Axis,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Build(#[from] BuildError),
}

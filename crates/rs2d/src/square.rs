//! The extended square: quadrant layout and the two-dimensional extension
//! algorithm.

use rs2d_primitives::{Chunk, NamespaceId};

use crate::erasure::{Codec, CodecType};
use crate::error::BuildError;
use crate::grid::DataSquare;

/// A `2k x 2k` erasure-extended square of chunks.
///
/// The original `k x k` data sits in the upper-left quadrant; the other
/// three quadrants carry row parity, column parity and parity-of-parity.
/// The square is immutable once built or repaired.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedDataSquare {
    square: DataSquare,
    original_data_width: usize,
    codec: CodecType,
}

/// The zero-filled `2k x 2k` square an extension starts from.
pub(crate) fn extension_base(data: &[Chunk], codec: CodecType) -> Result<DataSquare, BuildError> {
    if data.len() > codec.max_chunks() {
        return Err(BuildError::TooManyChunks {
            len: data.len(),
            max: codec.max_chunks(),
        });
    }

    let mut square = DataSquare::new(data)?;
    let k = square.width();
    square.extend(k, &vec![0u8; square.chunk_size()])?;
    Ok(square)
}

/// Compute the extended data square for some chunks of data.
pub fn compute_extended_data_square(
    data: &[Chunk],
    codec: CodecType,
) -> Result<ExtendedDataSquare, BuildError> {
    let square = extension_base(data, codec)?;
    let mut eds = ExtendedDataSquare {
        original_data_width: square.width() / 2,
        square,
        codec,
    };
    eds.erasure_extend()?;
    Ok(eds)
}

/// Compute the extended data square for some chunks of namespaced data.
///
/// Original cells are prefixed with their own identifier, row-major; every
/// parity cell is prefixed with the all-`0xFF` parity namespace of the
/// same size.
pub fn compute_named_extended_data_square(
    data: &[Chunk],
    names: &[NamespaceId],
    codec: CodecType,
) -> Result<ExtendedDataSquare, BuildError> {
    let mut eds = compute_extended_data_square(data, codec)?;
    eds.add_namespace_prefix(names)?;
    Ok(eds)
}

/// Import an extended data square from its flattened representation.
/// Does not re-encode anything.
pub fn import_extended_data_square(
    data: &[Chunk],
    codec: CodecType,
) -> Result<ExtendedDataSquare, BuildError> {
    if data.len() > 4 * codec.max_chunks() {
        return Err(BuildError::TooManyChunks {
            len: data.len(),
            max: 4 * codec.max_chunks(),
        });
    }

    let square = DataSquare::new(data)?;
    if square.width() % 2 != 0 {
        return Err(BuildError::OddWidth {
            width: square.width(),
        });
    }

    Ok(ExtendedDataSquare {
        original_data_width: square.width() / 2,
        square,
        codec,
    })
}

impl ExtendedDataSquare {
    pub(crate) fn from_parts(
        square: DataSquare,
        original_data_width: usize,
        codec: CodecType,
    ) -> Self {
        Self {
            square,
            original_data_width,
            codec,
        }
    }

    pub(crate) fn square(&self) -> &DataSquare {
        &self.square
    }

    pub(crate) fn square_mut(&mut self) -> &mut DataSquare {
        &mut self.square
    }

    // Extend the original square horizontally and vertically, then extend
    // the column parity horizontally:
    //
    //  ------- -------
    // |       |       |
    // |   O → |   E   |
    // |   ↓   |       |
    //  ------- -------
    // |       |       |
    // |   E → |   E   |
    // |       |       |
    //  ------- -------
    fn erasure_extend(&mut self) -> Result<(), BuildError> {
        let k = self.original_data_width;
        let codec = self.codec.codec();
        log::debug!("extending {}x{} square to {}x{}", k, k, 2 * k, 2 * k);

        for i in 0..k {
            let encoded = codec.encode(&self.square.row_data(i, 0, k))?;
            self.square.set_row_slice(i, k, &encoded[k..])?;

            let encoded = codec.encode(&self.square.column_data(0, i, k))?;
            self.square.set_column_slice(k, i, &encoded[k..])?;
        }

        for i in k..2 * k {
            let encoded = codec.encode(&self.square.row_data(i, 0, k))?;
            self.square.set_row_slice(i, k, &encoded[k..])?;
        }

        Ok(())
    }

    fn add_namespace_prefix(&mut self, ids: &[NamespaceId]) -> Result<(), BuildError> {
        let k = self.original_data_width;
        let wanted = k * k;
        if ids.len() != wanted {
            return Err(BuildError::NamespaceCount {
                wanted,
                got: ids.len(),
            });
        }
        let size = ids[0].size();
        for id in ids {
            if id.size() != size {
                return Err(BuildError::NamespaceSize {
                    expected: size,
                    got: id.size(),
                });
            }
        }

        let parity = NamespaceId::parity(size);
        for r in 0..self.width() {
            if r < k {
                self.square.name_row(r, 0, &ids[r * k..(r + 1) * k])?;
                self.square.uniform_name_row(r, k, &parity);
            } else {
                self.square.uniform_name_row(r, 0, &parity);
            }
        }

        let named_size = self.square.chunk_size() + size;
        self.square.set_chunk_size(named_size);
        Ok(())
    }

    /// Width of the extended square, `2k`.
    pub fn width(&self) -> usize {
        self.square.width()
    }

    /// Width of the original data square, `k`.
    pub fn original_data_width(&self) -> usize {
        self.original_data_width
    }

    pub fn codec(&self) -> CodecType {
        self.codec
    }

    pub fn chunk_size(&self) -> usize {
        self.square.chunk_size()
    }

    /// The chunks of row `r`.
    pub fn row(&self, r: usize) -> Vec<Chunk> {
        self.square.row_data(r, 0, self.width())
    }

    /// The chunks of column `c`.
    pub fn column(&self, c: usize) -> Vec<Chunk> {
        self.square.column_data(0, c, self.width())
    }

    /// A copy of a single cell.
    pub fn cell(&self, r: usize, c: usize) -> Option<Chunk> {
        self.square.cell(r, c)
    }

    /// Row-major serialisation of the square.
    pub fn flattened(&self) -> Vec<Chunk> {
        self.square.flattened().into_iter().flatten().collect()
    }
}

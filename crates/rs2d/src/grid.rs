//! Row-and-column addressable storage for a square of equal-sized chunks.

use nalgebra::DMatrix;
use rs2d_primitives::{Chunk, NamespaceId};

use crate::error::BuildError;

/// A `width x width` grid of chunks, also known as a perfect matrix.
///
/// Cells hold `None` only while a square is being repaired from partial
/// data; built squares are fully populated. Every present cell holds
/// exactly `chunk_size` bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSquare {
    inner: DMatrix<Option<Chunk>>,
    width: usize,
    chunk_size: usize,
}

/// Side length of the perfect square holding `len` chunks, if any.
fn square_width(len: usize) -> Option<usize> {
    let width = (len as f64).sqrt().round() as usize;
    (width * width == len).then_some(width)
}

impl DataSquare {
    pub fn new(data: &[Chunk]) -> Result<Self, BuildError> {
        if data.is_empty() {
            return Err(BuildError::Empty);
        }
        let width = square_width(data.len()).ok_or(BuildError::NotSquare { len: data.len() })?;

        let chunk_size = data[0].len();
        for chunk in data {
            if chunk.len() != chunk_size {
                return Err(BuildError::ChunkSize {
                    expected: chunk_size,
                    got: chunk.len(),
                });
            }
        }

        Ok(Self {
            inner: DMatrix::from_row_iterator(width, width, data.iter().cloned().map(Some)),
            width,
            chunk_size,
        })
    }

    /// Build a square from row-major cells of which some may be missing.
    /// The chunk size is learned from the first present cell.
    pub fn from_partial(cells: Vec<Option<Chunk>>) -> Result<Self, BuildError> {
        let width = square_width(cells.len()).ok_or(BuildError::NotSquare { len: cells.len() })?;

        let chunk_size = cells
            .iter()
            .flatten()
            .next()
            .map(|chunk| chunk.len())
            .ok_or(BuildError::Empty)?;
        for chunk in cells.iter().flatten() {
            if chunk.len() != chunk_size {
                return Err(BuildError::ChunkSize {
                    expected: chunk_size,
                    got: chunk.len(),
                });
            }
        }

        Ok(Self {
            inner: DMatrix::from_row_iterator(width, width, cells),
            width,
            chunk_size,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Grow the square by `delta` rows and columns of the filler chunk.
    pub fn extend(&mut self, delta: usize, filler: &Chunk) -> Result<(), BuildError> {
        if filler.len() != self.chunk_size {
            return Err(BuildError::ChunkSize {
                expected: self.chunk_size,
                got: filler.len(),
            });
        }
        let new_width = self.width + delta;
        let inner = std::mem::replace(&mut self.inner, DMatrix::from_vec(0, 0, vec![]));
        self.inner = inner.resize(new_width, new_width, Some(filler.clone()));
        self.width = new_width;
        Ok(())
    }

    pub fn row_slice(&self, r: usize, c_start: usize, len: usize) -> Vec<Option<Chunk>> {
        (c_start..c_start + len)
            .map(|c| self.inner[(r, c)].clone())
            .collect()
    }

    pub fn row(&self, r: usize) -> Vec<Option<Chunk>> {
        self.row_slice(r, 0, self.width)
    }

    /// The present chunks of a row slice. Build paths call this on fully
    /// populated rows only.
    pub fn row_data(&self, r: usize, c_start: usize, len: usize) -> Vec<Chunk> {
        self.row_slice(r, c_start, len).into_iter().flatten().collect()
    }

    pub fn column_slice(&self, r_start: usize, c: usize, len: usize) -> Vec<Option<Chunk>> {
        (r_start..r_start + len)
            .map(|r| self.inner[(r, c)].clone())
            .collect()
    }

    pub fn column(&self, c: usize) -> Vec<Option<Chunk>> {
        self.column_slice(0, c, self.width)
    }

    pub fn column_data(&self, r_start: usize, c: usize, len: usize) -> Vec<Chunk> {
        self.column_slice(r_start, c, len)
            .into_iter()
            .flatten()
            .collect()
    }

    /// A copy of a single cell, `None` if it is missing.
    pub fn cell(&self, r: usize, c: usize) -> Option<Chunk> {
        self.inner[(r, c)].clone()
    }

    pub fn set_cell(&mut self, r: usize, c: usize, chunk: Chunk) -> Result<(), BuildError> {
        if chunk.len() != self.chunk_size {
            return Err(BuildError::ChunkSize {
                expected: self.chunk_size,
                got: chunk.len(),
            });
        }
        self.inner[(r, c)] = Some(chunk);
        Ok(())
    }

    pub fn set_row_slice(
        &mut self,
        r: usize,
        c_start: usize,
        chunks: &[Chunk],
    ) -> Result<(), BuildError> {
        for chunk in chunks {
            if chunk.len() != self.chunk_size {
                return Err(BuildError::ChunkSize {
                    expected: self.chunk_size,
                    got: chunk.len(),
                });
            }
        }
        for (i, chunk) in chunks.iter().enumerate() {
            self.inner[(r, c_start + i)] = Some(chunk.clone());
        }
        Ok(())
    }

    pub fn set_column_slice(
        &mut self,
        r_start: usize,
        c: usize,
        chunks: &[Chunk],
    ) -> Result<(), BuildError> {
        for chunk in chunks {
            if chunk.len() != self.chunk_size {
                return Err(BuildError::ChunkSize {
                    expected: self.chunk_size,
                    got: chunk.len(),
                });
            }
        }
        for (i, chunk) in chunks.iter().enumerate() {
            self.inner[(r_start + i, c)] = Some(chunk.clone());
        }
        Ok(())
    }

    /// Prefix each cell of row `r` from column `c_start` on with its own
    /// namespace identifier.
    pub fn name_row(
        &mut self,
        r: usize,
        c_start: usize,
        names: &[NamespaceId],
    ) -> Result<(), BuildError> {
        let size = names.first().map_or(0, |id| id.size());
        for id in names {
            if id.size() != size {
                return Err(BuildError::NamespaceSize {
                    expected: size,
                    got: id.size(),
                });
            }
        }
        for (i, id) in names.iter().enumerate() {
            self.prefix_cell(r, c_start + i, id);
        }
        Ok(())
    }

    /// Prefix every cell of row `r` from column `c_start` to the end of
    /// the row with the same namespace identifier.
    pub fn uniform_name_row(&mut self, r: usize, c_start: usize, name: &NamespaceId) {
        for c in c_start..self.width {
            self.prefix_cell(r, c, name);
        }
    }

    fn prefix_cell(&mut self, r: usize, c: usize, name: &NamespaceId) {
        if let Some(cell) = &mut self.inner[(r, c)] {
            let mut named = Vec::with_capacity(name.size() + cell.len());
            named.extend_from_slice(name);
            named.extend_from_slice(cell);
            *cell = named;
        }
    }

    // Naming grows every cell at once; the square-level caller records the
    // new uniform size here.
    pub(crate) fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size;
    }

    /// Row-major cells, missing ones as `None`.
    pub fn flattened(&self) -> Vec<Option<Chunk>> {
        (0..self.width).flat_map(|r| self.row(r)).collect()
    }
}

//! The erasure codec port and the built-in GF(2^8) Reed-Solomon backend.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use itertools::Itertools;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rs2d_primitives::Chunk;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, DecodeError};
use crate::gf256::{self, Matrix};

/// Identifier of a built-in erasure codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    /// Systematic Reed-Solomon over GF(2^8).
    RsGf8,
}

impl CodecType {
    pub(crate) fn codec(self) -> &'static dyn Codec {
        match self {
            CodecType::RsGf8 => &RsGf8,
        }
    }

    /// Upper bound on the number of original chunks a square built with
    /// this codec may hold.
    pub fn max_chunks(self) -> usize {
        self.codec().max_chunks()
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecType::RsGf8 => write!(f, "rs-gf8"),
        }
    }
}

/// An erasure encoder/decoder over chunk vectors.
///
/// Implementations are systematic: the first `k` encoded positions carry
/// the original chunks unchanged, the next `k` carry parity. The codec
/// holds no per-square state and may be invoked concurrently.
pub trait Codec: Send + Sync {
    /// Extend `k` original chunks to a `2k` chunk codeword.
    fn encode(&self, original: &[Chunk]) -> Result<Vec<Chunk>, CodecError>;

    /// Recover the full `2k` line from at least `k` present positions.
    ///
    /// Present positions inconsistent with every valid codeword are
    /// reported as [`DecodeError::Corrupt`].
    fn decode(&self, line: &[Option<Chunk>]) -> Result<Vec<Chunk>, DecodeError>;

    /// The largest flat chunk count a square built with this codec may
    /// hold.
    fn max_chunks(&self) -> usize;
}

/// Widest original axis-line the GF(2^8) backend can extend: the codeword
/// evaluation points must stay distinct within the field.
const MAX_ORIGINAL_WIDTH: usize = 128;

static GENERATORS: Lazy<Mutex<HashMap<usize, Arc<Matrix>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn cached_generator(k: usize) -> Result<Arc<Matrix>, CodecError> {
    let mut cache = GENERATORS.lock();
    if let Some(m) = cache.get(&k) {
        return Ok(m.clone());
    }
    log::debug!("building rs-gf8 generator: k({}), n({})", k, 2 * k);
    let m = gf256::generator(2 * k, k).ok_or(CodecError::UnsupportedLen {
        len: k,
        max: MAX_ORIGINAL_WIDTH,
    })?;
    let m = Arc::new(m);
    cache.insert(k, m.clone());
    Ok(m)
}

/// The built-in systematic Reed-Solomon codec over GF(2^8).
pub(crate) struct RsGf8;

impl Codec for RsGf8 {
    fn encode(&self, original: &[Chunk]) -> Result<Vec<Chunk>, CodecError> {
        let k = original.len();
        if k == 0 || k > MAX_ORIGINAL_WIDTH {
            return Err(CodecError::UnsupportedLen {
                len: k,
                max: MAX_ORIGINAL_WIDTH,
            });
        }
        let size = original[0].len();
        for chunk in original {
            if chunk.len() != size {
                return Err(CodecError::ChunkSize {
                    expected: size,
                    got: chunk.len(),
                });
            }
        }

        let gen = cached_generator(k)?;
        let inputs: Vec<&[u8]> = original.iter().map(|c| c.as_slice()).collect();
        Ok(gen.apply(&inputs))
    }

    fn decode(&self, line: &[Option<Chunk>]) -> Result<Vec<Chunk>, DecodeError> {
        let n = line.len();
        if n == 0 || n % 2 != 0 || n / 2 > MAX_ORIGINAL_WIDTH {
            return Err(CodecError::UnsupportedLen {
                len: n,
                max: 2 * MAX_ORIGINAL_WIDTH,
            }
            .into());
        }
        let k = n / 2;

        let present: Vec<usize> = line.iter().positions(|c| c.is_some()).collect();
        if present.len() < k {
            return Err(DecodeError::Insufficient {
                present: present.len(),
                needed: k,
            });
        }
        fn chunk_at(line: &[Option<Chunk>], i: usize) -> &[u8] {
            line[i].as_deref().unwrap_or_default()
        }
        let size = chunk_at(line, present[0]).len();
        for &i in &present {
            if chunk_at(line, i).len() != size {
                return Err(CodecError::ChunkSize {
                    expected: size,
                    got: chunk_at(line, i).len(),
                }
                .into());
            }
        }

        let gen = cached_generator(k)?;
        let picked = &present[..k];
        // Any k rows of the generator are linearly independent, so an
        // in-range k cannot produce a singular submatrix.
        let sub_inv = gen
            .select_rows(picked)
            .invert()
            .ok_or(DecodeError::Corrupt)?;
        let picked_chunks: Vec<&[u8]> = picked.iter().map(|&i| chunk_at(line, i)).collect();
        let original = sub_inv.apply(&picked_chunks);

        let originals: Vec<&[u8]> = original.iter().map(|c| c.as_slice()).collect();
        let full = gen.apply(&originals);
        for &i in &present {
            if chunk_at(line, i) != full[i].as_slice() {
                return Err(DecodeError::Corrupt);
            }
        }
        Ok(full)
    }

    fn max_chunks(&self) -> usize {
        MAX_ORIGINAL_WIDTH * MAX_ORIGINAL_WIDTH
    }
}

//! Arithmetic over GF(2^8) and the matrix algebra behind the built-in
//! Reed-Solomon codec.
//!
//! The field is generated by the primitive polynomial `x^8 + x^4 + x^3 +
//! x^2 + 1` (0x11D) with generator element 2. Multiplication goes through
//! log/exp tables built once on first use.

use itertools::Itertools;
use once_cell::sync::Lazy;
use rs2d_primitives::Chunk;

const PRIMITIVE_POLY: u16 = 0x11D;

/// Multiplicative order of the field's generator.
const ORDER: usize = 255;

struct Tables {
    // exp is doubled so that mul never reduces an exponent sum.
    exp: [u8; 2 * ORDER],
    log: [u8; 256],
}

static TABLES: Lazy<Tables> = Lazy::new(|| {
    let mut exp = [0u8; 2 * ORDER];
    let mut log = [0u8; 256];
    let mut x: u16 = 1;
    for i in 0..ORDER {
        exp[i] = x as u8;
        log[x as usize] = i as u8;
        x <<= 1;
        if x & 0x100 != 0 {
            x ^= PRIMITIVE_POLY;
        }
    }
    for i in ORDER..2 * ORDER {
        exp[i] = exp[i - ORDER];
    }
    Tables { exp, log }
});

pub(crate) fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = &*TABLES;
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

/// Multiplicative inverse. `a` must be non-zero.
pub(crate) fn inv(a: u8) -> u8 {
    debug_assert_ne!(a, 0);
    let t = &*TABLES;
    t.exp[ORDER - t.log[a as usize] as usize]
}

/// The generator element raised to `p`.
fn alpha_pow(p: usize) -> u8 {
    TABLES.exp[p % ORDER]
}

/// A dense row-major byte matrix over GF(2^8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    pub(crate) fn zero(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    pub(crate) fn identity(n: usize) -> Self {
        let mut m = Self::zero(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    pub(crate) fn at(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    pub(crate) fn set(&mut self, r: usize, c: usize, v: u8) {
        self.data[r * self.cols + c] = v;
    }

    pub(crate) fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// A new matrix made of the given rows of `self`, in order.
    pub(crate) fn select_rows(&self, rows: &[usize]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &r in rows {
            data.extend_from_slice(self.row(r));
        }
        Self {
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    pub(crate) fn matmul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.cols, other.rows);
        let mut out = Matrix::zero(self.rows, other.cols);
        for (r, c) in (0..self.rows).cartesian_product(0..other.cols) {
            let mut acc = 0u8;
            for i in 0..self.cols {
                acc ^= mul(self.at(r, i), other.at(i, c));
            }
            out.set(r, c, acc);
        }
        out
    }

    /// Gauss-Jordan inversion. Returns `None` for singular matrices.
    pub(crate) fn invert(&self) -> Option<Matrix> {
        debug_assert_eq!(self.rows, self.cols);
        let n = self.rows;
        let mut a = self.clone();
        let mut out = Matrix::identity(n);

        for col in 0..n {
            let pivot = (col..n).find(|&r| a.at(r, col) != 0)?;
            if pivot != col {
                a.swap_rows(pivot, col);
                out.swap_rows(pivot, col);
            }
            let scale = inv(a.at(col, col));
            a.scale_row(col, scale);
            out.scale_row(col, scale);
            for r in 0..n {
                let factor = a.at(r, col);
                if r != col && factor != 0 {
                    a.xor_scaled_row(r, col, factor);
                    out.xor_scaled_row(r, col, factor);
                }
            }
        }
        Some(out)
    }

    /// Multiply by `cols` chunk columns, producing `rows` chunks. All input
    /// chunks must share a length.
    pub(crate) fn apply(&self, chunks: &[&[u8]]) -> Vec<Chunk> {
        debug_assert_eq!(self.cols, chunks.len());
        let size = chunks.first().map_or(0, |c| c.len());
        let mut out = Vec::with_capacity(self.rows);
        for r in 0..self.rows {
            let mut acc = vec![0u8; size];
            for (c, chunk) in chunks.iter().enumerate() {
                let coef = self.at(r, c);
                if coef == 0 {
                    continue;
                }
                for (o, &b) in acc.iter_mut().zip(chunk.iter()) {
                    *o ^= mul(coef, b);
                }
            }
            out.push(acc);
        }
        out
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn scale_row(&mut self, r: usize, factor: u8) {
        for c in 0..self.cols {
            let v = self.at(r, c);
            self.set(r, c, mul(v, factor));
        }
    }

    /// row[r] ^= factor * row[src]
    fn xor_scaled_row(&mut self, r: usize, src: usize, factor: u8) {
        for c in 0..self.cols {
            let v = self.at(r, c) ^ mul(factor, self.at(src, c));
            self.set(r, c, v);
        }
    }
}

/// The systematic `n × k` encode matrix: the identity over the first `k`
/// rows, parity coefficients below.
///
/// Built by systematizing a Vandermonde matrix whose first row evaluates at
/// zero and whose remaining rows evaluate at consecutive powers of the
/// generator. The evaluation points must be distinct, which holds for
/// `n - 1 <= 255`; larger requests return `None`.
pub(crate) fn generator(n: usize, k: usize) -> Option<Matrix> {
    if n == 0 || k == 0 || k > n || n - 1 > ORDER {
        return None;
    }
    let mut vdm = Matrix::zero(n, k);
    vdm.set(0, 0, 1);
    for (r, c) in (1..n).cartesian_product(0..k) {
        vdm.set(r, c, alpha_pow((r - 1) * c));
    }

    let top_inv = vdm.select_rows(&(0..k).collect::<Vec<_>>()).invert()?;
    let bottom = vdm.select_rows(&(k..n).collect::<Vec<_>>());
    let parity = bottom.matmul(&top_inv);

    let mut out = Matrix::zero(n, k);
    for i in 0..k {
        out.set(i, i, 1);
    }
    for (r, c) in (0..n - k).cartesian_product(0..k) {
        out.set(k + r, c, parity.at(r, c));
    }
    Some(out)
}

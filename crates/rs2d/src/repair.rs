//! Iterative cross-axis repair with Byzantine fault localisation.

use rs2d_primitives::{Axis, Chunk, Commitment};

use crate::erasure::{Codec, CodecType};
use crate::error::{BuildError, DecodeError, RepairError};
use crate::grid::DataSquare;
use crate::scheme::Tree;
use crate::square::ExtendedDataSquare;

enum LineOutcome {
    /// The line is complete and consistent; `filled` cells were written.
    Solved { filled: usize },
    /// Not enough present cells yet; retry after cross-axis fills.
    Deferred,
}

/// Repair an extended data square from a partial set of cells and the
/// committed axis roots.
///
/// `partial` holds one entry per cell in row-major order, `None` for cells
/// the caller could not obtain. The tree must be the one the roots were
/// built with.
///
/// Lines are solved in sweeps: rows in ascending order, then columns in
/// ascending order, until a full sweep fills no new cell. Every line is
/// checked against its committed root and against the code itself before
/// it is accepted; the first inconsistent line observed determines the
/// Byzantine error variant.
pub fn repair_extended_data_square(
    row_roots: &[Commitment],
    col_roots: &[Commitment],
    partial: Vec<Option<Chunk>>,
    codec: CodecType,
    tree: &dyn Tree,
) -> Result<ExtendedDataSquare, RepairError> {
    let square = match DataSquare::from_partial(partial) {
        Ok(square) => square,
        Err(BuildError::Empty) => return Err(RepairError::Unrepairable),
        Err(e) => return Err(e.into()),
    };
    let width = square.width();
    if width % 2 != 0 {
        return Err(BuildError::OddWidth { width }.into());
    }
    if row_roots.len() != width {
        return Err(RepairError::RootCount {
            axis: Axis::Row,
            expected: width,
            got: row_roots.len(),
        });
    }
    if col_roots.len() != width {
        return Err(RepairError::RootCount {
            axis: Axis::Column,
            expected: width,
            got: col_roots.len(),
        });
    }

    let mut eds = ExtendedDataSquare::from_parts(square, width / 2, codec);
    let codec_impl = codec.codec();

    // Every line starts out pending so that complete lines are validated
    // exactly once.
    let mut pending_rows = vec![true; width];
    let mut pending_cols = vec![true; width];

    loop {
        let mut progress = false;

        for r in 0..width {
            if !pending_rows[r] {
                continue;
            }
            match process_line(&mut eds, codec_impl, tree, Axis::Row, r, &row_roots[r])? {
                LineOutcome::Solved { filled } => {
                    pending_rows[r] = false;
                    progress |= filled > 0;
                }
                LineOutcome::Deferred => {}
            }
        }
        for c in 0..width {
            if !pending_cols[c] {
                continue;
            }
            match process_line(&mut eds, codec_impl, tree, Axis::Column, c, &col_roots[c])? {
                LineOutcome::Solved { filled } => {
                    pending_cols[c] = false;
                    progress |= filled > 0;
                }
                LineOutcome::Deferred => {}
            }
        }

        let done = pending_rows.iter().chain(pending_cols.iter()).all(|&p| !p);
        if done {
            break;
        }
        if !progress {
            return Err(RepairError::Unrepairable);
        }
    }

    // Final pass: every root must match the finished square.
    for r in 0..width {
        if tree.root(&eds.row(r)) != row_roots[r] {
            return Err(byzantine(Axis::Row, r, eds.square().row(r)));
        }
    }
    for c in 0..width {
        if tree.root(&eds.column(c)) != col_roots[c] {
            return Err(byzantine(Axis::Column, c, eds.square().column(c)));
        }
    }

    Ok(eds)
}

fn process_line(
    eds: &mut ExtendedDataSquare,
    codec: &dyn Codec,
    tree: &dyn Tree,
    axis: Axis,
    index: usize,
    root: &Commitment,
) -> Result<LineOutcome, RepairError> {
    let k = eds.original_data_width();
    let cells = match axis {
        Axis::Row => eds.square().row(index),
        Axis::Column => eds.square().column(index),
    };
    let missing = cells.iter().filter(|c| c.is_none()).count();
    if missing > k {
        return Ok(LineOutcome::Deferred);
    }

    if missing == 0 {
        let chunks: Vec<Chunk> = cells.iter().flatten().cloned().collect();
        if tree.root(&chunks) != *root {
            return Err(byzantine(axis, index, cells));
        }
        // A complete line must still be a valid codeword.
        return match codec.decode(&cells) {
            Ok(_) => Ok(LineOutcome::Solved { filled: 0 }),
            Err(DecodeError::Corrupt) => Err(byzantine(axis, index, cells)),
            Err(DecodeError::Insufficient { .. }) => Ok(LineOutcome::Deferred),
            Err(DecodeError::Codec(e)) => Err(RepairError::from(BuildError::from(e))),
        };
    }

    match codec.decode(&cells) {
        Ok(full) => {
            if tree.root(&full) != *root {
                let observed = full.into_iter().map(Some).collect();
                return Err(byzantine(axis, index, observed));
            }
            let mut filled = 0;
            for (i, cell) in cells.iter().enumerate() {
                if cell.is_none() {
                    match axis {
                        Axis::Row => eds.square_mut().set_cell(index, i, full[i].clone()),
                        Axis::Column => eds.square_mut().set_cell(i, index, full[i].clone()),
                    }
                    .map_err(RepairError::from)?;
                    filled += 1;
                }
            }
            log::debug!("{} {} decoded, {} cells filled", axis, index, filled);
            Ok(LineOutcome::Solved { filled })
        }
        Err(DecodeError::Corrupt) => Err(byzantine(axis, index, cells)),
        Err(DecodeError::Insufficient { .. }) => Ok(LineOutcome::Deferred),
        Err(DecodeError::Codec(e)) => Err(RepairError::from(BuildError::from(e))),
    }
}

fn byzantine(axis: Axis, index: usize, chunks: Vec<Option<Chunk>>) -> RepairError {
    match axis {
        Axis::Row => RepairError::ByzantineRow { index, chunks },
        Axis::Column => RepairError::ByzantineColumn { index, chunks },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{commitments, DefaultTree};
    use crate::square::compute_extended_data_square;
    use rand::{distributions::Standard, Rng};

    const CHUNK_SIZE: usize = 64;

    fn sample_square() -> (ExtendedDataSquare, Vec<Commitment>, Vec<Commitment>) {
        let _ = pretty_env_logger::try_init();
        let data = vec![
            vec![1u8; CHUNK_SIZE],
            vec![2u8; CHUNK_SIZE],
            vec![3u8; CHUNK_SIZE],
            vec![4u8; CHUNK_SIZE],
        ];
        let eds = compute_extended_data_square(&data, CodecType::RsGf8).unwrap();
        let row_roots = commitments(Axis::Row, &eds, &DefaultTree);
        let col_roots = commitments(Axis::Column, &eds, &DefaultTree);
        (eds, row_roots, col_roots)
    }

    fn cells_of(eds: &ExtendedDataSquare) -> Vec<Option<Chunk>> {
        eds.flattened().into_iter().map(Some).collect()
    }

    fn blank(cells: &mut [Option<Chunk>], indexes: &[usize]) {
        for &i in indexes {
            cells[i] = None;
        }
    }

    #[test]
    fn test_repair_from_partial_cells() {
        let (eds, row_roots, col_roots) = sample_square();
        let mut cells = cells_of(&eds);
        blank(&mut cells, &[0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13]);

        let result =
            repair_extended_data_square(&row_roots, &col_roots, cells, CodecType::RsGf8, &DefaultTree)
                .unwrap();
        assert_eq!(result.cell(0, 0), Some(vec![1u8; CHUNK_SIZE]));
        assert_eq!(result.cell(0, 1), Some(vec![2u8; CHUNK_SIZE]));
        assert_eq!(result.cell(1, 0), Some(vec![3u8; CHUNK_SIZE]));
        assert_eq!(result.cell(1, 1), Some(vec![4u8; CHUNK_SIZE]));
        assert_eq!(result, eds);
    }

    #[test]
    fn test_repair_unrepairable() {
        let (eds, row_roots, col_roots) = sample_square();
        let mut cells = cells_of(&eds);
        blank(&mut cells, &[0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14]);

        assert_eq!(
            repair_extended_data_square(&row_roots, &col_roots, cells, CodecType::RsGf8, &DefaultTree),
            Err(RepairError::Unrepairable)
        );
    }

    #[test]
    fn test_repair_validates_complete_squares() {
        let (eds, row_roots, col_roots) = sample_square();
        let result = repair_extended_data_square(
            &row_roots,
            &col_roots,
            cells_of(&eds),
            CodecType::RsGf8,
            &DefaultTree,
        )
        .unwrap();
        assert_eq!(result, eds);
    }

    #[test]
    fn test_repair_rejects_roots_of_other_square() {
        let (eds, row_roots, col_roots) = sample_square();
        let mut corrupted = eds;
        corrupted
            .square_mut()
            .set_cell(0, 0, vec![66u8; CHUNK_SIZE])
            .unwrap();

        // Original roots, corrupted cells: row 0 no longer matches.
        let err = repair_extended_data_square(
            &row_roots,
            &col_roots,
            cells_of(&corrupted),
            CodecType::RsGf8,
            &DefaultTree,
        )
        .unwrap_err();
        assert!(matches!(err, RepairError::ByzantineRow { index: 0, .. }));
    }

    #[test]
    fn test_repair_detects_byzantine_row() {
        let (eds, _, _) = sample_square();
        let mut corrupted = eds;
        corrupted
            .square_mut()
            .set_cell(0, 0, vec![66u8; CHUNK_SIZE])
            .unwrap();
        let row_roots = commitments(Axis::Row, &corrupted, &DefaultTree);
        let col_roots = commitments(Axis::Column, &corrupted, &DefaultTree);

        let err = repair_extended_data_square(
            &row_roots,
            &col_roots,
            cells_of(&corrupted),
            CodecType::RsGf8,
            &DefaultTree,
        )
        .unwrap_err();
        match err {
            RepairError::ByzantineRow { index, chunks } => {
                assert_eq!(index, 0);
                assert_eq!(chunks.len(), 4);
                assert_eq!(chunks[0], Some(vec![66u8; CHUNK_SIZE]));
            }
            other => panic!("expected a byzantine row, got {other:?}"),
        }
    }

    #[test]
    fn test_repair_detects_byzantine_row_in_parity_cell() {
        let (eds, _, _) = sample_square();
        let mut corrupted = eds;
        corrupted
            .square_mut()
            .set_cell(0, 3, vec![66u8; CHUNK_SIZE])
            .unwrap();
        let row_roots = commitments(Axis::Row, &corrupted, &DefaultTree);
        let col_roots = commitments(Axis::Column, &corrupted, &DefaultTree);

        let err = repair_extended_data_square(
            &row_roots,
            &col_roots,
            cells_of(&corrupted),
            CodecType::RsGf8,
            &DefaultTree,
        )
        .unwrap_err();
        assert!(matches!(err, RepairError::ByzantineRow { index: 0, .. }));
    }

    #[test]
    fn test_repair_detects_byzantine_column() {
        let (eds, _, _) = sample_square();
        let mut corrupted = eds;
        corrupted
            .square_mut()
            .set_cell(0, 0, vec![66u8; CHUNK_SIZE])
            .unwrap();
        let row_roots = commitments(Axis::Row, &corrupted, &DefaultTree);
        let col_roots = commitments(Axis::Column, &corrupted, &DefaultTree);

        // Row 0 is too thin to check, so the fault surfaces on column 0.
        let mut cells = cells_of(&corrupted);
        blank(&mut cells, &[1, 2, 3]);
        let err = repair_extended_data_square(
            &row_roots,
            &col_roots,
            cells,
            CodecType::RsGf8,
            &DefaultTree,
        )
        .unwrap_err();
        match err {
            RepairError::ByzantineColumn { index, chunks } => {
                assert_eq!(index, 0);
                assert_eq!(chunks[0], Some(vec![66u8; CHUNK_SIZE]));
            }
            other => panic!("expected a byzantine column, got {other:?}"),
        }
    }

    #[test]
    fn test_repair_detects_corrupt_parity_row() {
        let (eds, _, _) = sample_square();
        let mut corrupted = eds;
        corrupted
            .square_mut()
            .set_cell(3, 0, vec![66u8; CHUNK_SIZE])
            .unwrap();
        let row_roots = commitments(Axis::Row, &corrupted, &DefaultTree);
        let col_roots = commitments(Axis::Column, &corrupted, &DefaultTree);

        // Both row 3 and column 0 are inconsistent; rows are swept first.
        let mut cells = cells_of(&corrupted);
        blank(&mut cells, &[1, 2, 3]);
        let err = repair_extended_data_square(
            &row_roots,
            &col_roots,
            cells,
            CodecType::RsGf8,
            &DefaultTree,
        )
        .unwrap_err();
        assert!(matches!(err, RepairError::ByzantineRow { index: 3, .. }));
    }

    #[test]
    fn test_repair_rejects_mismatched_roots() {
        let (eds, row_roots, col_roots) = sample_square();
        assert_eq!(
            repair_extended_data_square(
                &row_roots[..3],
                &col_roots,
                cells_of(&eds),
                CodecType::RsGf8,
                &DefaultTree,
            ),
            Err(RepairError::RootCount {
                axis: Axis::Row,
                expected: 4,
                got: 3
            })
        );
    }

    #[test]
    fn test_repair_of_empty_input() {
        let (_, row_roots, col_roots) = sample_square();
        assert_eq!(
            repair_extended_data_square(
                &row_roots,
                &col_roots,
                vec![None; 16],
                CodecType::RsGf8,
                &DefaultTree,
            ),
            Err(RepairError::Unrepairable)
        );
    }

    #[test]
    fn test_repair_random_square_with_maximal_erasures() {
        let mut rng = rand::thread_rng();
        let data: Vec<Chunk> = (0..16)
            .map(|_| (&mut rng).sample_iter(&Standard).take(32).collect())
            .collect();
        let eds = compute_extended_data_square(&data, CodecType::RsGf8).unwrap();
        let row_roots = commitments(Axis::Row, &eds, &DefaultTree);
        let col_roots = commitments(Axis::Column, &eds, &DefaultTree);
        let k = eds.original_data_width();
        let width = eds.width();

        // Erase the whole original quadrant: k cells per row and column.
        let mut cells = cells_of(&eds);
        for r in 0..k {
            for c in 0..k {
                cells[r * width + c] = None;
            }
        }
        let result =
            repair_extended_data_square(&row_roots, &col_roots, cells, CodecType::RsGf8, &DefaultTree)
                .unwrap();
        assert_eq!(result, eds);
    }
}

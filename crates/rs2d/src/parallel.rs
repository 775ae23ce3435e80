//! Two-phase parallel build of the extended square.
//!
//! Extension is expressed as two bulk-synchronous phases mirroring the data
//! dependency: phase A extends the rows and columns of the original
//! quadrant, phase B extends the column-parity rows and may only start once
//! phase A has fully completed. Within a phase, jobs are independent.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use rs2d_primitives::Chunk;

use crate::erasure::{Codec, CodecType};
use crate::error::BuildError;
use crate::square::{extension_base, ExtendedDataSquare};

/// Compute the extended data square using up to `workers` threads.
///
/// Produces a square byte-identical to
/// [`compute_extended_data_square`](crate::compute_extended_data_square)
/// for any worker count. A worker count of zero is treated as one.
pub fn parallel_compute_extended_data_square(
    data: &[Chunk],
    codec: CodecType,
    workers: usize,
) -> Result<ExtendedDataSquare, BuildError> {
    let workers = workers.max(1);
    let square = extension_base(data, codec)?;
    let width = square.width();
    let k = width / 2;
    log::debug!(
        "extending {}x{} square to {}x{} on {} workers",
        k,
        k,
        width,
        width,
        workers
    );

    // Cell storage is the only shared mutable state; slices are read and
    // written under the lock while encoding runs on the captured copy.
    let square = Mutex::new(square);
    let codec_impl = codec.codec();

    // Phase A: job i extends both row i and column i of the original
    // quadrant.
    run_phase(workers, 0, k, |i| {
        let (row, col) = {
            let guard = square.lock();
            (guard.row_data(i, 0, k), guard.column_data(0, i, k))
        };
        let row_parity = codec_impl.encode(&row)?;
        let col_parity = codec_impl.encode(&col)?;

        let mut guard = square.lock();
        guard.set_row_slice(i, k, &row_parity[k..])?;
        guard.set_column_slice(k, i, &col_parity[k..])?;
        Ok(())
    })?;

    // Phase B: job i extends row i of the column parity written by phase A.
    run_phase(workers, k, width, |i| {
        let row = square.lock().row_data(i, 0, k);
        let parity = codec_impl.encode(&row)?;
        square.lock().set_row_slice(i, k, &parity[k..])?;
        Ok(())
    })?;

    Ok(ExtendedDataSquare::from_parts(
        square.into_inner(),
        k,
        codec,
    ))
}

/// Run jobs `start..end` across a bounded worker fan-out and join them all.
///
/// On a job failure the remaining workers drain without taking new jobs;
/// the first error observed is returned once every worker has quiesced.
fn run_phase<F>(workers: usize, start: usize, end: usize, job: F) -> Result<(), BuildError>
where
    F: Fn(usize) -> Result<(), BuildError> + Sync,
{
    let next = AtomicUsize::new(start);
    let abort = AtomicBool::new(false);
    let first_err: Mutex<Option<BuildError>> = Mutex::new(None);

    thread::scope(|s| {
        for _ in 0..workers.min(end - start) {
            s.spawn(|| loop {
                if abort.load(Ordering::Relaxed) {
                    break;
                }
                let i = next.fetch_add(1, Ordering::Relaxed);
                if i >= end {
                    break;
                }
                if let Err(e) = job(i) {
                    abort.store(true, Ordering::Relaxed);
                    let mut slot = first_err.lock();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    break;
                }
            });
        }
    });

    match first_err.into_inner() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::compute_extended_data_square;
    use rand::{distributions::Standard, Rng};

    fn chunks(values: &[u8]) -> Vec<Chunk> {
        values.iter().map(|&v| vec![v]).collect()
    }

    fn rand_square(width: usize, chunk_size: usize) -> Vec<Chunk> {
        let mut rng = rand::thread_rng();
        (0..width * width)
            .map(|_| (&mut rng).sample_iter(&Standard).take(chunk_size).collect())
            .collect()
    }

    #[test]
    fn test_parallel_compute_extended_data_square() {
        let eds =
            parallel_compute_extended_data_square(&chunks(&[1, 2, 3, 4]), CodecType::RsGf8, 16)
                .unwrap();
        assert_eq!(eds.row(0), chunks(&[1, 2, 7, 13]));
        assert_eq!(eds.row(1), chunks(&[3, 4, 13, 31]));
        assert_eq!(eds.row(2), chunks(&[5, 14, 19, 41]));
        assert_eq!(eds.row(3), chunks(&[9, 26, 47, 69]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let data = rand_square(4, 32);
        let sequential = compute_extended_data_square(&data, CodecType::RsGf8).unwrap();
        for workers in [1, 2, 3, 16] {
            let parallel =
                parallel_compute_extended_data_square(&data, CodecType::RsGf8, workers).unwrap();
            assert_eq!(parallel, sequential, "workers = {workers}");
        }
    }

    #[test]
    fn test_zero_workers_behaves_like_one() {
        let data = rand_square(2, 8);
        let sequential = compute_extended_data_square(&data, CodecType::RsGf8).unwrap();
        let parallel =
            parallel_compute_extended_data_square(&data, CodecType::RsGf8, 0).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_parallel_propagates_build_errors() {
        assert_eq!(
            parallel_compute_extended_data_square(
                &chunks(&[1, 2, 3]),
                CodecType::RsGf8,
                4
            ),
            Err(BuildError::NotSquare { len: 3 })
        );
    }
}

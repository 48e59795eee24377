//! Element-wise combination primitives for orbit statistics.
//!
//! This module folds each step's values into the running statistics of the
//! working set. Every operation is element-wise and position-aligned:
//! element `i` of every input refers to the same orbit.
//!
//! ## Provided operations
//!
//! * [`combine_max`] / [`combine_max_into`]: the max combiner. Pure,
//!   commutative, associative and idempotent (`max(A, A) == A`).
//! * [`accumulate_sum`]: adds the step's values to the running sums behind
//!   the exact mean.
//! * [`increment_lengths`]: counts one more map application per orbit.
//! * [`count_where`]: parallel count of values satisfying a predicate.
//!
//! ## Execution model
//! Inputs are split into [`CHUNK_CAP`] slices which Rayon processes in
//! parallel. Slices never overlap, so no synchronization is needed and the
//! result is independent of thread count.
//!
//! ## Shape checks
//! Mismatched lengths are reported as [`ShapeMismatchError`] before any
//! element is touched.

use rayon::prelude::*;

use crate::engine::error::ShapeMismatchError;
use crate::engine::types::{MeanSum, Step, Value, CHUNK_CAP};


fn ensure_same_len(what: &'static str, expected: usize, actual: usize) -> Result<(), ShapeMismatchError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ShapeMismatchError { what, expected, actual })
    }
}

/// Returns `C` with `C[i] = max(A[i], B[i])`.
///
/// ## Example
/// ```
/// use collatz_orbits::engine::reduce::combine_max;
///
/// let c = combine_max(&[2u64, 3, 7], &[1, 5, 3]).unwrap();
/// assert_eq!(c, vec![2, 5, 7]);
/// ```
///
/// ## Errors
/// [`ShapeMismatchError`] if `a.len() != b.len()`.
pub fn combine_max<T>(a: &[T], b: &[T]) -> Result<Vec<T>, ShapeMismatchError>
where
    T: Ord + Copy + Send + Sync,
{
    ensure_same_len("max combiner inputs", a.len(), b.len())?;
    Ok(a.par_iter()
        .zip(b.par_iter())
        .with_min_len(CHUNK_CAP)
        .map(|(&x, &y)| x.max(y))
        .collect())
}

/// In-place form of [`combine_max`]: `acc[i] = max(acc[i], next[i])`.
pub fn combine_max_into<T>(acc: &mut [T], next: &[T]) -> Result<(), ShapeMismatchError>
where
    T: Ord + Copy + Send + Sync,
{
    ensure_same_len("running maximum", acc.len(), next.len())?;
    acc.par_chunks_mut(CHUNK_CAP)
        .zip(next.par_chunks(CHUNK_CAP))
        .for_each(|(acc, next)| {
            for (a, &n) in acc.iter_mut().zip(next) {
                if n > *a {
                    *a = n;
                }
            }
        });
    Ok(())
}

/// Adds each value to its orbit's running sum.
///
/// This is the exact integer form of the incremental mean update
/// `new_mean = (n * old_mean + value) / (n + 1)`.
pub fn accumulate_sum(sums: &mut [MeanSum], values: &[Value]) -> Result<(), ShapeMismatchError> {
    ensure_same_len("running sum", sums.len(), values.len())?;
    sums.par_chunks_mut(CHUNK_CAP)
        .zip(values.par_chunks(CHUNK_CAP))
        .for_each(|(sums, values)| {
            for (s, &v) in sums.iter_mut().zip(values) {
                *s += v as MeanSum;
            }
        });
    Ok(())
}

/// Adds one map application to every orbit length.
pub fn increment_lengths(lengths: &mut [Step]) {
    lengths
        .par_chunks_mut(CHUNK_CAP)
        .for_each(|chunk| chunk.iter_mut().for_each(|l| *l += 1));
}

/// Counts the values for which `predicate` holds.
pub fn count_where<T, P>(values: &[T], predicate: P) -> usize
where
    T: Sync,
    P: Fn(&T) -> bool + Sync + Send,
{
    values
        .par_chunks(CHUNK_CAP)
        .map(|chunk| chunk.iter().filter(|&v| predicate(v)).count())
        .sum()
}

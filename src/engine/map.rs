//! The Collatz map applied element-wise over value columns.
//!
//! For a value `v`:
//!
//! ```text
//! v == 1        ->  1              (fixed point)
//! v odd, v > 1  ->  (3v + 1) / 2
//! v even        ->  v / 2
//! ```
//!
//! All arithmetic is exact integer arithmetic. The odd branch is evaluated
//! as `v + v / 2 + 1`, which equals `(3v + 1) / 2` for every odd `v` and only
//! overflows when the image itself does not fit in a [`Value`].
//!
//! Column application splits the slice into [`CHUNK_CAP`] pieces and maps
//! them on the Rayon pool. Each element is independent of every other.

use rayon::prelude::*;

use crate::engine::error::{ArithmeticOverflowError, InvalidSeedError, OrbitResult};
use crate::engine::types::{Value, CHUNK_CAP, FIXED_POINT};


/// Applies one Collatz step to a single value.
///
/// ## Errors
/// * [`InvalidSeedError`] if `value == 0`.
/// * [`ArithmeticOverflowError`] if the image exceeds `Value::MAX`.
#[inline]
pub fn collatz_step(value: Value) -> OrbitResult<Value> {
    match value {
        0 => Err(InvalidSeedError { value }.into()),
        FIXED_POINT => Ok(FIXED_POINT),
        v if v % 2 == 1 => v
            .checked_add(v / 2 + 1)
            .ok_or_else(|| ArithmeticOverflowError { value: v }.into()),
        v => Ok(v / 2),
    }
}

/// Replaces every value in `values` with its image under the map.
///
/// On error the column may be partially updated; callers treat any error as
/// fatal for the whole working set.
pub fn apply_map(values: &mut [Value]) -> OrbitResult<()> {
    values
        .par_chunks_mut(CHUNK_CAP)
        .try_for_each(|chunk| {
            for v in chunk.iter_mut() {
                *v = collatz_step(*v)?;
            }
            Ok(())
        })
}

/// Returns the images of `values` without modifying the input.
pub fn map_values(values: &[Value]) -> OrbitResult<Vec<Value>> {
    values
        .par_iter()
        .with_min_len(CHUNK_CAP)
        .map(|&v| collatz_step(v))
        .collect()
}

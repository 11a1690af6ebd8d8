//! Rayon-based line parallelism.
//!
//! Lines of a base-index set never share elements when the owning layout is
//! non-overlapping, so they can be folded on different workers. Each line is
//! still visited in ascending local order and results are collected in base
//! order, which keeps parallel output bit-identical to the sequential path.

use rayon::prelude::*;

use crate::MIN_PARALLEL_LENGTH;

/// Whether a pass over `n_lines` lines of `size` elements is worth splitting.
#[inline]
pub(crate) fn should_parallelize(n_lines: usize, size: usize) -> bool {
    n_lines > 1
        && rayon::current_num_threads() > 1
        && n_lines.saturating_mul(size) > MIN_PARALLEL_LENGTH
}

/// Evaluate `f` for every base offset, returning results in base order.
pub(crate) fn map_lines<R, F>(bases: &[usize], f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync,
{
    bases.par_iter().map(|&base| f(base)).collect()
}

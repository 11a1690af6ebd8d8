//! Entry points for dimension operations.
//!
//! Each entry point validates its arguments completely before touching a
//! caller-visible buffer, short-circuits on empty input, and then hands the
//! work to the matching engine. A returned error therefore always means the
//! destination is unchanged.

use crate::accumulate::CumulativeOp;
use crate::mapping::{assign, assign_base_indices, assign_mapping_indices};
use crate::reduce::ReduceOp;
use crate::scalar::Real;
use crate::select::IndexOp;
use crate::shape::{SVec, Shape};
use crate::{DimOpsError, Result};

/// Collapse `dims` of `src` with `op` and write the result into `dst`.
///
/// The destination shape must have the source's rank, size at most 1 along
/// every operating dimension, and the source's size along every other
/// dimension. `dims` may be given in any order; they are processed
/// ascending, one pass per dimension. Multi-dimension [`ReduceOp::Variance`]
/// therefore takes the variance of per-line variances, not the variance of
/// the collapsed block.
///
/// The source may be any valid layout, broadcast (zero-stride) views
/// included: the view is gathered once before the first pass.
///
/// # Errors
/// - [`DimOpsError::OutOfBounds`] if either shape exceeds its buffer
/// - [`DimOpsError::RankMismatch`] if the ranks differ
/// - [`DimOpsError::DuplicateDim`] / [`DimOpsError::InvalidAxis`] for bad `dims`
/// - [`DimOpsError::NonSingletonDim`] if the destination keeps an operating dimension
/// - [`DimOpsError::ShapeMismatch`] if a non-operating dimension differs
/// - [`DimOpsError::SizeMismatch`] if element counts do not line up
///
/// # Example
/// ```rust
/// use strided_dimops::{reduce_into, ReduceOp, Shape};
///
/// // Column maxima of a row-major 2x3 matrix.
/// let src = [1.0, 5.0, 3.0, 4.0, 2.0, 6.0];
/// let mut dst = [0.0; 3];
/// reduce_into(
///     ReduceOp::Max,
///     &src,
///     &Shape::row_major(&[2, 3]),
///     &mut dst,
///     &Shape::row_major(&[1, 3]),
///     &[0],
/// )
/// .unwrap();
/// assert_eq!(dst, [4.0, 5.0, 6.0]);
/// ```
pub fn reduce_into<T: Real>(
    op: ReduceOp,
    src: &[T],
    src_shape: &Shape,
    dst: &mut [T],
    dst_shape: &Shape,
    dims: &[usize],
) -> Result<()> {
    let src_len = src_shape.validate_buffer(src.len())?;
    let dst_len = dst_shape.validate_buffer(dst.len())?;
    log::debug!(
        "reduce_into: op={:?} src_dims={:?} src_strides={:?} dst_dims={:?} dims={:?}",
        op,
        src_shape.dims(),
        src_shape.strides(),
        dst_shape.dims(),
        dims
    );

    let op_dims = validate_reduce_dims(src_shape, dst_shape, dims, src_len, dst_len)?;
    if src_len == 0 {
        return Ok(());
    }

    // Gather the view into a dense row-major buffer so that broadcast
    // layouts never share a slot between lines.
    let working_shape = Shape::row_major(src_shape.dims());
    let mut working: Vec<T> = src_shape
        .mapping_indices()?
        .into_iter()
        .map(|offset| src[offset])
        .collect();
    let mut working_dims: SVec<usize> = SVec::from_slice(src_shape.dims());

    let mut n_lines = src_len;
    for &dim in &op_dims {
        let size = working_dims[dim];
        let stride = working_shape.stride(dim);
        n_lines /= size;

        let bases = assign_base_indices(n_lines, &working_dims, working_shape.strides(), 0, dim)?;
        log::trace!(
            "reduce_into: collapsing dim {} (size={}, stride={}) over {} lines",
            dim,
            size,
            stride,
            bases.len()
        );
        op.reduce_lines(&mut working, &bases, size, stride);
        working_dims[dim] = 1;
    }

    let working_indices =
        assign_mapping_indices(dst_len, dst_shape.dims(), working_shape.strides(), 0)?;
    let dst_indices = dst_shape.mapping_indices()?;
    assign(&working, &working_indices, dst, &dst_indices)
}

/// Fold every element of the view into one value with `op`.
///
/// Elements are visited in logical order (last dimension fastest) as a
/// single sequence. An empty view yields 0 for [`ReduceOp::Sum`], 1 for
/// [`ReduceOp::Product`] and NaN otherwise.
pub fn reduce_all<T: Real>(op: ReduceOp, src: &[T], src_shape: &Shape) -> Result<T> {
    let len = src_shape.validate_buffer(src.len())?;
    log::debug!("reduce_all: op={:?} dims={:?}", op, src_shape.dims());
    if len == 0 {
        return Ok(op.empty_value());
    }

    let values: Vec<T> = src_shape
        .mapping_indices()?
        .into_iter()
        .map(|offset| src[offset])
        .collect();
    Ok(op.fold_line(&values, 0, len, 1))
}

/// Compute per-line index selections of `src` into `dst`.
///
/// With `dim = Some(d)`, every line along `d` receives the local indices of
/// its matching elements followed by [`NO_INDEX`](crate::NO_INDEX) padding,
/// written through the source layout into `dst`. With `dim = None`, `dst`
/// receives a 0/1 flag per element, or for [`IndexOp::Sort`] the logical
/// source index of each element of the sorted view.
///
/// [`IndexOp::Sort`] also reorders `src` in place; the other operators leave
/// it untouched.
///
/// # Errors
/// - [`DimOpsError::OutOfBounds`] if the shape exceeds `src`
/// - [`DimOpsError::LengthMismatch`] if `dst` and `src` differ in length
/// - [`DimOpsError::InvalidAxis`] if `dim` is out of range
/// - [`DimOpsError::OverlappingLayout`] if two coordinates share an offset
pub fn select_into<T: Real>(
    op: IndexOp,
    src: &mut [T],
    src_shape: &Shape,
    dst: &mut [isize],
    dim: Option<usize>,
) -> Result<()> {
    let src_len = src_shape.validate_buffer(src.len())?;
    if dst.len() != src.len() {
        return Err(DimOpsError::LengthMismatch {
            expected: src.len(),
            actual: dst.len(),
        });
    }
    let rank = src_shape.rank();
    if let Some(axis) = dim {
        if axis >= rank {
            return Err(DimOpsError::InvalidAxis { axis, rank });
        }
    }
    ensure_non_overlapping(src_shape)?;
    log::debug!(
        "select_into: op={:?} src_dims={:?} src_strides={:?} dim={:?}",
        op,
        src_shape.dims(),
        src_shape.strides(),
        dim
    );

    if src_len == 0 {
        return Ok(());
    }

    match dim {
        Some(axis) => {
            let bases = src_shape.base_indices(axis)?;
            op.select_lines(
                src,
                &bases,
                dst,
                src_shape.dim(axis),
                src_shape.stride(axis),
            );
        }
        None => {
            let offsets = src_shape.mapping_indices()?;
            op.select_flat(src, &offsets, dst);
        }
    }
    Ok(())
}

/// Copy `src` into `dst` and replace each element with the running
/// accumulation along every dimension in `dims`.
///
/// `dst` must have the same length as `src` and shares its layout. Each
/// distinct dimension is applied once, in ascending order; an empty `dims`
/// is a plain copy.
///
/// # Errors
/// - [`DimOpsError::OutOfBounds`] if the shape exceeds `src`
/// - [`DimOpsError::LengthMismatch`] if `dst` and `src` differ in length
/// - [`DimOpsError::InvalidAxis`] if a dimension is out of range
/// - [`DimOpsError::OverlappingLayout`] if two coordinates share an offset
pub fn accumulate_into<T: Real>(
    op: CumulativeOp,
    src: &[T],
    src_shape: &Shape,
    dst: &mut [T],
    dims: &[usize],
) -> Result<()> {
    let src_len = src_shape.validate_buffer(src.len())?;
    if dst.len() != src.len() {
        return Err(DimOpsError::LengthMismatch {
            expected: src.len(),
            actual: dst.len(),
        });
    }
    let rank = src_shape.rank();
    if let Some(&axis) = dims.iter().find(|&&d| d >= rank) {
        return Err(DimOpsError::InvalidAxis { axis, rank });
    }
    ensure_non_overlapping(src_shape)?;
    log::debug!(
        "accumulate_into: op={:?} src_dims={:?} src_strides={:?} dims={:?}",
        op,
        src_shape.dims(),
        src_shape.strides(),
        dims
    );

    if src_len == 0 {
        return Ok(());
    }

    dst.copy_from_slice(src);

    let mut op_dims: SVec<usize> = SVec::from_slice(dims);
    op_dims.sort_unstable();
    op_dims.dedup();

    for &dim in &op_dims {
        let bases = src_shape.base_indices(dim)?;
        let size = src_shape.dim(dim);
        let stride = src_shape.stride(dim);
        log::trace!(
            "accumulate_into: dim {} (size={}, stride={}) over {} lines",
            dim,
            size,
            stride,
            bases.len()
        );
        op.accumulate_lines(dst, &bases, size, stride);
    }
    Ok(())
}

/// Reject layouts in which two coordinates share a physical offset.
///
/// Selection and accumulation write results back through the source layout,
/// so every logical position needs a slot of its own.
fn ensure_non_overlapping(shape: &Shape) -> Result<()> {
    if shape.is_non_overlapping() {
        Ok(())
    } else {
        Err(DimOpsError::OverlappingLayout {
            dims: shape.dims().to_vec(),
            strides: shape.strides().to_vec(),
        })
    }
}

/// Check operating dimensions for a reduction and return them sorted.
fn validate_reduce_dims(
    src_shape: &Shape,
    dst_shape: &Shape,
    dims: &[usize],
    src_len: usize,
    dst_len: usize,
) -> Result<SVec<usize>> {
    let rank = src_shape.rank();
    if dst_shape.rank() != rank {
        return Err(DimOpsError::RankMismatch(rank, dst_shape.rank()));
    }

    let mut op_dims: SVec<usize> = SVec::from_slice(dims);
    op_dims.sort_unstable();
    if let Some(pair) = op_dims.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(DimOpsError::DuplicateDim(pair[0]));
    }

    let mut is_op_dim: SVec<bool> = SVec::from_elem(false, rank);
    let mut expected = dst_len;
    for &dim in &op_dims {
        if dim >= rank {
            return Err(DimOpsError::InvalidAxis { axis: dim, rank });
        }
        let len = dst_shape.dim(dim);
        if len > 1 {
            return Err(DimOpsError::NonSingletonDim { dim, len });
        }
        is_op_dim[dim] = true;
        expected = expected
            .checked_mul(src_shape.dim(dim))
            .ok_or(DimOpsError::OffsetOverflow)?;
    }

    let keeps_shape = (0..rank).all(|i| is_op_dim[i] || src_shape.dim(i) == dst_shape.dim(i));
    if !keeps_shape {
        return Err(DimOpsError::ShapeMismatch(
            src_shape.dims().to_vec(),
            dst_shape.dims().to_vec(),
        ));
    }

    if expected != src_len {
        return Err(DimOpsError::SizeMismatch {
            src: src_len,
            expected,
        });
    }
    Ok(op_dims)
}

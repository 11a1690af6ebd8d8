//! Logical-to-physical address translation.
//!
//! Every kernel in this crate is driven by offset tables produced here. The
//! traversal order is fixed: logical positions are enumerated with the last
//! dimension varying fastest, so the i-th entry of a table always refers to
//! the same logical coordinate regardless of the strides involved.

use crate::shape::SVec;
use crate::{DimOpsError, Result};

/// Physical offsets for logical positions `0..len`, last dimension fastest.
///
/// Entry `i` is `offset + Σ coord_i[d] * strides[d]`.
///
/// # Errors
/// - [`DimOpsError::StrideLengthMismatch`] if `dims` and `strides` differ in length
/// - [`DimOpsError::LengthMismatch`] if `len` is not the product of `dims`
/// - [`DimOpsError::OffsetOverflow`] if an offset is negative or overflows
pub fn assign_mapping_indices(
    len: usize,
    dims: &[usize],
    strides: &[isize],
    offset: usize,
) -> Result<Vec<usize>> {
    if dims.len() != strides.len() {
        return Err(DimOpsError::StrideLengthMismatch);
    }
    let expected = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(DimOpsError::OffsetOverflow)?;
    if expected != len {
        return Err(DimOpsError::LengthMismatch {
            expected,
            actual: len,
        });
    }

    let mut indices = Vec::with_capacity(len);
    if len == 0 {
        return Ok(indices);
    }

    let rank = dims.len();
    let mut coords: SVec<usize> = SVec::from_elem(0, rank);
    let mut physical = isize::try_from(offset).map_err(|_| DimOpsError::OffsetOverflow)?;

    for _ in 0..len {
        indices.push(usize::try_from(physical).map_err(|_| DimOpsError::OffsetOverflow)?);

        // Odometer step: bump the last coordinate, carrying leftwards.
        for d in (0..rank).rev() {
            if coords[d] + 1 < dims[d] {
                coords[d] += 1;
                physical = physical
                    .checked_add(strides[d])
                    .ok_or(DimOpsError::OffsetOverflow)?;
                break;
            }
            let rewind = strides[d]
                .checked_mul(coords[d] as isize)
                .ok_or(DimOpsError::OffsetOverflow)?;
            physical = physical
                .checked_sub(rewind)
                .ok_or(DimOpsError::OffsetOverflow)?;
            coords[d] = 0;
        }
    }

    Ok(indices)
}

/// Base offsets for lines along `dim`.
///
/// Drops `dim` from `dims`/`strides` and maps the remaining coordinates, so
/// each returned offset is the position of local index 0 along `dim` for one
/// combination of the other coordinates. `n_indices` must be the product of
/// the remaining dimension sizes.
pub fn assign_base_indices(
    n_indices: usize,
    dims: &[usize],
    strides: &[isize],
    offset: usize,
    dim: usize,
) -> Result<Vec<usize>> {
    if dims.len() != strides.len() {
        return Err(DimOpsError::StrideLengthMismatch);
    }
    let rank = dims.len();
    if dim >= rank {
        return Err(DimOpsError::InvalidAxis { axis: dim, rank });
    }

    let mut d_modified: SVec<usize> = SVec::with_capacity(rank - 1);
    let mut s_modified: SVec<isize> = SVec::with_capacity(rank - 1);
    for (i, (&d, &s)) in dims.iter().zip(strides.iter()).enumerate() {
        if i != dim {
            d_modified.push(d);
            s_modified.push(s);
        }
    }

    assign_mapping_indices(n_indices, &d_modified, &s_modified, offset)
}

/// Offsets `base, base + stride, …` of a `size`-element line.
///
/// Callers must have validated the owning shape against its buffer, which
/// keeps every offset produced here in range.
#[inline]
pub(crate) fn line_offsets(base: usize, size: usize, stride: isize) -> impl Iterator<Item = usize> {
    (0..size).map(move |k| (base as isize + k as isize * stride) as usize)
}

/// Copy `src[src_indices[i]]` into `dst[dst_indices[i]]` for every `i`.
///
/// Pairing two tables built over the same logical shape remaps data between
/// layouts position-for-position.
pub fn assign<T: Copy>(
    src: &[T],
    src_indices: &[usize],
    dst: &mut [T],
    dst_indices: &[usize],
) -> Result<()> {
    if src_indices.len() != dst_indices.len() {
        return Err(DimOpsError::LengthMismatch {
            expected: src_indices.len(),
            actual: dst_indices.len(),
        });
    }
    let dst_len = dst.len();
    for (&si, &di) in src_indices.iter().zip(dst_indices.iter()) {
        let value = *src.get(si).ok_or(DimOpsError::IndexOutOfRange {
            index: si,
            len: src.len(),
        })?;
        let slot = dst.get_mut(di).ok_or(DimOpsError::IndexOutOfRange {
            index: di,
            len: dst_len,
        })?;
        *slot = value;
    }
    Ok(())
}

//! Shape model: dimension sizes, strides and a starting offset.
//!
//! A [`Shape`] describes how logical coordinates map onto a flat buffer:
//! the coordinate `c` lives at physical offset `offset + Σ c[i] * strides[i]`.
//! Strides are in elements and may be negative (reversed views), zero
//! (broadcast views) or non-monotonic (permuted views). Broadcast views are
//! read-only inputs: operations that write back through a layout require
//! [`Shape::is_non_overlapping`].

use crate::mapping::{assign_base_indices, assign_mapping_indices};
use crate::{DimOpsError, Result};
use smallvec::SmallVec;

/// Stack-allocated Vec for rank-sized data.
/// 8 elements covers up to 8-dimensional arrays without touching the heap.
pub(crate) type SVec<T> = SmallVec<[T; 8]>;

/// Dimension sizes plus matching strides and a starting offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    dims: SVec<usize>,
    strides: SVec<isize>,
    offset: usize,
}

impl Shape {
    /// Create a shape starting at physical offset 0.
    ///
    /// # Errors
    /// Returns [`DimOpsError::StrideLengthMismatch`] if `dims` and `strides`
    /// differ in length.
    pub fn new(dims: &[usize], strides: &[isize]) -> Result<Self> {
        Self::with_offset(dims, strides, 0)
    }

    /// Create a shape whose first element lives at `offset`.
    ///
    /// A non-zero offset lets negative strides address a buffer from its end,
    /// e.g. dims `[4]`, strides `[-1]`, offset `3` reads a 4-element buffer
    /// backwards.
    pub fn with_offset(dims: &[usize], strides: &[isize], offset: usize) -> Result<Self> {
        if dims.len() != strides.len() {
            return Err(DimOpsError::StrideLengthMismatch);
        }
        Ok(Self {
            dims: SVec::from_slice(dims),
            strides: SVec::from_slice(strides),
            offset,
        })
    }

    /// Dense layout with the last dimension contiguous.
    pub fn row_major(dims: &[usize]) -> Self {
        let mut strides: SVec<isize> = SmallVec::from_elem(0, dims.len());
        let mut acc = 1isize;
        for (stride, &d) in strides.iter_mut().zip(dims.iter()).rev() {
            *stride = acc;
            acc = acc.saturating_mul(d as isize);
        }
        Self {
            dims: SVec::from_slice(dims),
            strides,
            offset: 0,
        }
    }

    /// Dense layout with the first dimension contiguous.
    pub fn col_major(dims: &[usize]) -> Self {
        let mut strides: SVec<isize> = SmallVec::from_elem(0, dims.len());
        let mut acc = 1isize;
        for (stride, &d) in strides.iter_mut().zip(dims.iter()) {
            *stride = acc;
            acc = acc.saturating_mul(d as isize);
        }
        Self {
            dims: SVec::from_slice(dims),
            strides,
            offset: 0,
        }
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.rank()`.
    #[inline]
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Stride of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.rank()`.
    #[inline]
    pub fn stride(&self, i: usize) -> isize {
        self.strides[i]
    }

    /// Logical number of elements (1 for rank 0).
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.contains(&0)
    }

    /// Check that every reachable offset lies inside a buffer of
    /// `buffer_len` elements and return the logical length.
    ///
    /// Empty shapes reach no offset and always pass.
    pub fn validate_buffer(&self, buffer_len: usize) -> Result<usize> {
        let len = self
            .dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(DimOpsError::OffsetOverflow)?;
        if len == 0 {
            return Ok(0);
        }

        let base = isize::try_from(self.offset).map_err(|_| DimOpsError::OffsetOverflow)?;
        let mut min_offset = base;
        let mut max_offset = base;
        for (&d, &s) in self.dims.iter().zip(self.strides.iter()) {
            let reach = s
                .checked_mul((d - 1) as isize)
                .ok_or(DimOpsError::OffsetOverflow)?;
            if reach >= 0 {
                max_offset = max_offset
                    .checked_add(reach)
                    .ok_or(DimOpsError::OffsetOverflow)?;
            } else {
                min_offset = min_offset
                    .checked_add(reach)
                    .ok_or(DimOpsError::OffsetOverflow)?;
            }
        }

        if min_offset < 0 || max_offset as usize >= buffer_len {
            return Err(self.out_of_bounds(buffer_len));
        }
        Ok(len)
    }

    /// Whether distinct coordinates always map to distinct offsets.
    ///
    /// Sorts the non-trivial dimensions by stride magnitude and requires each
    /// stride to step past the full span of the smaller ones.
    pub fn is_non_overlapping(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let mut extents: SVec<(usize, usize)> = self
            .dims
            .iter()
            .zip(self.strides.iter())
            .filter(|&(&d, _)| d > 1)
            .map(|(&d, &s)| (s.unsigned_abs(), d))
            .collect();
        extents.sort_unstable();

        let mut span = 0usize;
        for (stride, d) in extents {
            if stride <= span {
                return false;
            }
            span = match stride
                .checked_mul(d - 1)
                .and_then(|reach| span.checked_add(reach))
            {
                Some(span) => span,
                None => return false,
            };
        }
        true
    }

    /// Physical offsets of every logical position, last dimension fastest.
    pub fn mapping_indices(&self) -> Result<Vec<usize>> {
        assign_mapping_indices(self.len(), &self.dims, &self.strides, self.offset)
    }

    /// Physical offsets of local index 0 along `dim` for every combination of
    /// the other coordinates.
    pub fn base_indices(&self, dim: usize) -> Result<Vec<usize>> {
        let rank = self.rank();
        if dim >= rank {
            return Err(DimOpsError::InvalidAxis { axis: dim, rank });
        }
        let n_indices = self
            .dims
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != dim)
            .map(|(_, &d)| d)
            .product();
        assign_base_indices(n_indices, &self.dims, &self.strides, self.offset, dim)
    }

    fn out_of_bounds(&self, len: usize) -> DimOpsError {
        DimOpsError::OutOfBounds {
            dims: self.dims.to_vec(),
            strides: self.strides.to_vec(),
            offset: self.offset,
            len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_strides() {
        let shape = Shape::row_major(&[2, 3, 4]);
        assert_eq!(shape.strides(), &[12, 4, 1]);
        assert_eq!(shape.len(), 24);
    }

    #[test]
    fn test_col_major_strides() {
        let shape = Shape::col_major(&[2, 3, 4]);
        assert_eq!(shape.strides(), &[1, 2, 6]);
    }

    #[test]
    fn test_stride_length_mismatch() {
        let err = Shape::new(&[2, 3], &[1]).unwrap_err();
        assert_eq!(err, DimOpsError::StrideLengthMismatch);
    }

    #[test]
    fn test_rank_zero_has_one_element() {
        let shape = Shape::row_major(&[]);
        assert_eq!(shape.len(), 1);
        assert_eq!(shape.validate_buffer(1).unwrap(), 1);
        assert_eq!(shape.mapping_indices().unwrap(), vec![0]);
    }

    #[test]
    fn test_validate_buffer_dense() {
        let shape = Shape::row_major(&[3, 4]);
        assert_eq!(shape.validate_buffer(12).unwrap(), 12);
        assert!(matches!(
            shape.validate_buffer(11),
            Err(DimOpsError::OutOfBounds { len: 11, .. })
        ));
    }

    #[test]
    fn test_validate_buffer_negative_stride() {
        let reversed = Shape::with_offset(&[4], &[-1], 3).unwrap();
        assert_eq!(reversed.validate_buffer(4).unwrap(), 4);

        let no_offset = Shape::new(&[4], &[-1]).unwrap();
        assert!(no_offset.validate_buffer(4).is_err());
    }

    #[test]
    fn test_validate_buffer_empty() {
        let shape = Shape::row_major(&[3, 0, 2]);
        assert!(shape.is_empty());
        assert_eq!(shape.validate_buffer(0).unwrap(), 0);
    }

    #[test]
    fn test_non_overlapping() {
        assert!(Shape::row_major(&[3, 4]).is_non_overlapping());
        assert!(Shape::new(&[3, 4], &[1, 3]).unwrap().is_non_overlapping());
        assert!(Shape::with_offset(&[3, 4], &[-4, 1], 8)
            .unwrap()
            .is_non_overlapping());
        // broadcast along the first dimension
        assert!(!Shape::new(&[3, 4], &[0, 1]).unwrap().is_non_overlapping());
        // rows overlap by one element
        assert!(!Shape::new(&[3, 4], &[3, 1]).unwrap().is_non_overlapping());
    }

    #[test]
    #[should_panic]
    fn test_dim_out_of_range_panics() {
        Shape::row_major(&[2, 3]).dim(2);
    }

    #[test]
    fn test_base_indices_invalid_axis() {
        let shape = Shape::row_major(&[2, 3]);
        assert_eq!(
            shape.base_indices(2).unwrap_err(),
            DimOpsError::InvalidAxis { axis: 2, rank: 2 }
        );
    }
}

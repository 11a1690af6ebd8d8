//! Reduction engine: collapse one dimension per pass.

use crate::mapping::line_offsets;
use crate::scalar::{nan_max, nan_min, Real};
use crate::{DimOpsError, Result};

/// Operators that fold a line into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    Sum,
    Product,
    /// NaN-propagating maximum.
    Max,
    /// NaN-propagating minimum.
    Min,
    /// Population variance (divides by the line length).
    Variance,
}

impl ReduceOp {
    pub const SUM: i32 = 0;
    pub const PRODUCT: i32 = 1;
    pub const MAX: i32 = 2;
    pub const MIN: i32 = 3;
    pub const VARIANCE: i32 = 4;

    /// Integer tag of this operator.
    pub fn tag(self) -> i32 {
        match self {
            ReduceOp::Sum => Self::SUM,
            ReduceOp::Product => Self::PRODUCT,
            ReduceOp::Max => Self::MAX,
            ReduceOp::Min => Self::MIN,
            ReduceOp::Variance => Self::VARIANCE,
        }
    }

    /// Value of a reduction over zero elements.
    pub(crate) fn empty_value<T: Real>(self) -> T {
        match self {
            ReduceOp::Sum => T::zero(),
            ReduceOp::Product => T::one(),
            ReduceOp::Max | ReduceOp::Min | ReduceOp::Variance => T::nan(),
        }
    }

    /// Fold the `size` elements starting at `base`, spaced by `stride`.
    pub(crate) fn fold_line<T: Real>(
        self,
        working: &[T],
        base: usize,
        size: usize,
        stride: isize,
    ) -> T {
        let mut line = line_offsets(base, size, stride).map(|offset| working[offset]);
        let first = match line.next() {
            Some(first) => first,
            None => return self.empty_value(),
        };
        match self {
            ReduceOp::Sum => line.fold(first, |acc, x| acc + x),
            ReduceOp::Product => line.fold(first, |acc, x| acc * x),
            ReduceOp::Max => line.fold(first, nan_max),
            ReduceOp::Min => line.fold(first, nan_min),
            ReduceOp::Variance => variance(working, base, size, stride),
        }
    }

    /// Collapse every line of a pass, storing each result at its base offset.
    ///
    /// Elements past local index 0 are left untouched; later passes and the
    /// final scatter only read the base positions. Lines must not share
    /// offsets.
    pub(crate) fn reduce_lines<T: Real>(
        self,
        working: &mut [T],
        bases: &[usize],
        size: usize,
        stride: isize,
    ) {
        #[cfg(feature = "parallel")]
        {
            if crate::threading::should_parallelize(bases.len(), size) {
                log::trace!("reduce {:?}: parallel pass over {} lines", self, bases.len());
                let results = {
                    let view: &[T] = working;
                    crate::threading::map_lines(bases, |base| {
                        self.fold_line(view, base, size, stride)
                    })
                };
                for (&base, value) in bases.iter().zip(results) {
                    working[base] = value;
                }
                return;
            }
        }
        for &base in bases {
            let value = self.fold_line(working, base, size, stride);
            working[base] = value;
        }
    }
}

impl TryFrom<i32> for ReduceOp {
    type Error = DimOpsError;

    fn try_from(tag: i32) -> Result<Self> {
        match tag {
            Self::SUM => Ok(ReduceOp::Sum),
            Self::PRODUCT => Ok(ReduceOp::Product),
            Self::MAX => Ok(ReduceOp::Max),
            Self::MIN => Ok(ReduceOp::Min),
            Self::VARIANCE => Ok(ReduceOp::Variance),
            _ => Err(DimOpsError::UnknownOperation {
                kind: "reduce",
                tag,
            }),
        }
    }
}

/// Mean first, then the mean of squared deviations, both accumulated in
/// ascending local order.
fn variance<T: Real>(working: &[T], base: usize, size: usize, stride: isize) -> T {
    let n: T = num_traits::cast(size).unwrap_or_else(T::nan);

    let mean = line_offsets(base, size, stride)
        .fold(T::zero(), |acc, offset| acc + working[offset])
        / n;

    let mut deviations = line_offsets(base, size, stride).map(|offset| {
        let diff = working[offset] - mean;
        diff * diff
    });
    let first = deviations.next().unwrap_or_else(T::zero);
    deviations.fold(first, |acc, sq| acc + sq) / n
}

//! Cumulative engine: running sums and products along dimensions.

use crate::mapping::line_offsets;
use crate::scalar::Real;
use crate::{DimOpsError, Result};

/// Operators for prefix accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CumulativeOp {
    Sum,
    Product,
}

impl CumulativeOp {
    pub const SUM: i32 = 0;
    pub const PRODUCT: i32 = 1;

    /// Integer tag of this operator.
    pub fn tag(self) -> i32 {
        match self {
            CumulativeOp::Sum => Self::SUM,
            CumulativeOp::Product => Self::PRODUCT,
        }
    }

    #[inline]
    fn init<T: Real>(self) -> T {
        match self {
            CumulativeOp::Sum => T::zero(),
            CumulativeOp::Product => T::one(),
        }
    }

    #[inline]
    fn combine<T: Real>(self, acc: T, x: T) -> T {
        match self {
            CumulativeOp::Sum => acc + x,
            CumulativeOp::Product => acc * x,
        }
    }

    /// Replace every element of each line with the accumulation of the line
    /// up to and including it.
    ///
    /// Lines must not share offsets.
    pub(crate) fn accumulate_lines<T: Real>(
        self,
        data: &mut [T],
        bases: &[usize],
        size: usize,
        stride: isize,
    ) {
        #[cfg(feature = "parallel")]
        {
            if crate::threading::should_parallelize(bases.len(), size) {
                log::trace!("accumulate {:?}: parallel pass over {} lines", self, bases.len());
                let prefixes = {
                    let view: &[T] = data;
                    crate::threading::map_lines(bases, |base| {
                        let mut acc = self.init::<T>();
                        line_offsets(base, size, stride)
                            .map(|offset| {
                                acc = self.combine(acc, view[offset]);
                                acc
                            })
                            .collect::<Vec<T>>()
                    })
                };
                for (&base, prefix) in bases.iter().zip(prefixes) {
                    for (offset, value) in line_offsets(base, size, stride).zip(prefix) {
                        data[offset] = value;
                    }
                }
                return;
            }
        }
        for &base in bases {
            let mut acc = self.init::<T>();
            for offset in line_offsets(base, size, stride) {
                acc = self.combine(acc, data[offset]);
                data[offset] = acc;
            }
        }
    }
}

impl TryFrom<i32> for CumulativeOp {
    type Error = DimOpsError;

    fn try_from(tag: i32) -> Result<Self> {
        match tag {
            Self::SUM => Ok(CumulativeOp::Sum),
            Self::PRODUCT => Ok(CumulativeOp::Product),
            _ => Err(DimOpsError::UnknownOperation {
                kind: "cumulative",
                tag,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_round_trip() {
        for op in [CumulativeOp::Sum, CumulativeOp::Product] {
            assert_eq!(CumulativeOp::try_from(op.tag()).unwrap(), op);
        }
        assert!(CumulativeOp::try_from(2).is_err());
    }

    #[test]
    fn test_running_sum_rows() {
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        CumulativeOp::Sum.accumulate_lines(&mut data, &[0, 3], 3, 1);
        assert_eq!(data, vec![1.0, 3.0, 6.0, 4.0, 9.0, 15.0]);
    }

    #[test]
    fn test_running_product_columns() {
        // Row-major 2x3; lines run down each column.
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        CumulativeOp::Product.accumulate_lines(&mut data, &[0, 1, 2], 2, 3);
        assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0, 10.0, 18.0]);
    }

    #[test]
    fn test_running_sum_reversed() {
        let mut data = vec![1.0f32, 2.0, 3.0];
        CumulativeOp::Sum.accumulate_lines(&mut data, &[2], 3, -1);
        assert_eq!(data, vec![6.0, 5.0, 3.0]);
    }
}

//! Selection engine: per-line index queries and stable sort permutations.
//!
//! Targeted selections write, for every line, the local indices of matching
//! elements consecutively from the line's first slot, followed by
//! [`NO_INDEX`](crate::NO_INDEX) up to the line length. The destination index
//! buffer shares the source layout, so slot `k` of the line at `base` lives at
//! `base + k * stride`.
//!
//! Flattened selections (no dimension) write a 0/1 flag per element instead,
//! except for sorting, which treats the whole view as a single line.

use crate::mapping::line_offsets;
use crate::scalar::{ascending, nan_max, nan_min, Real};
use crate::{DimOpsError, Result, NO_INDEX};

/// Index queries over a line or over a whole view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexOp {
    /// Positions of the maximum.
    Max,
    /// Positions of the minimum.
    Min,
    /// Positions equal to zero.
    Zero,
    /// Positions greater than zero.
    Positive,
    /// Positions less than zero.
    Negative,
    /// Stable ascending sort permutation; sorts the source in place.
    Sort,
}

impl IndexOp {
    pub const MAX: i32 = 0;
    pub const MIN: i32 = 1;
    pub const ZERO: i32 = 2;
    pub const POSITIVE: i32 = 3;
    pub const NEGATIVE: i32 = 4;
    pub const SORT: i32 = 5;

    /// Integer tag of this operator.
    pub fn tag(self) -> i32 {
        match self {
            IndexOp::Max => Self::MAX,
            IndexOp::Min => Self::MIN,
            IndexOp::Zero => Self::ZERO,
            IndexOp::Positive => Self::POSITIVE,
            IndexOp::Negative => Self::NEGATIVE,
            IndexOp::Sort => Self::SORT,
        }
    }

    /// Run the query on every line starting at `bases`.
    pub(crate) fn select_lines<T: Real>(
        self,
        src: &mut [T],
        bases: &[usize],
        dst: &mut [isize],
        size: usize,
        stride: isize,
    ) {
        let mut values: Vec<T> = Vec::with_capacity(size);
        let mut selected: Vec<isize> = Vec::with_capacity(size);

        for &base in bases {
            values.clear();
            values.extend(line_offsets(base, size, stride).map(|offset| src[offset]));

            if self == IndexOp::Sort {
                let perm = sort_permutation(&values);
                for (offset, &k) in line_offsets(base, size, stride).zip(perm.iter()) {
                    dst[offset] = k as isize;
                    src[offset] = values[k];
                }
                continue;
            }

            selected.clear();
            if let Some(target) = self.target(&values) {
                selected.extend(
                    values
                        .iter()
                        .enumerate()
                        .filter(|&(_, &x)| self.matches(x, target))
                        .map(|(k, _)| k as isize),
                );
            }

            let padded = selected
                .iter()
                .copied()
                .chain(std::iter::repeat(NO_INDEX));
            for (offset, index) in line_offsets(base, size, stride).zip(padded) {
                dst[offset] = index;
            }
        }
    }

    /// Run the query over every position in `offsets`, treated as one
    /// flattened sequence.
    pub(crate) fn select_flat<T: Real>(
        self,
        src: &mut [T],
        offsets: &[usize],
        dst: &mut [isize],
    ) {
        let values: Vec<T> = offsets.iter().map(|&offset| src[offset]).collect();

        if self == IndexOp::Sort {
            let perm = sort_permutation(&values);
            for (&offset, &k) in offsets.iter().zip(perm.iter()) {
                dst[offset] = k as isize;
                src[offset] = values[k];
            }
            return;
        }

        let target = self.target(&values);
        for (&offset, &x) in offsets.iter().zip(values.iter()) {
            let hit = target.map_or(false, |target| self.matches(x, target));
            dst[offset] = isize::from(hit);
        }
    }

    /// Value the query compares elements against, or `None` when nothing
    /// can match (sorting, or an extremum of an empty or NaN-containing
    /// sequence).
    fn target<T: Real>(self, values: &[T]) -> Option<T> {
        match self {
            IndexOp::Max => extremum(values, nan_max),
            IndexOp::Min => extremum(values, nan_min),
            IndexOp::Zero | IndexOp::Positive | IndexOp::Negative => Some(T::zero()),
            IndexOp::Sort => None,
        }
    }

    #[inline]
    fn matches<T: Real>(self, x: T, target: T) -> bool {
        match self {
            IndexOp::Max | IndexOp::Min | IndexOp::Zero => x == target,
            IndexOp::Positive => x > target,
            IndexOp::Negative => x < target,
            IndexOp::Sort => false,
        }
    }
}

impl TryFrom<i32> for IndexOp {
    type Error = DimOpsError;

    fn try_from(tag: i32) -> Result<Self> {
        match tag {
            Self::MAX => Ok(IndexOp::Max),
            Self::MIN => Ok(IndexOp::Min),
            Self::ZERO => Ok(IndexOp::Zero),
            Self::POSITIVE => Ok(IndexOp::Positive),
            Self::NEGATIVE => Ok(IndexOp::Negative),
            Self::SORT => Ok(IndexOp::Sort),
            _ => Err(DimOpsError::UnknownOperation { kind: "index", tag }),
        }
    }
}

fn extremum<T: Real>(values: &[T], pick: fn(T, T) -> T) -> Option<T> {
    let (&first, rest) = values.split_first()?;
    let m = rest.iter().fold(first, |acc, &x| pick(acc, x));
    if m.is_nan() {
        None
    } else {
        Some(m)
    }
}

/// Stable ascending argsort of `values`.
fn sort_permutation<T: Real>(values: &[T]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| ascending(&values[a], &values[b]));
    perm
}

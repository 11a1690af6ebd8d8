//! Element type bounds for dimension kernels.

use num_traits::Float;
use std::cmp::Ordering;
use std::fmt::Debug;

/// Real element types the kernels operate on.
///
/// Blanket-implemented for every `Float` that can cross thread boundaries, so
/// `f32` and `f64` both qualify.
pub trait Real: Float + Send + Sync + Debug {}

impl<T> Real for T where T: Float + Send + Sync + Debug {}

/// Maximum that propagates NaN from either side.
///
/// `0.0` is considered greater than `-0.0`.
#[inline]
pub(crate) fn nan_max<T: Real>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else if a > b {
        a
    } else if b > a || a.is_sign_negative() {
        b
    } else {
        a
    }
}

/// Minimum that propagates NaN from either side.
///
/// `-0.0` is considered less than `0.0`.
#[inline]
pub(crate) fn nan_min<T: Real>(a: T, b: T) -> T {
    if a.is_nan() || b.is_nan() {
        T::nan()
    } else if a < b {
        a
    } else if b < a || a.is_sign_positive() {
        b
    } else {
        a
    }
}

/// Ascending order with every NaN placed after all numbers.
///
/// `-0.0` and `0.0` compare equal, so a stable sort keeps their relative order.
#[inline]
pub(crate) fn ascending<T: Real>(a: &T, b: &T) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

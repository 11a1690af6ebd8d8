//! Dimension-wise kernels for strided real-valued buffers.
//!
//! Given a flat buffer and a [`Shape`] (dimension sizes plus per-dimension
//! strides and a starting offset), this crate collapses, queries and
//! accumulates along chosen dimensions without assuming the buffer is
//! contiguous or laid out in any particular dimension order.
//!
//! # Primary API
//!
//! ## Reductions
//!
//! - [`reduce_into`]: collapse one or more dimensions with a [`ReduceOp`]
//!   (sum, product, max, min, population variance)
//! - [`reduce_all`]: collapse every dimension to a single scalar
//!
//! ## Index selection
//!
//! - [`select_into`]: per-line positions of extrema, zeros, positives or
//!   negatives, or a stable ascending sort permutation ([`IndexOp`])
//!
//! ## Cumulative accumulation
//!
//! - [`accumulate_into`]: running sums or products along dimensions
//!   ([`CumulativeOp`])
//!
//! ## Address mapping
//!
//! - [`assign_mapping_indices`], [`assign_base_indices`], [`assign`]: the
//!   logical-to-physical offset translation every kernel is built on
//!
//! # Example
//!
//! ```rust
//! use strided_dimops::{reduce_into, ReduceOp, Shape};
//!
//! let src: Vec<f64> = (0..12).map(|x| x as f64).collect();
//! let src_shape = Shape::row_major(&[2, 6]);
//!
//! let mut dst = vec![0.0; 2];
//! let dst_shape = Shape::row_major(&[2, 1]);
//!
//! reduce_into(ReduceOp::Sum, &src, &src_shape, &mut dst, &dst_shape, &[1]).unwrap();
//! assert_eq!(dst, vec![15.0, 51.0]);
//! ```
//!
//! # Determinism
//!
//! Dimensions are processed in ascending order and lines in ascending logical
//! order of their base coordinates. Within a line, elements are visited from
//! local index 0 upward. With the `parallel` feature, independent lines may be
//! computed on different threads, but each line is still folded in the same
//! order, so results are bit-identical to the sequential path.
//!
//! # Layouts
//!
//! Reductions accept any layout that fits its buffer, including broadcast
//! (zero-stride) views. Selection and accumulation write back through the
//! source layout and reject layouts where two coordinates share an offset.

mod accumulate;
mod mapping;
mod ops;
mod reduce;
mod scalar;
mod select;
mod shape;
#[cfg(feature = "parallel")]
mod threading;

// ============================================================================
// Operation descriptors
// ============================================================================
pub use accumulate::CumulativeOp;
pub use reduce::ReduceOp;
pub use select::IndexOp;

// ============================================================================
// Entry points
// ============================================================================
pub use ops::{accumulate_into, reduce_all, reduce_into, select_into};

// ============================================================================
// Shapes and address mapping
// ============================================================================
pub use mapping::{assign, assign_base_indices, assign_mapping_indices};
pub use scalar::Real;
pub use shape::Shape;

// ============================================================================
// Constants
// ============================================================================

/// Sentinel written into unused slots of a selection line.
pub const NO_INDEX: isize = -1;

/// Minimum number of elements touched by one pass before lines are
/// distributed across rayon workers.
///
/// Matches the `1 << 15` threshold used by the strided kernels.
pub const MIN_PARALLEL_LENGTH: usize = 1 << 15;

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during dimension operations.
///
/// All variants are deterministic functions of the arguments; none of them is
/// worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimOpsError {
    /// Source and destination ranks do not match.
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Source and destination shapes disagree on a non-operating dimension.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Invalid dimension index for the given rank.
    #[error("invalid axis {axis} for rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    /// Stride array length doesn't match dimensions.
    #[error("stride and dims length mismatch")]
    StrideLengthMismatch,

    /// Two lengths that must agree do not.
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// The shape addresses offsets outside the buffer.
    #[error("shape {dims:?} with strides {strides:?} at offset {offset} exceeds buffer of length {len}")]
    OutOfBounds {
        dims: Vec<usize>,
        strides: Vec<isize>,
        offset: usize,
        len: usize,
    },

    /// A physical index points past the end of its buffer.
    #[error("index {index} out of range for buffer of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Two coordinates of a layout that must be written through share an offset.
    #[error("overlapping layout: dims {dims:?} with strides {strides:?}")]
    OverlappingLayout { dims: Vec<usize>, strides: Vec<isize> },

    /// Integer overflow or a negative result while computing an offset.
    #[error("offset overflow while computing physical index")]
    OffsetOverflow,

    /// The same operating dimension was requested twice.
    #[error("duplicate operating dimension {0}")]
    DuplicateDim(usize),

    /// The destination keeps an operating dimension that should collapse.
    #[error("operating dimension {dim} must have singleton or zero length, got {len}")]
    NonSingletonDim { dim: usize, len: usize },

    /// Source length is not the destination length times the collapsed sizes.
    #[error("size mismatch: source has {src} elements, destination and collapsed dims account for {expected}")]
    SizeMismatch { src: usize, expected: usize },

    /// An integer operation tag has no matching operator.
    #[error("unknown {kind} operation tag {tag}")]
    UnknownOperation { kind: &'static str, tag: i32 },
}

/// Result type for dimension operations.
pub type Result<T> = std::result::Result<T, DimOpsError>;
